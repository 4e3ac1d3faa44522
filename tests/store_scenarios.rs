//! End-to-end scenarios against the storage layer on an in-memory database.

#![allow(clippy::panic)]

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use wealthai_crm::credentials::hash_password;
use wealthai_crm::domain::{
    ActionItemFilter, ActionStatus, AuditLogFilter, ClientFilter, GoalFilter, InteractionType, NewActionItem,
    NewClient, NewGoal, NewHousehold, NewInteraction, NewManager, NewPortfolio, NewPosition,
    NewSentimentLog, PositionFilter, PositionType,
};
use wealthai_crm::error::CrmError;
use wealthai_crm::persistence::{DeletePolicy, Store};

async fn store() -> Store {
    let Ok(store) = Store::in_memory().await else {
        panic!("in-memory store should open");
    };
    store
}

async fn client_with_portfolio(store: &Store) -> (i64, i64) {
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let Ok(portfolio) = store
        .portfolios()
        .create(NewPortfolio::new(client.id, "ACC-0001"))
        .await
    else {
        panic!("portfolio should be created");
    };
    (client.id, portfolio.id)
}

#[tokio::test]
async fn smith_family_goal_is_listed_for_its_client() {
    let store = store().await;

    let Ok(household) = store
        .households()
        .create(NewHousehold::new("Smith Family"))
        .await
    else {
        panic!("household should be created");
    };
    let Ok(client) = store
        .clients()
        .create(NewClient::new("Jane", "Smith").in_household(household.id))
        .await
    else {
        panic!("client should be created");
    };
    let Ok(_) = store
        .goals()
        .create(NewGoal::new(client.id, Decimal::new(500_000_00, 2)).with_priority(3))
        .await
    else {
        panic!("goal should be created");
    };

    let Ok(goals) = store
        .goals()
        .list_all(&GoalFilter::for_client(client.id))
        .await
    else {
        panic!("goals should list");
    };
    let [goal] = goals.as_slice() else {
        panic!("expected exactly one goal, got {goals:?}");
    };
    assert_eq!(goal.target_amount.to_string(), "500000.00");
    assert_eq!(goal.priority, 3);
    assert_eq!(client.household_id, Some(household.id));
}

#[tokio::test]
async fn get_returns_what_create_stored() {
    let store = store().await;
    let Ok(created) = store
        .clients()
        .create(NewClient::new("Jane", "Smith"))
        .await
    else {
        panic!("client should be created");
    };
    let Ok(fetched) = store.clients().get(created.id).await else {
        panic!("client should be found");
    };
    assert_eq!(created, fetched);
    assert!(fetched.is_active);
}

#[tokio::test]
async fn household_and_manager_round_trip() {
    let store = store().await;
    let Ok(household) = store.households().create(NewHousehold::new("Lee Family")).await else {
        panic!("household should be created");
    };
    let Ok(fetched) = store.households().get(household.id).await else {
        panic!("household should be found");
    };
    assert_eq!(household, fetched);

    let Ok(hash) = hash_password("correct horse") else {
        panic!("password should hash");
    };
    let mut new = NewManager::new("advisor@example.com", hash);
    new.role = Some("Senior Advisor".to_string());
    let Ok(manager) = store.managers().create(new).await else {
        panic!("manager should be created");
    };
    let Ok(fetched) = store.managers().get(manager.id).await else {
        panic!("manager should be found");
    };
    assert_eq!(manager, fetched);
}

#[tokio::test]
async fn goal_round_trips_with_date_and_amount() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let mut new = NewGoal::new(client.id, Decimal::new(5, 1)).with_priority(10);
    new.target_date = Utc.with_ymd_and_hms(2040, 6, 30, 0, 0, 0).single();
    new.description = Some("College fund".to_string());
    let Ok(goal) = store.goals().create(new).await else {
        panic!("goal should be created");
    };
    let Ok(fetched) = store.goals().get(goal.id).await else {
        panic!("goal should be found");
    };
    assert_eq!(goal, fetched);
    assert_eq!(fetched.target_amount.to_string(), "0.50");
}

#[tokio::test]
async fn portfolio_and_position_round_trip_exact_decimals() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let mut new = NewPortfolio::new(client.id, "ACC-7788");
    new.total_value = Decimal::new(123_456_789, 2);
    let Ok(portfolio) = store.portfolios().create(new).await else {
        panic!("portfolio should be created");
    };
    let Ok(fetched) = store.portfolios().get(portfolio.id).await else {
        panic!("portfolio should be found");
    };
    assert_eq!(portfolio, fetched);
    assert_eq!(fetched.total_value.to_string(), "1234567.89");

    let Ok(position) = store
        .positions()
        .create(NewPosition {
            portfolio_id: portfolio.id,
            ticker: "vti".to_string(),
            quantity: Decimal::new(1234, 4),
            cost_basis: Decimal::new(105, 1),
            position_type: PositionType::FixedIncome,
        })
        .await
    else {
        panic!("position should be created");
    };
    let Ok(fetched) = store.positions().get(position.id).await else {
        panic!("position should be found");
    };
    assert_eq!(position, fetched);
    assert_eq!(fetched.quantity, Decimal::new(1234, 4));
    assert_eq!(fetched.quantity.to_string(), "0.1234");
    assert_eq!(fetched.cost_basis.to_string(), "10.50");
    assert_eq!(fetched.position_type, PositionType::FixedIncome);
}

#[tokio::test]
async fn interaction_and_sentiment_round_trip() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let mut new = NewInteraction::new(client.id, InteractionType::VoiceNote)
        .with_content("Worried about rate cuts");
    new.vector_id = Some("vec-42".to_string());
    let Ok(interaction) = store.interactions().create(new).await else {
        panic!("interaction should be created");
    };
    let Ok(fetched) = store.interactions().get(interaction.id).await else {
        panic!("interaction should be found");
    };
    assert_eq!(interaction, fetched);
    assert_eq!(fetched.interaction_type, InteractionType::VoiceNote);

    let mut new = NewSentimentLog::new(interaction.id, -0.375);
    new.summary = Some("Anxious".to_string());
    let Ok(log) = store.sentiment_logs().create(new).await else {
        panic!("sentiment log should be created");
    };
    let Ok(fetched) = store.sentiment_logs().get(log.id).await else {
        panic!("sentiment log should be found");
    };
    assert_eq!(log, fetched);
    assert!((fetched.sentiment_score - (-0.375)).abs() < f64::EPSILON);
}

#[tokio::test]
async fn action_item_round_trips() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let mut new = NewActionItem::new(client.id, "Rebalance toward bonds");
    new.status = ActionStatus::Completed;
    let Ok(item) = store.action_items().create(new).await else {
        panic!("action item should be created");
    };
    let Ok(fetched) = store.action_items().get(item.id).await else {
        panic!("action item should be found");
    };
    assert_eq!(item, fetched);
    assert_eq!(fetched.status, ActionStatus::Completed);
}

#[tokio::test]
async fn init_schema_twice_keeps_data() {
    let store = store().await;
    let Ok(household) = store.households().create(NewHousehold::new("Lee")).await else {
        panic!("household should be created");
    };

    assert!(store.init_schema().await.is_ok());
    assert!(store.init_schema().await.is_ok());

    let Ok(fetched) = store.households().get(household.id).await else {
        panic!("household should survive re-initialization");
    };
    assert_eq!(fetched.name, "Lee");
}

#[tokio::test]
async fn goal_priority_bounds() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let amount = Decimal::new(1_000, 0);

    for priority in [0, 11] {
        let result = store
            .goals()
            .create(NewGoal::new(client.id, amount).with_priority(priority))
            .await;
        assert!(
            matches!(result, Err(CrmError::Validation { field: "priority", .. })),
            "priority {priority} should be rejected"
        );
    }
    for priority in [1, 10] {
        let result = store
            .goals()
            .create(NewGoal::new(client.id, amount).with_priority(priority))
            .await;
        assert!(result.is_ok(), "priority {priority} should be accepted");
    }
}

#[tokio::test]
async fn sentiment_score_bounds() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let Ok(interaction) = store
        .interactions()
        .create(NewInteraction::new(client.id, InteractionType::Call))
        .await
    else {
        panic!("interaction should be created");
    };

    for score in [1.5, -2.0] {
        let result = store
            .sentiment_logs()
            .create(NewSentimentLog::new(interaction.id, score))
            .await;
        assert!(
            matches!(result, Err(CrmError::Validation { .. })),
            "score {score} should be rejected"
        );
    }
    for score in [0.0, -1.0, 1.0] {
        let result = store
            .sentiment_logs()
            .create(NewSentimentLog::new(interaction.id, score))
            .await;
        assert!(result.is_ok(), "score {score} should be accepted");
    }
}

#[test]
fn unknown_position_type_is_a_validation_error() {
    let result = "bond".parse::<PositionType>();
    assert!(matches!(
        result,
        Err(CrmError::Validation {
            field: "position_type",
            ..
        })
    ));
}

#[tokio::test]
async fn duplicate_account_number_is_rejected() {
    let store = store().await;
    let (client_id, _) = client_with_portfolio(&store).await;

    let result = store
        .portfolios()
        .create(NewPortfolio::new(client_id, "ACC-0001"))
        .await;
    assert!(matches!(
        result,
        Err(CrmError::Duplicate {
            field: "account_number",
            ..
        })
    ));
}

#[tokio::test]
async fn client_with_portfolio_needs_cascade() {
    let store = store().await;
    let (client_id, portfolio_id) = client_with_portfolio(&store).await;
    let Ok(_) = store
        .positions()
        .create(NewPosition {
            portfolio_id,
            ticker: "aapl".to_string(),
            quantity: Decimal::new(10, 0),
            cost_basis: Decimal::new(1_500_00, 2),
            position_type: PositionType::Equity,
        })
        .await
    else {
        panic!("position should be created");
    };

    let blocked = store.clients().delete(client_id, DeletePolicy::Restrict).await;
    assert!(matches!(
        blocked,
        Err(CrmError::Conflict {
            dependent: "portfolios",
            ..
        })
    ));
    assert!(store.clients().get(client_id).await.is_ok());

    assert!(
        store
            .clients()
            .delete(client_id, DeletePolicy::Cascade)
            .await
            .is_ok()
    );
    assert!(matches!(
        store.portfolios().get(portfolio_id).await,
        Err(CrmError::NotFound { .. })
    ));
    let Ok(positions) = store
        .positions()
        .list_all(&PositionFilter::default())
        .await
    else {
        panic!("positions should list");
    };
    assert!(positions.is_empty());
}

#[tokio::test]
async fn household_cascade_removes_member_subtree() {
    let store = store().await;
    let Ok(household) = store.households().create(NewHousehold::new("Ng")).await else {
        panic!("household should be created");
    };
    let Ok(client) = store
        .clients()
        .create(NewClient::new("Ada", "Ng").in_household(household.id))
        .await
    else {
        panic!("client should be created");
    };
    let Ok(_) = store
        .action_items()
        .create(NewActionItem::new(client.id, "rebalance"))
        .await
    else {
        panic!("action item should be created");
    };

    assert!(matches!(
        store
            .households()
            .delete(household.id, DeletePolicy::Restrict)
            .await,
        Err(CrmError::Conflict {
            dependent: "clients",
            ..
        })
    ));
    assert!(
        store
            .households()
            .delete(household.id, DeletePolicy::Cascade)
            .await
            .is_ok()
    );

    let Ok(clients) = store.clients().list_all(&ClientFilter::default()).await else {
        panic!("clients should list");
    };
    assert!(clients.is_empty());
    let Ok(items) = store
        .action_items()
        .list_all(&ActionItemFilter::default())
        .await
    else {
        panic!("action items should list");
    };
    assert!(items.is_empty());
}

#[tokio::test]
async fn audited_client_cannot_be_deleted_even_with_cascade() {
    let store = store().await;
    let Ok(client) = store.clients().create(NewClient::new("Jane", "Smith")).await else {
        panic!("client should be created");
    };
    let Ok(_) = store
        .reports()
        .view_client_profile(client.id, None)
        .await
    else {
        panic!("profile should load");
    };

    assert!(matches!(
        store.clients().delete(client.id, DeletePolicy::Cascade).await,
        Err(CrmError::Conflict {
            dependent: "audit_logs",
            ..
        })
    ));
    let Ok(client) = store.clients().deactivate(client.id).await else {
        panic!("deactivate should succeed");
    };
    assert!(!client.is_active);
}

#[tokio::test]
async fn audit_entries_cannot_be_deleted() {
    let store = store().await;
    let Ok(hash) = hash_password("s3cret") else {
        panic!("hash should succeed");
    };
    let Ok(manager) = store
        .managers()
        .create(NewManager::new("Advisor@Example.com", hash))
        .await
    else {
        panic!("manager should be created");
    };
    let Ok(client) = store
        .clients()
        .create(NewClient::new("Jane", "Smith").managed_by(manager.id))
        .await
    else {
        panic!("client should be created");
    };
    let Ok(_) = store
        .reports()
        .view_client_profile(client.id, Some(manager.id))
        .await
    else {
        panic!("profile should load");
    };

    let Ok(entries) = store
        .audit_logs()
        .list_all(&AuditLogFilter::default())
        .await
    else {
        panic!("audit entries should list");
    };
    let [entry] = entries.as_slice() else {
        panic!("expected one audit entry, got {entries:?}");
    };
    assert_eq!(entry.action, "view");
    assert_eq!(entry.manager_id, Some(manager.id));
    assert_eq!(manager.email, "advisor@example.com");

    assert!(matches!(
        store.audit_logs().delete(entry.id).await,
        Err(CrmError::OperationNotAllowed(_))
    ));
    assert!(matches!(
        store.audit_logs().update(entry.id).await,
        Err(CrmError::OperationNotAllowed(_))
    ));
    assert!(store.audit_logs().get(entry.id).await.is_ok());
}
