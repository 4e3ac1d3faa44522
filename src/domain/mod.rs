//! Domain layer: entity types, their inputs, and field invariants.
//!
//! Each entity module defines the stored record, a `New*` insert type with
//! `validate`, a `*Patch` partial update with `apply`, and a `*Filter` for
//! listing. Validation lives here so every caller of the access layer gets
//! the same checks regardless of transport.

pub mod action_item;
pub mod audit_log;
pub mod client;
pub mod fields;
pub mod fixed_point;
pub mod goal;
pub mod household;
pub mod interaction;
pub mod manager;
pub mod portfolio;
pub mod position;
pub mod report;
pub mod sentiment_log;

pub use action_item::{ActionItem, ActionItemFilter, ActionItemPatch, ActionStatus, NewActionItem};
pub use audit_log::{AuditLog, AuditLogFilter, NewAuditLog};
pub use client::{Client, ClientFilter, ClientPatch, NewClient};
pub use fields::SortOrder;
pub use goal::{Goal, GoalFilter, GoalPatch, NewGoal};
pub use household::{Household, HouseholdFilter, HouseholdPatch, NewHousehold};
pub use interaction::{Interaction, InteractionFilter, InteractionPatch, InteractionType, NewInteraction};
pub use manager::{Manager, ManagerFilter, ManagerPatch, NewManager};
pub use portfolio::{NewPortfolio, Portfolio, PortfolioFilter, PortfolioPatch, mask_account_number};
pub use position::{NewPosition, Position, PositionFilter, PositionPatch, PositionType};
pub use report::{ClientProfile, InteractionWithSentiment, PortfolioHoldings};
pub use sentiment_log::{NewSentimentLog, SentimentLog, SentimentLogFilter, SentimentLogPatch};
