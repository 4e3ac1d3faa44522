//! Table definitions.
//!
//! Fixed-point columns are TEXT holding the canonical decimal string at
//! the column's scale; SQLite has no exact numeric type. CHECK constraints
//! repeat the closed enumerations and ranges enforced by the domain layer.

use sqlx::SqlitePool;

use crate::error::CrmError;

/// Every table created by [`apply`], parents before children.
pub const TABLES: [&str; 10] = [
    "managers",
    "households",
    "clients",
    "goals",
    "portfolios",
    "positions",
    "interactions",
    "sentiment_logs",
    "audit_logs",
    "action_items",
];

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS managers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'Junior Advisor',
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS households (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER REFERENCES households(id),
        manager_id INTEGER REFERENCES managers(id),
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        risk_score INTEGER,
        investment_goal TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS goals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL REFERENCES clients(id),
        target_amount TEXT NOT NULL,
        target_date TEXT,
        description TEXT,
        priority INTEGER NOT NULL DEFAULT 5 CHECK (priority BETWEEN 1 AND 10),
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS portfolios (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL REFERENCES clients(id),
        account_number TEXT NOT NULL UNIQUE,
        total_value TEXT NOT NULL DEFAULT '0.00',
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS positions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL REFERENCES portfolios(id),
        ticker TEXT NOT NULL CHECK (length(ticker) BETWEEN 1 AND 10),
        quantity TEXT NOT NULL,
        cost_basis TEXT NOT NULL,
        position_type TEXT NOT NULL
            CHECK (position_type IN ('equity', 'fixed_income', 'cash')),
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS interactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL REFERENCES clients(id),
        type TEXT NOT NULL CHECK (type IN ('email', 'call', 'voice_note')),
        raw_content TEXT,
        vector_id TEXT,
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS sentiment_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        interaction_id INTEGER NOT NULL REFERENCES interactions(id),
        sentiment_score REAL NOT NULL CHECK (sentiment_score BETWEEN -1.0 AND 1.0),
        summary TEXT,
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        manager_id INTEGER REFERENCES managers(id),
        client_id INTEGER REFERENCES clients(id),
        action TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS action_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL REFERENCES clients(id),
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
        ai_rationale TEXT,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_clients_household ON clients(household_id)",
    "CREATE INDEX IF NOT EXISTS idx_clients_manager ON clients(manager_id)",
    "CREATE INDEX IF NOT EXISTS idx_goals_client ON goals(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_portfolios_client ON portfolios(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_positions_portfolio ON positions(portfolio_id)",
    "CREATE INDEX IF NOT EXISTS idx_positions_ticker ON positions(ticker)",
    "CREATE INDEX IF NOT EXISTS idx_interactions_client ON interactions(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_interactions_vector ON interactions(vector_id)",
    "CREATE INDEX IF NOT EXISTS idx_sentiment_interaction ON sentiment_logs(interaction_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_manager ON audit_logs(manager_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_client ON audit_logs(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_logs(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_action_items_client ON action_items(client_id)",
    // Storage-level guard behind the access layer's append-only rule.
    r"
    CREATE TRIGGER IF NOT EXISTS audit_logs_no_update
    BEFORE UPDATE ON audit_logs
    BEGIN
        SELECT RAISE(ABORT, 'audit_logs is append-only');
    END
    ",
    r"
    CREATE TRIGGER IF NOT EXISTS audit_logs_no_delete
    BEFORE DELETE ON audit_logs
    BEGIN
        SELECT RAISE(ABORT, 'audit_logs is append-only');
    END
    ",
];

/// Runs every DDL statement in one transaction.
pub(crate) async fn apply(pool: &SqlitePool) -> Result<(), CrmError> {
    let mut tx = super::begin_write(pool).await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(tables = TABLES.len(), "schema ready");
    Ok(())
}
