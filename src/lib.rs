//! # wealthai-crm
//!
//! Relational data model and REST API for a wealth-management CRM.
//!
//! Advisors (managers) look after clients, optionally grouped into
//! households. Clients carry financial goals, portfolios of positions,
//! logged interactions with sentiment readings, and AI-proposed action
//! items. An append-only audit log records who touched what.
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── Store + repositories (persistence/)
//!     ├── Entity types and validation (domain/)
//!     │
//!     └── SQLite
//! ```
//!
//! The storage handle is an explicit value:
//!
//! ```no_run
//! # async fn demo() -> Result<(), wealthai_crm::error::CrmError> {
//! use wealthai_crm::domain::NewHousehold;
//! use wealthai_crm::persistence::Store;
//!
//! let store = Store::in_memory().await?;
//! store.init_schema().await?;
//! let household = store.households().create(NewHousehold::new("Smith Family")).await?;
//! assert_eq!(household.name, "Smith Family");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod persistence;
