//! Data Transfer Objects for REST request/response serialization.
//!
//! Most resources use the domain types directly. Fixed-point amounts
//! serialize as JSON strings so no precision is lost.

pub mod common_dto;
pub mod manager_dto;

pub use common_dto::*;
pub use manager_dto::*;
