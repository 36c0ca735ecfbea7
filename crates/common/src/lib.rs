//! Shared identifiers and role types used across the gradebook crates.

pub mod types;

pub use types::{ParseRoleError, RecordId, Role};
