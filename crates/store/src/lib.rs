//! Persistence layer for the gradebook service.
//!
//! Provides the [`SchoolStore`] trait with two implementations:
//! - [`InMemorySchoolStore`] for tests and database-less runs
//! - [`PostgresSchoolStore`] backed by a `sqlx` connection pool

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{RecordId, Role};
pub use error::{Result, StoreError};
pub use memory::InMemorySchoolStore;
pub use postgres::{PostgresSchoolStore, connect_with_retry};
pub use query::MarkQuery;
pub use record::{Mark, MarkUpdate, NewMark, NewStudent, NewUser, Student, StudentUpdate, User};
pub use store::{SchoolStore, SchoolStoreExt};
