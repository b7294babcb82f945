//! # kanban-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `kanban-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `kanban-app` (for port traits) and `kanban-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod automation_log_repo;
pub mod automation_rule_repo;
pub mod card_repo;
pub mod error;
pub mod pool;

mod codec;

pub use automation_log_repo::SqliteAutomationLogRepository;
pub use automation_rule_repo::SqliteAutomationRuleRepository;
pub use card_repo::SqliteCardRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
