//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod automation_log;
pub mod automation_repo;
pub mod card_repo;
pub mod trigger_publisher;

pub use automation_log::AutomationLogRepository;
pub use automation_repo::AutomationRuleRepository;
pub use card_repo::CardRepository;
pub use trigger_publisher::TriggerPublisher;
