//! # kanban-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRuleRepository`: store and query automation rules
//!   - `CardRepository`: read cards and apply the mutations actions need
//!   - `AutomationLogRepository`: append & query execution records
//!   - `TriggerPublisher`: hand board events to the automation pipeline
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AutomationEngine`: match triggers against rules, run their actions
//!   - `AutomationDispatcher`: fire-and-forget queue in front of the engine
//!   - `CardService`: card mutations that fire triggers
//!
//! ## Dependency rule
//! Depends on `kanban-domain` only (plus `tokio` for the worker and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod dispatcher;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
