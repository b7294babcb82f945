//! # kanban-domain
//!
//! Pure domain model for kanban board automations.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Cards** (the single record every automation action targets)
//! - Define **Automation rules** (trigger → ordered actions, scoped to a board)
//! - Define **Trigger events** and the flat trigger-type + list-id matcher
//! - Define **Automation logs** (append-only execution records)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod card;
