//! Automation: trigger → action rules scoped to a board.
//!
//! Each rule has a [`Trigger`] that decides which board events activate it
//! and an ordered list of [`Action`]s applied to the card named by the
//! event. Every execution is recorded as [`AutomationLog`] entries.

mod action;
mod log;
mod trigger;

pub use action::{Action, ActionType};
pub use log::{AutomationLog, LogOutcome};
pub use trigger::{Trigger, TriggerEvent, TriggerType};

use serde::{Deserialize, Serialize};

use crate::error::{KanbanError, ValidationError};
use crate::id::{AutomationRuleId, BoardId};
use crate::time::{Timestamp, now};

/// A stored rule: one trigger plus the actions to run, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: AutomationRuleId,
    pub board_id: BoardId,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
    pub created_at: Timestamp,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// An empty action list is valid: the rule still matches and is logged.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] when `board_id` is empty
    /// ([`ValidationError::EmptyBoardId`]).
    pub fn validate(&self) -> Result<(), KanbanError> {
        if self.board_id.is_empty() {
            return Err(ValidationError::EmptyBoardId.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<AutomationRuleId>,
    board_id: Option<BoardId>,
    trigger: Option<Trigger>,
    actions: Vec<Action>,
    created_at: Option<Timestamp>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<AutomationRuleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn board_id(mut self, board_id: impl Into<BoardId>) -> Self {
        self.board_id = Some(board_id.into());
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] if the trigger is missing
    /// ([`ValidationError::MissingTrigger`]) or the board id is empty.
    pub fn build(self) -> Result<AutomationRule, KanbanError> {
        let trigger = self.trigger.ok_or(ValidationError::MissingTrigger)?;
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            board_id: self.board_id.unwrap_or_else(|| BoardId::from(String::new())),
            trigger,
            actions: self.actions,
            created_at: self.created_at.unwrap_or_else(now),
        };
        rule.validate()?;
        Ok(rule)
    }
}
