//! Automation log: append-only record of what a rule did.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ActionType;
use crate::error::ValidationError;
use crate::id::{AutomationLogId, AutomationRuleId, BoardId, CardId};
use crate::time::{Timestamp, now};

/// Whether the logged step succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogOutcome {
    Success,
    Failure,
}

impl LogOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for LogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogOutcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            other => Err(ValidationError::UnknownOutcome(other.to_string())),
        }
    }
}

/// One immutable log entry.
///
/// Entries with an `action_type` describe a single action; entries without
/// one summarise a whole rule execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: AutomationLogId,
    pub rule_id: AutomationRuleId,
    pub board_id: BoardId,
    pub card_id: CardId,
    pub action_type: Option<ActionType>,
    pub outcome: LogOutcome,
    pub detail: String,
    pub created_at: Timestamp,
}

impl AutomationLog {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(
        rule_id: AutomationRuleId,
        board_id: BoardId,
        card_id: CardId,
        action_type: Option<ActionType>,
        outcome: LogOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: AutomationLogId::new(),
            rule_id,
            board_id,
            card_id,
            action_type,
            outcome,
            detail: detail.into(),
            created_at: now(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == LogOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_new_entries_with_fresh_id_and_time() {
        let before = now();
        let log = AutomationLog::new(
            AutomationRuleId::from("R1"),
            BoardId::from("B1"),
            CardId::from("C1"),
            Some(ActionType::MarkAsDone),
            LogOutcome::Success,
            "marked as done",
        );
        assert!(log.created_at >= before);
        assert!(log.is_success());
        assert!(!log.id.is_empty());
    }

    #[test]
    fn should_parse_stored_outcomes() {
        assert_eq!("SUCCESS".parse::<LogOutcome>(), Ok(LogOutcome::Success));
        assert_eq!("FAILURE".parse::<LogOutcome>(), Ok(LogOutcome::Failure));
        assert!("MAYBE".parse::<LogOutcome>().is_err());
    }

    #[test]
    fn should_serialize_outcome_in_screaming_case() {
        let json = serde_json::to_string(&LogOutcome::Failure).unwrap();
        assert_eq!(json, "\"FAILURE\"");
    }
}
