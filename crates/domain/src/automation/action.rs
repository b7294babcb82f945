//! Action: a single mutation applied to the triggering card.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{LabelId, ListId, UserId};

/// The kind of an [`Action`], as stored next to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ArchiveCard,
    MarkAsDone,
    AddLabel,
    RemoveLabel,
    MoveCard,
    AssignMember,
    SetDueDate,
}

impl ActionType {
    /// Return the stored representation, e.g. `"ADD_LABEL"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArchiveCard => "ARCHIVE_CARD",
            Self::MarkAsDone => "MARK_AS_DONE",
            Self::AddLabel => "ADD_LABEL",
            Self::RemoveLabel => "REMOVE_LABEL",
            Self::MoveCard => "MOVE_CARD",
            Self::AssignMember => "ASSIGN_MEMBER",
            Self::SetDueDate => "SET_DUE_DATE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARCHIVE_CARD" => Ok(Self::ArchiveCard),
            "MARK_AS_DONE" => Ok(Self::MarkAsDone),
            "ADD_LABEL" => Ok(Self::AddLabel),
            "REMOVE_LABEL" => Ok(Self::RemoveLabel),
            "MOVE_CARD" => Ok(Self::MoveCard),
            "ASSIGN_MEMBER" => Ok(Self::AssignMember),
            "SET_DUE_DATE" => Ok(Self::SetDueDate),
            other => Err(ValidationError::UnknownActionType(other.to_string())),
        }
    }
}

/// An operation to execute against the triggering card.
///
/// Serialized as `{"type": "ADD_LABEL", "value": "lbl-1"}`, mirroring the
/// stored `(type, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ArchiveCard,
    MarkAsDone,
    AddLabel(LabelId),
    RemoveLabel(LabelId),
    /// Move the card to the end of the given list.
    MoveCard(ListId),
    AssignMember(UserId),
    /// Raw ISO-8601 date, parsed when the action runs.
    SetDueDate(String),
}

impl Action {
    /// Rebuild an action from its stored `(type, value)` pair.
    ///
    /// A missing value for a kind that needs one yields an empty payload;
    /// the executor rejects it when the action runs so that one bad row
    /// never prevents the rest of the rule from loading.
    #[must_use]
    pub fn from_parts(action_type: ActionType, value: Option<String>) -> Self {
        let value = value.unwrap_or_default();
        match action_type {
            ActionType::ArchiveCard => Self::ArchiveCard,
            ActionType::MarkAsDone => Self::MarkAsDone,
            ActionType::AddLabel => Self::AddLabel(LabelId::from(value)),
            ActionType::RemoveLabel => Self::RemoveLabel(LabelId::from(value)),
            ActionType::MoveCard => Self::MoveCard(ListId::from(value)),
            ActionType::AssignMember => Self::AssignMember(UserId::from(value)),
            ActionType::SetDueDate => Self::SetDueDate(value),
        }
    }

    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::ArchiveCard => ActionType::ArchiveCard,
            Self::MarkAsDone => ActionType::MarkAsDone,
            Self::AddLabel(_) => ActionType::AddLabel,
            Self::RemoveLabel(_) => ActionType::RemoveLabel,
            Self::MoveCard(_) => ActionType::MoveCard,
            Self::AssignMember(_) => ActionType::AssignMember,
            Self::SetDueDate(_) => ActionType::SetDueDate,
        }
    }

    /// The stored value, or `None` for kinds without a payload.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::ArchiveCard | Self::MarkAsDone => None,
            Self::AddLabel(id) | Self::RemoveLabel(id) => Some(id.as_str()),
            Self::MoveCard(id) => Some(id.as_str()),
            Self::AssignMember(id) => Some(id.as_str()),
            Self::SetDueDate(raw) => Some(raw.as_str()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}({value})", self.action_type()),
            None => write!(f, "{}", self.action_type()),
        }
    }
}
