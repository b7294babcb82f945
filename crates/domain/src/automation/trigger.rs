//! Trigger: the board event pattern that activates a rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{BoardId, CardId, ListId};

/// The kind of board event a rule listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    CardCreated,
    CardMovedToList,
}

impl TriggerType {
    /// Return the stored representation, e.g. `"CARD_MOVED_TO_LIST"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CardCreated => "CARD_CREATED",
            Self::CardMovedToList => "CARD_MOVED_TO_LIST",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CARD_CREATED" => Ok(Self::CardCreated),
            "CARD_MOVED_TO_LIST" => Ok(Self::CardMovedToList),
            other => Err(ValidationError::UnknownTriggerType(other.to_string())),
        }
    }
}

/// Describes which board events activate a rule.
///
/// The optional `list_id` is the rule's trigger value: the list a card was
/// created in, or the list a card was moved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// Fires when a card is created. Without a list, any list matches.
    CardCreated {
        #[serde(default)]
        list_id: Option<ListId>,
    },
    /// Fires when a card is moved into exactly `list_id`.
    CardMovedToList {
        #[serde(default)]
        list_id: Option<ListId>,
    },
}

impl Trigger {
    /// Rebuild a trigger from its stored `(trigger_type, trigger_val)` pair.
    #[must_use]
    pub fn from_parts(trigger_type: TriggerType, value: Option<String>) -> Self {
        let list_id = value.map(ListId::from);
        match trigger_type {
            TriggerType::CardCreated => Self::CardCreated { list_id },
            TriggerType::CardMovedToList => Self::CardMovedToList { list_id },
        }
    }

    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::CardCreated { .. } => TriggerType::CardCreated,
            Self::CardMovedToList { .. } => TriggerType::CardMovedToList,
        }
    }

    /// The stored trigger value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&ListId> {
        match self {
            Self::CardCreated { list_id } | Self::CardMovedToList { list_id } => list_id.as_ref(),
        }
    }

    /// Check whether this trigger matches a board event.
    ///
    /// The event must be of the same trigger type. `CardMovedToList` then
    /// requires exact equality between the stored list and the destination
    /// list; an unset value never matches. `CardCreated` with an unset or
    /// empty value matches any originating list.
    #[must_use]
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        if self.trigger_type() != event.trigger_type {
            return false;
        }
        match self {
            Self::CardCreated { list_id } => match list_id {
                Some(expected) if !expected.is_empty() => *expected == event.list_id,
                _ => true,
            },
            Self::CardMovedToList { list_id } => list_id.as_ref() == Some(&event.list_id),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(list_id) => write!(f, "{}({list_id})", self.trigger_type()),
            None => write!(f, "{}(*)", self.trigger_type()),
        }
    }
}

/// A board event fired by a card mutation.
///
/// `list_id` is the trigger context value: the list the card was created in
/// or moved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub board_id: BoardId,
    pub trigger_type: TriggerType,
    pub list_id: ListId,
    pub card_id: CardId,
}

impl TriggerEvent {
    #[must_use]
    pub fn new(
        board_id: BoardId,
        trigger_type: TriggerType,
        list_id: ListId,
        card_id: CardId,
    ) -> Self {
        Self {
            board_id,
            trigger_type,
            list_id,
            card_id,
        }
    }

    #[must_use]
    pub fn card_created(board_id: BoardId, list_id: ListId, card_id: CardId) -> Self {
        Self::new(board_id, TriggerType::CardCreated, list_id, card_id)
    }

    #[must_use]
    pub fn card_moved_to_list(board_id: BoardId, list_id: ListId, card_id: CardId) -> Self {
        Self::new(board_id, TriggerType::CardMovedToList, list_id, card_id)
    }
}
