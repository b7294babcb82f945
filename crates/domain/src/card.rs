//! Card: the record every automation action targets.
//!
//! Cards are owned by the board subsystem; the automation engine only reads
//! them and mutates them through the card port.

use serde::{Deserialize, Serialize};

use crate::error::{KanbanError, ValidationError};
use crate::id::{BoardId, CardId, LabelId, ListId, UserId};
use crate::time::{Timestamp, now};

/// A card sitting in one list of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub board_id: BoardId,
    pub list_id: ListId,
    pub title: String,
    /// Ordering within the list, ascending.
    pub position: i64,
    pub is_done: bool,
    pub archived: bool,
    pub due_date: Option<Timestamp>,
    pub label_ids: Vec<LabelId>,
    pub member_ids: Vec<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Card {
    /// Create a builder for constructing a [`Card`].
    #[must_use]
    pub fn builder() -> CardBuilder {
        CardBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] when:
    /// - `board_id` is empty ([`ValidationError::EmptyBoardId`])
    /// - `title` is blank ([`ValidationError::EmptyTitle`])
    pub fn validate(&self) -> Result<(), KanbanError> {
        if self.board_id.is_empty() {
            return Err(ValidationError::EmptyBoardId.into());
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn has_label(&self, label_id: &LabelId) -> bool {
        self.label_ids.contains(label_id)
    }

    #[must_use]
    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.member_ids.contains(user_id)
    }
}

/// Step-by-step builder for [`Card`].
#[derive(Debug, Default)]
pub struct CardBuilder {
    id: Option<CardId>,
    board_id: Option<BoardId>,
    list_id: Option<ListId>,
    title: Option<String>,
    position: i64,
    is_done: bool,
    archived: bool,
    due_date: Option<Timestamp>,
    label_ids: Vec<LabelId>,
    member_ids: Vec<UserId>,
}

impl CardBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<CardId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn board_id(mut self, board_id: impl Into<BoardId>) -> Self {
        self.board_id = Some(board_id.into());
        self
    }

    #[must_use]
    pub fn list_id(mut self, list_id: impl Into<ListId>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn done(mut self, is_done: bool) -> Self {
        self.is_done = is_done;
        self
    }

    #[must_use]
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: Timestamp) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn label(mut self, label_id: impl Into<LabelId>) -> Self {
        self.label_ids.push(label_id.into());
        self
    }

    #[must_use]
    pub fn member(mut self, user_id: impl Into<UserId>) -> Self {
        self.member_ids.push(user_id.into());
        self
    }

    /// Consume the builder, validate, and return a [`Card`].
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] if the board id or title is missing.
    pub fn build(self) -> Result<Card, KanbanError> {
        let ts = now();
        let card = Card {
            id: self.id.unwrap_or_default(),
            board_id: self.board_id.unwrap_or_else(|| BoardId::from(String::new())),
            list_id: self.list_id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            position: self.position,
            is_done: self.is_done,
            archived: self.archived,
            due_date: self.due_date,
            label_ids: self.label_ids,
            member_ids: self.member_ids,
            created_at: ts,
            updated_at: ts,
        };
        card.validate()?;
        Ok(card)
    }
}
