//! Card repository port: the card-mutation operations automations rely on.

use std::future::Future;

use kanban_domain::card::Card;
use kanban_domain::error::KanbanError;
use kanban_domain::id::{CardId, LabelId, ListId, UserId};
use kanban_domain::time::Timestamp;

/// Reads and mutates [`Card`]s.
///
/// Every mutation is its own atomic write; mutating a card that does not
/// exist returns [`KanbanError::NotFound`]. Label and member association
/// writes are idempotent.
pub trait CardRepository {
    /// Persist a new card.
    fn create(&self, card: Card) -> impl Future<Output = Result<Card, KanbanError>> + Send;

    /// Get a card with its labels and members.
    fn get_by_id(
        &self,
        id: &CardId,
    ) -> impl Future<Output = Result<Option<Card>, KanbanError>> + Send;

    /// Highest card position in a list, or `None` when the list is empty.
    fn max_position(
        &self,
        list_id: &ListId,
    ) -> impl Future<Output = Result<Option<i64>, KanbanError>> + Send;

    /// Change the card's list and position.
    fn move_to_list(
        &self,
        id: &CardId,
        list_id: &ListId,
        position: i64,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn set_done(
        &self,
        id: &CardId,
        done: bool,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn set_archived(
        &self,
        id: &CardId,
        archived: bool,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn add_label(
        &self,
        id: &CardId,
        label_id: &LabelId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn remove_label(
        &self,
        id: &CardId,
        label_id: &LabelId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn assign_member(
        &self,
        id: &CardId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;

    fn set_due_date(
        &self,
        id: &CardId,
        due_date: Option<Timestamp>,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send;
}
