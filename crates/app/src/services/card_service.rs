//! Card service: the card mutations that fire automation triggers.

use kanban_domain::automation::TriggerEvent;
use kanban_domain::card::Card;
use kanban_domain::error::{KanbanError, NotFoundError};
use kanban_domain::id::{CardId, ListId};
use kanban_domain::time;

use crate::ports::{CardRepository, TriggerPublisher};

/// Application service for card mutations.
///
/// Triggers are published only after the write succeeded; whatever the
/// automation pipeline does afterwards never changes the returned result.
pub struct CardService<CR, P> {
    repo: CR,
    publisher: P,
}

impl<CR, P> CardService<CR, P>
where
    CR: CardRepository,
    P: TriggerPublisher,
{
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: CR, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Create a card at the end of its list and publish `CARD_CREATED`.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, card), fields(board_id = %card.board_id, list_id = %card.list_id))]
    pub async fn create_card(&self, mut card: Card) -> Result<Card, KanbanError> {
        card.validate()?;
        card.position = self.next_position(&card.list_id).await?;
        let card = self.repo.create(card).await?;

        self.publisher.publish(TriggerEvent::card_created(
            card.board_id.clone(),
            card.list_id.clone(),
            card.id.clone(),
        ));
        Ok(card)
    }

    /// Move a card to the end of `list_id` and publish `CARD_MOVED_TO_LIST`.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] when the card does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn move_card(&self, card_id: &CardId, list_id: &ListId) -> Result<Card, KanbanError> {
        let mut card = self.get_card(card_id).await?;
        let position = self.next_position(list_id).await?;
        self.repo.move_to_list(card_id, list_id, position).await?;

        card.list_id = list_id.clone();
        card.position = position;
        card.updated_at = time::now();

        self.publisher.publish(TriggerEvent::card_moved_to_list(
            card.board_id.clone(),
            list_id.clone(),
            card.id.clone(),
        ));
        Ok(card)
    }

    /// Look up a card by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] when no card with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_card(&self, id: &CardId) -> Result<Card, KanbanError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Card",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn next_position(&self, list_id: &ListId) -> Result<i64, KanbanError> {
        Ok(self
            .repo
            .max_position(list_id)
            .await?
            .map_or(0, |max| max + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_domain::automation::TriggerType;

    use crate::testing::{InMemoryCardRepo, SpyPublisher};

    fn card(id: &str, list: &str, position: i64) -> Card {
        Card::builder()
            .id(id)
            .board_id("B1")
            .list_id(list)
            .title("Write docs")
            .position(position)
            .build()
            .unwrap()
    }

    fn service(cards: Vec<Card>) -> (CardService<InMemoryCardRepo, SpyPublisher>, InMemoryCardRepo, SpyPublisher) {
        let repo = InMemoryCardRepo::with(cards);
        let publisher = SpyPublisher::default();
        (
            CardService::new(repo.clone(), publisher.clone()),
            repo,
            publisher,
        )
    }

    #[tokio::test]
    async fn should_persist_and_publish_card_created() {
        let (svc, repo, publisher) = service(vec![]);

        let created = svc.create_card(card("C1", "list-1", 0)).await.unwrap();

        assert!(repo.card("C1").is_some());
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trigger_type, TriggerType::CardCreated);
        assert_eq!(events[0].list_id.as_str(), "list-1");
        assert_eq!(events[0].card_id, created.id);
    }

    #[tokio::test]
    async fn should_append_created_card_to_end_of_list() {
        let (svc, _, _) = service(vec![card("C1", "list-1", 4)]);

        let created = svc.create_card(card("C2", "list-1", 0)).await.unwrap();

        assert_eq!(created.position, 5);
    }

    #[tokio::test]
    async fn should_not_publish_when_card_is_invalid() {
        let (svc, _, publisher) = service(vec![]);
        let mut invalid = card("C1", "list-1", 0);
        invalid.title = "   ".to_string();

        let result = svc.create_card(invalid).await;

        assert!(matches!(result, Err(KanbanError::Validation(_))));
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_move_card_and_publish_card_moved_to_list() {
        let (svc, repo, publisher) =
            service(vec![card("C1", "list-1", 0), card("C9", "list-2", 2)]);

        let moved = svc
            .move_card(&CardId::from("C1"), &ListId::from("list-2"))
            .await
            .unwrap();

        assert_eq!(moved.list_id.as_str(), "list-2");
        assert_eq!(moved.position, 3);
        assert_eq!(repo.card("C1").unwrap().position, 3);

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trigger_type, TriggerType::CardMovedToList);
        assert_eq!(events[0].list_id.as_str(), "list-2");
        assert_eq!(events[0].board_id.as_str(), "B1");
    }

    #[tokio::test]
    async fn should_return_not_found_when_moving_unknown_card() {
        let (svc, _, publisher) = service(vec![]);

        let result = svc
            .move_card(&CardId::from("ghost"), &ListId::from("list-2"))
            .await;

        assert!(matches!(result, Err(KanbanError::NotFound(_))));
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_card() {
        let (svc, _, _) = service(vec![]);

        let err = svc.get_card(&CardId::from("ghost")).await.unwrap_err();

        assert_eq!(err.to_string(), "Card ghost not found");
    }
}
