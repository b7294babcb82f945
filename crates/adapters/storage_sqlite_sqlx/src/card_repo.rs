//! `SQLite` implementation of [`CardRepository`].
//!
//! Labels and members live in their own association tables and are loaded
//! alongside the card row, in the order they were attached.

use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};

use kanban_app::ports::CardRepository;
use kanban_domain::card::Card;
use kanban_domain::error::{KanbanError, NotFoundError};
use kanban_domain::id::{BoardId, CardId, LabelId, ListId, UserId};
use kanban_domain::time::{Timestamp, now};

use crate::codec::{decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Card);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let board_id: String = row.try_get("board_id")?;
        let list_id: String = row.try_get("list_id")?;
        let title: String = row.try_get("title")?;
        let position: i64 = row.try_get("position")?;
        let is_done: bool = row.try_get("is_done")?;
        let archived: bool = row.try_get("archived")?;
        let due_date: Option<String> = row.try_get("due_date")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self(Card {
            id: CardId::from(id),
            board_id: BoardId::from(board_id),
            list_id: ListId::from(list_id),
            title,
            position,
            is_done,
            archived,
            due_date: due_date.as_deref().map(decode_timestamp).transpose()?,
            label_ids: Vec::new(),
            member_ids: Vec::new(),
            created_at: decode_timestamp(&created_at)?,
            updated_at: decode_timestamp(&updated_at)?,
        }))
    }
}

fn not_found(id: &CardId) -> KanbanError {
    NotFoundError {
        entity: "Card",
        id: id.to_string(),
    }
    .into()
}

fn ensure_found(id: &CardId, result: &SqliteQueryResult) -> Result<(), KanbanError> {
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Bump `updated_at`, failing with `NotFound` when the card does not exist.
async fn touch(tx: &mut Transaction<'_, Sqlite>, id: &CardId) -> Result<(), KanbanError> {
    let result = sqlx::query("UPDATE cards SET updated_at = ? WHERE id = ?")
        .bind(encode_timestamp(&now()))
        .bind(id.as_str())
        .execute(&mut **tx)
        .await
        .map_err(StorageError::from)?;
    ensure_found(id, &result)
}

/// `SQLite`-backed card repository.
pub struct SqliteCardRepository {
    pool: SqlitePool,
}

impl SqliteCardRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or delete an association row after checking the card exists.
    async fn associate(&self, id: &CardId, sql: &str, other: &str) -> Result<(), KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        touch(&mut tx, id).await?;
        sqlx::query(sql)
            .bind(id.as_str())
            .bind(other)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}

impl CardRepository for SqliteCardRepository {
    async fn create(&self, card: Card) -> Result<Card, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO cards (id, board_id, list_id, title, position, is_done, archived, due_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(card.id.as_str())
        .bind(card.board_id.as_str())
        .bind(card.list_id.as_str())
        .bind(&card.title)
        .bind(card.position)
        .bind(card.is_done)
        .bind(card.archived)
        .bind(card.due_date.as_ref().map(encode_timestamp))
        .bind(encode_timestamp(&card.created_at))
        .bind(encode_timestamp(&card.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        for label_id in &card.label_ids {
            sqlx::query("INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?, ?)")
                .bind(card.id.as_str())
                .bind(label_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        for user_id in &card.member_ids {
            sqlx::query("INSERT OR IGNORE INTO card_members (card_id, user_id) VALUES (?, ?)")
                .bind(card.id.as_str())
                .bind(user_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(card)
    }

    async fn get_by_id(&self, id: &CardId) -> Result<Option<Card>, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM cards WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let Some(Wrapper(mut card)) = row else {
            return Ok(None);
        };

        let labels: Vec<String> =
            sqlx::query_scalar("SELECT label_id FROM card_labels WHERE card_id = ? ORDER BY rowid")
                .bind(id.as_str())
                .fetch_all(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        let members: Vec<String> =
            sqlx::query_scalar("SELECT user_id FROM card_members WHERE card_id = ? ORDER BY rowid")
                .bind(id.as_str())
                .fetch_all(&mut *tx)
                .await
                .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;

        card.label_ids = labels.into_iter().map(LabelId::from).collect();
        card.member_ids = members.into_iter().map(UserId::from).collect();
        Ok(Some(card))
    }

    async fn max_position(&self, list_id: &ListId) -> Result<Option<i64>, KanbanError> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(position) FROM cards WHERE list_id = ?")
            .bind(list_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(max)
    }

    async fn move_to_list(
        &self,
        id: &CardId,
        list_id: &ListId,
        position: i64,
    ) -> Result<(), KanbanError> {
        let result = sqlx::query("UPDATE cards SET list_id = ?, position = ?, updated_at = ? WHERE id = ?")
            .bind(list_id.as_str())
            .bind(position)
            .bind(encode_timestamp(&now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        ensure_found(id, &result)
    }

    async fn set_done(&self, id: &CardId, done: bool) -> Result<(), KanbanError> {
        let result = sqlx::query("UPDATE cards SET is_done = ?, updated_at = ? WHERE id = ?")
            .bind(done)
            .bind(encode_timestamp(&now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        ensure_found(id, &result)
    }

    async fn set_archived(&self, id: &CardId, archived: bool) -> Result<(), KanbanError> {
        let result = sqlx::query("UPDATE cards SET archived = ?, updated_at = ? WHERE id = ?")
            .bind(archived)
            .bind(encode_timestamp(&now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        ensure_found(id, &result)
    }

    async fn add_label(&self, id: &CardId, label_id: &LabelId) -> Result<(), KanbanError> {
        self.associate(
            id,
            "INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?, ?)",
            label_id.as_str(),
        )
        .await
    }

    async fn remove_label(&self, id: &CardId, label_id: &LabelId) -> Result<(), KanbanError> {
        self.associate(
            id,
            "DELETE FROM card_labels WHERE card_id = ? AND label_id = ?",
            label_id.as_str(),
        )
        .await
    }

    async fn assign_member(&self, id: &CardId, user_id: &UserId) -> Result<(), KanbanError> {
        self.associate(
            id,
            "INSERT OR IGNORE INTO card_members (card_id, user_id) VALUES (?, ?)",
            user_id.as_str(),
        )
        .await
    }

    async fn set_due_date(&self, id: &CardId, due_date: Option<Timestamp>) -> Result<(), KanbanError> {
        let result = sqlx::query("UPDATE cards SET due_date = ?, updated_at = ? WHERE id = ?")
            .bind(due_date.as_ref().map(encode_timestamp))
            .bind(encode_timestamp(&now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        ensure_found(id, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use kanban_domain::time::parse_due_date;

    async fn setup() -> SqliteCardRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteCardRepository::new(db.pool().clone())
    }

    fn card(id: &str, list: &str, position: i64) -> Card {
        Card::builder()
            .id(id)
            .board_id("B1")
            .list_id(list)
            .title("Ship release")
            .position(position)
            .build()
            .unwrap()
    }

    fn id(value: &str) -> CardId {
        CardId::from(value)
    }

    #[tokio::test]
    async fn should_create_and_retrieve_card_with_associations() {
        let repo = setup().await;
        let mut c1 = card("C1", "list-1", 0);
        c1.label_ids = vec![LabelId::from("b"), LabelId::from("a")];
        c1.member_ids = vec![UserId::from("u-1")];
        c1.due_date = Some(parse_due_date("2025-06-30").unwrap());

        repo.create(c1.clone()).await.unwrap();
        let fetched = repo.get_by_id(&id("C1")).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Ship release");
        assert_eq!(fetched.label_ids, c1.label_ids);
        assert_eq!(fetched.member_ids, c1.member_ids);
        assert_eq!(fetched.due_date, c1.due_date);
        assert!(!fetched.is_done);
        assert!(!fetched.archived);
    }

    #[tokio::test]
    async fn should_return_none_when_card_not_found() {
        let repo = setup().await;
        assert!(repo.get_by_id(&id("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_report_max_position_per_list() {
        let repo = setup().await;
        repo.create(card("C1", "list-1", 2)).await.unwrap();
        repo.create(card("C2", "list-1", 9)).await.unwrap();
        repo.create(card("C3", "list-2", 40)).await.unwrap();

        let list_1 = repo.max_position(&ListId::from("list-1")).await.unwrap();
        let empty = repo.max_position(&ListId::from("list-9")).await.unwrap();

        assert_eq!(list_1, Some(9));
        assert_eq!(empty, None);
    }

    #[tokio::test]
    async fn should_move_card_to_list() {
        let repo = setup().await;
        repo.create(card("C1", "list-1", 0)).await.unwrap();

        repo.move_to_list(&id("C1"), &ListId::from("list-2"), 4)
            .await
            .unwrap();

        let moved = repo.get_by_id(&id("C1")).await.unwrap().unwrap();
        assert_eq!(moved.list_id.as_str(), "list-2");
        assert_eq!(moved.position, 4);
    }

    #[tokio::test]
    async fn should_update_flags_and_due_date() {
        let repo = setup().await;
        repo.create(card("C1", "list-1", 0)).await.unwrap();
        let due = parse_due_date("2025-03-01T09:30:00Z").unwrap();

        repo.set_done(&id("C1"), true).await.unwrap();
        repo.set_archived(&id("C1"), true).await.unwrap();
        repo.set_due_date(&id("C1"), Some(due)).await.unwrap();

        let updated = repo.get_by_id(&id("C1")).await.unwrap().unwrap();
        assert!(updated.is_done);
        assert!(updated.archived);
        assert_eq!(updated.due_date, Some(due));

        repo.set_due_date(&id("C1"), None).await.unwrap();
        let cleared = repo.get_by_id(&id("C1")).await.unwrap().unwrap();
        assert_eq!(cleared.due_date, None);
    }

    #[tokio::test]
    async fn should_keep_single_association_when_added_twice() {
        let repo = setup().await;
        repo.create(card("C1", "list-1", 0)).await.unwrap();

        for _ in 0..2 {
            repo.add_label(&id("C1"), &LabelId::from("x")).await.unwrap();
            repo.assign_member(&id("C1"), &UserId::from("u-1"))
                .await
                .unwrap();
        }

        let fetched = repo.get_by_id(&id("C1")).await.unwrap().unwrap();
        assert_eq!(fetched.label_ids, vec![LabelId::from("x")]);
        assert_eq!(fetched.member_ids, vec![UserId::from("u-1")]);
    }

    #[tokio::test]
    async fn should_remove_label_and_tolerate_absent_one() {
        let repo = setup().await;
        let mut c1 = card("C1", "list-1", 0);
        c1.label_ids = vec![LabelId::from("x")];
        repo.create(c1).await.unwrap();

        repo.remove_label(&id("C1"), &LabelId::from("x")).await.unwrap();
        repo.remove_label(&id("C1"), &LabelId::from("x")).await.unwrap();

        let fetched = repo.get_by_id(&id("C1")).await.unwrap().unwrap();
        assert!(fetched.label_ids.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_mutating_missing_card() {
        let repo = setup().await;

        let done = repo.set_done(&id("ghost"), true).await;
        let label = repo.add_label(&id("ghost"), &LabelId::from("x")).await;
        let moved = repo
            .move_to_list(&id("ghost"), &ListId::from("list-2"), 0)
            .await;

        assert!(matches!(done, Err(KanbanError::NotFound(_))));
        assert!(matches!(label, Err(KanbanError::NotFound(_))));
        assert!(matches!(moved, Err(KanbanError::NotFound(_))));
    }
}
