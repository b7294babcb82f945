//! `SQLite` implementation of [`AutomationLogRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanban_app::ports::AutomationLogRepository;
use kanban_domain::automation::{ActionType, AutomationLog, LogOutcome};
use kanban_domain::error::KanbanError;
use kanban_domain::id::{AutomationLogId, AutomationRuleId, BoardId, CardId};

use crate::codec::{decode_error, decode_timestamp, encode_timestamp, limit};
use crate::error::StorageError;

struct Wrapper(AutomationLog);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let rule_id: String = row.try_get("rule_id")?;
        let board_id: String = row.try_get("board_id")?;
        let card_id: String = row.try_get("card_id")?;
        let action_type: Option<String> = row.try_get("action_type")?;
        let outcome: String = row.try_get("outcome")?;
        let detail: String = row.try_get("detail")?;
        let created_at: String = row.try_get("created_at")?;

        let action_type = action_type
            .as_deref()
            .map(ActionType::from_str)
            .transpose()
            .map_err(decode_error)?;
        let outcome = LogOutcome::from_str(&outcome).map_err(decode_error)?;

        Ok(Self(AutomationLog {
            id: AutomationLogId::from(id),
            rule_id: AutomationRuleId::from(rule_id),
            board_id: BoardId::from(board_id),
            card_id: CardId::from(card_id),
            action_type,
            outcome,
            detail,
            created_at: decode_timestamp(&created_at)?,
        }))
    }
}

/// `SQLite`-backed automation log.
pub struct SqliteAutomationLogRepository {
    pool: SqlitePool,
}

impl SqliteAutomationLogRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AutomationLogRepository for SqliteAutomationLogRepository {
    async fn record(&self, log: AutomationLog) -> Result<AutomationLog, KanbanError> {
        sqlx::query(
            "INSERT INTO automation_logs (id, rule_id, board_id, card_id, action_type, outcome, detail, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.id.as_str())
        .bind(log.rule_id.as_str())
        .bind(log.board_id.as_str())
        .bind(log.card_id.as_str())
        .bind(log.action_type.map(ActionType::as_str))
        .bind(log.outcome.as_str())
        .bind(&log.detail)
        .bind(encode_timestamp(&log.created_at))
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(log)
    }

    async fn find_by_board(
        &self,
        board_id: &BoardId,
        max: usize,
    ) -> Result<Vec<AutomationLog>, KanbanError> {
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM automation_logs WHERE board_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(board_id.as_str())
        .bind(limit(max))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_rule(
        &self,
        rule_id: &AutomationRuleId,
        max: usize,
    ) -> Result<Vec<AutomationLog>, KanbanError> {
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM automation_logs WHERE rule_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(rule_id.as_str())
        .bind(limit(max))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
