//! `SQLite` implementation of [`AutomationRuleRepository`].
//!
//! A rule is one `automation_rules` row plus one `automation_actions` row per
//! action, keyed by its position in the rule.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanban_app::ports::AutomationRuleRepository;
use kanban_domain::automation::{Action, ActionType, AutomationRule, Trigger, TriggerType};
use kanban_domain::error::KanbanError;
use kanban_domain::id::{AutomationRuleId, BoardId};

use crate::codec::{decode_error, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(AutomationRule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let board_id: String = row.try_get("board_id")?;
        let trigger_type: String = row.try_get("trigger_type")?;
        let trigger_value: Option<String> = row.try_get("trigger_value")?;
        let created_at: String = row.try_get("created_at")?;

        let trigger_type = TriggerType::from_str(&trigger_type).map_err(decode_error)?;

        Ok(Self(AutomationRule {
            id: AutomationRuleId::from(id),
            board_id: BoardId::from(board_id),
            trigger: Trigger::from_parts(trigger_type, trigger_value),
            actions: Vec::new(),
            created_at: decode_timestamp(&created_at)?,
        }))
    }
}

struct ActionRow {
    rule_id: String,
    action: Action,
}

impl<'r> FromRow<'r, SqliteRow> for ActionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let rule_id: String = row.try_get("rule_id")?;
        let action_type: String = row.try_get("action_type")?;
        let action_value: Option<String> = row.try_get("action_value")?;

        let action_type = ActionType::from_str(&action_type).map_err(decode_error)?;

        Ok(Self {
            rule_id,
            action: Action::from_parts(action_type, action_value),
        })
    }
}

/// Attach each rule's actions, in position order.
///
/// `actions` must already be sorted by position within each rule.
fn assemble(rules: Vec<Wrapper>, actions: Vec<ActionRow>) -> Vec<AutomationRule> {
    let mut by_rule: HashMap<String, Vec<Action>> = HashMap::new();
    for row in actions {
        by_rule.entry(row.rule_id).or_default().push(row.action);
    }
    rules
        .into_iter()
        .map(|Wrapper(mut rule)| {
            rule.actions = by_rule.remove(rule.id.as_str()).unwrap_or_default();
            rule
        })
        .collect()
}

/// `SQLite`-backed automation rule repository.
pub struct SqliteAutomationRuleRepository {
    pool: SqlitePool,
}

impl SqliteAutomationRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AutomationRuleRepository for SqliteAutomationRuleRepository {
    async fn create(&self, rule: AutomationRule) -> Result<AutomationRule, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO automation_rules (id, board_id, trigger_type, trigger_value, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(rule.id.as_str())
        .bind(rule.board_id.as_str())
        .bind(rule.trigger.trigger_type().as_str())
        .bind(rule.trigger.value().map(|list_id| list_id.as_str()))
        .bind(encode_timestamp(&rule.created_at))
        .execute(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        for (position, action) in (0_i64..).zip(&rule.actions) {
            sqlx::query(
                "INSERT INTO automation_actions (rule_id, position, action_type, action_value) VALUES (?, ?, ?, ?)",
            )
            .bind(rule.id.as_str())
            .bind(position)
            .bind(action.action_type().as_str())
            .bind(action.value())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(rule)
    }

    async fn get_by_id(&self, id: &AutomationRuleId) -> Result<Option<AutomationRule>, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let rule: Option<Wrapper> = sqlx::query_as("SELECT * FROM automation_rules WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let Some(rule) = rule else {
            return Ok(None);
        };

        let actions: Vec<ActionRow> = sqlx::query_as(
            "SELECT * FROM automation_actions WHERE rule_id = ? ORDER BY position",
        )
        .bind(id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(assemble(vec![rule], actions).pop())
    }

    async fn find_by_board(&self, board_id: &BoardId) -> Result<Vec<AutomationRule>, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let rules: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM automation_rules WHERE board_id = ? ORDER BY created_at, id",
        )
        .bind(board_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        let actions: Vec<ActionRow> = sqlx::query_as(
            "SELECT a.* FROM automation_actions a \
             JOIN automation_rules r ON r.id = a.rule_id \
             WHERE r.board_id = ? \
             ORDER BY a.rule_id, a.position",
        )
        .bind(board_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(assemble(rules, actions))
    }

    async fn find_by_board_and_trigger(
        &self,
        board_id: &BoardId,
        trigger_type: TriggerType,
    ) -> Result<Vec<AutomationRule>, KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let rules: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM automation_rules WHERE board_id = ? AND trigger_type = ? ORDER BY created_at, id",
        )
        .bind(board_id.as_str())
        .bind(trigger_type.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        let actions: Vec<ActionRow> = sqlx::query_as(
            "SELECT a.* FROM automation_actions a \
             JOIN automation_rules r ON r.id = a.rule_id \
             WHERE r.board_id = ? AND r.trigger_type = ? \
             ORDER BY a.rule_id, a.position",
        )
        .bind(board_id.as_str())
        .bind(trigger_type.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(assemble(rules, actions))
    }

    async fn delete(&self, id: &AutomationRuleId) -> Result<(), KanbanError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query("DELETE FROM automation_actions WHERE rule_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        sqlx::query("DELETE FROM automation_rules WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
