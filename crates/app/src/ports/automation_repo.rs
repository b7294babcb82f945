//! Automation rule repository port: persistence for rules and their actions.

use std::future::Future;

use kanban_domain::automation::{AutomationRule, TriggerType};
use kanban_domain::error::KanbanError;
use kanban_domain::id::{AutomationRuleId, BoardId};

/// Repository for persisting and querying [`AutomationRule`]s.
///
/// Rules are written by the board-settings collaborator; the engine only
/// calls the read methods. Every returned rule carries its actions in
/// stored order.
pub trait AutomationRuleRepository {
    /// Store a new rule together with its ordered actions.
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, KanbanError>> + Send;

    /// Get a rule by its unique identifier.
    fn get_by_id(
        &self,
        id: &AutomationRuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, KanbanError>> + Send;

    /// Get every rule of a board, oldest first.
    fn find_by_board(
        &self,
        board_id: &BoardId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanbanError>> + Send;

    /// Get the rules of a board listening for `trigger_type`, oldest first.
    fn find_by_board_and_trigger(
        &self,
        board_id: &BoardId,
        trigger_type: TriggerType,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanbanError>> + Send;

    /// Delete a rule and, by cascade, its actions.
    fn delete(&self, id: &AutomationRuleId)
    -> impl Future<Output = Result<(), KanbanError>> + Send;
}
