//! Automation log port: append-only storage for execution records.

use std::future::Future;

use kanban_domain::automation::AutomationLog;
use kanban_domain::error::KanbanError;
use kanban_domain::id::{AutomationRuleId, BoardId};

/// Repository for appending and querying [`AutomationLog`] entries.
pub trait AutomationLogRepository {
    /// Append an entry. Entries are never updated afterwards.
    fn record(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<AutomationLog, KanbanError>> + Send;

    /// Most recent entries for a board, newest first.
    fn find_by_board(
        &self,
        board_id: &BoardId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, KanbanError>> + Send;

    /// Most recent entries for a rule, newest first.
    fn find_by_rule(
        &self,
        rule_id: &AutomationRuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, KanbanError>> + Send;
}
