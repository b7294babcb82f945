//! Automation engine: reacts to board events by running matching rules.
//!
//! For each trigger the engine loads the board's rules for that trigger
//! type, keeps those whose trigger matches the event, and applies each
//! rule's actions to the event's card in stored order. Failures stay local:
//! a failed action is logged and the next action runs, a failed rule never
//! stops the next rule, and nothing is ever returned as an error.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use kanban_domain::automation::{
    Action, ActionType, AutomationLog, AutomationRule, LogOutcome, TriggerEvent,
};
use kanban_domain::error::{KanbanError, NotFoundError, ValidationError};
use kanban_domain::id::{AutomationRuleId, CardId};
use kanban_domain::time::parse_due_date;

use crate::ports::{AutomationLogRepository, AutomationRuleRepository, CardRepository};

/// Default upper bound for processing a single trigger.
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for [`AutomationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Soft deadline for a whole trigger; `None` disables it.
    pub pipeline_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline_timeout: Some(DEFAULT_PIPELINE_TIMEOUT),
        }
    }
}

/// What happened while processing one trigger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerReport {
    /// The rule store could not be read; nothing ran.
    pub lookup_failed: bool,
    /// One entry per matched rule, in execution order.
    pub rules: Vec<RuleReport>,
}

impl TriggerReport {
    fn lookup_failed() -> Self {
        Self {
            lookup_failed: true,
            rules: Vec::new(),
        }
    }

    /// Whether any rule was cut short by the pipeline timeout.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.rules.iter().any(|rule| rule.timed_out)
    }
}

/// Outcome of one matched rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub rule_id: AutomationRuleId,
    /// Number of actions that completed successfully.
    pub applied: usize,
    pub failures: Vec<ActionFailure>,
    pub timed_out: bool,
}

impl RuleReport {
    fn new(rule_id: AutomationRuleId) -> Self {
        Self {
            rule_id,
            applied: 0,
            failures: Vec::new(),
            timed_out: false,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.timed_out
    }
}

/// A single action that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct ActionFailure {
    pub action_type: ActionType,
    pub reason: String,
}

/// Result of a successful action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Applied,
    /// The card was already in the requested state; nothing was written.
    Unchanged,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Unchanged => f.write_str("already satisfied"),
        }
    }
}

/// Trigger dispatcher, rule matcher and action executor in one pipeline.
pub struct AutomationEngine<RR, CR, LR> {
    rule_repo: RR,
    card_repo: CR,
    log_repo: LR,
    config: EngineConfig,
}

impl<RR, CR, LR> AutomationEngine<RR, CR, LR>
where
    RR: AutomationRuleRepository,
    CR: CardRepository,
    LR: AutomationLogRepository,
{
    /// Create a new engine with the default configuration.
    pub fn new(rule_repo: RR, card_repo: CR, log_repo: LR) -> Self {
        Self {
            rule_repo,
            card_repo,
            log_repo,
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Process one board event against the board's rules.
    ///
    /// Never fails: a rule-lookup failure is logged once and reported
    /// through [`TriggerReport::lookup_failed`], action failures are logged
    /// and collected per rule.
    #[tracing::instrument(
        skip_all,
        fields(
            board_id = %event.board_id,
            trigger = %event.trigger_type,
            list_id = %event.list_id,
            card_id = %event.card_id,
        )
    )]
    pub async fn process_trigger(&self, event: &TriggerEvent) -> TriggerReport {
        let rules = match self
            .rule_repo
            .find_by_board_and_trigger(&event.board_id, event.trigger_type)
            .await
        {
            Ok(rules) => rules,
            Err(err) => {
                tracing::error!(error = %err, "failed to load automation rules");
                return TriggerReport::lookup_failed();
            }
        };

        let deadline = self
            .config
            .pipeline_timeout
            .map(|timeout| Instant::now() + timeout);
        let mut report = TriggerReport::default();

        for rule in &rules {
            if !rule.trigger.matches(event) {
                tracing::trace!(rule_id = %rule.id, trigger = %rule.trigger, "rule does not match");
                continue;
            }
            let outcome = self.run_rule(rule, event, deadline).await;
            let timed_out = outcome.timed_out;
            report.rules.push(outcome);
            if timed_out {
                break;
            }
        }

        tracing::debug!(
            candidates = rules.len(),
            matched = report.rules.len(),
            "trigger processed"
        );
        report
    }

    /// Run a matched rule's actions sequentially and log every step.
    async fn run_rule(
        &self,
        rule: &AutomationRule,
        event: &TriggerEvent,
        deadline: Option<Instant>,
    ) -> RuleReport {
        let mut report = RuleReport::new(rule.id.clone());

        for action in &rule.actions {
            let result = match deadline {
                Some(deadline) if Instant::now() >= deadline => None,
                Some(deadline) => {
                    tokio::time::timeout_at(deadline, self.execute_action(&event.card_id, action))
                        .await
                        .ok()
                }
                None => Some(self.execute_action(&event.card_id, action).await),
            };

            match result {
                Some(Ok(effect)) => {
                    report.applied += 1;
                    tracing::debug!(rule_id = %rule.id, %action, %effect, "action executed");
                    self.record(AutomationLog::new(
                        rule.id.clone(),
                        event.board_id.clone(),
                        event.card_id.clone(),
                        Some(action.action_type()),
                        LogOutcome::Success,
                        format!("{action} {effect}"),
                    ))
                    .await;
                }
                Some(Err(err)) => {
                    tracing::warn!(rule_id = %rule.id, %action, error = %err, "action failed");
                    self.record(AutomationLog::new(
                        rule.id.clone(),
                        event.board_id.clone(),
                        event.card_id.clone(),
                        Some(action.action_type()),
                        LogOutcome::Failure,
                        format!("{action} failed: {err}"),
                    ))
                    .await;
                    report.failures.push(ActionFailure {
                        action_type: action.action_type(),
                        reason: err.to_string(),
                    });
                }
                None => {
                    tracing::warn!(rule_id = %rule.id, %action, "automation pipeline timed out");
                    report.timed_out = true;
                    break;
                }
            }
        }

        let total = rule.actions.len();
        let (outcome, detail) = if report.timed_out {
            (
                LogOutcome::Failure,
                format!(
                    "automation pipeline timed out after applying {} of {total} actions",
                    report.applied
                ),
            )
        } else if report.failures.is_empty() {
            (
                LogOutcome::Success,
                format!("applied {} of {total} actions", report.applied),
            )
        } else {
            (
                LogOutcome::Failure,
                format!("applied {} of {total} actions", report.applied),
            )
        };
        self.record(AutomationLog::new(
            rule.id.clone(),
            event.board_id.clone(),
            event.card_id.clone(),
            None,
            outcome,
            detail,
        ))
        .await;

        report
    }

    /// Apply one action to the card.
    ///
    /// The card is re-read first so the action observes the effects of the
    /// actions before it.
    async fn execute_action(&self, card_id: &CardId, action: &Action) -> Result<Effect, KanbanError> {
        if action.value().is_some_and(str::is_empty) {
            return Err(ValidationError::MissingActionValue(action.action_type()).into());
        }

        let card = self
            .card_repo
            .get_by_id(card_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Card",
                id: card_id.to_string(),
            })?;

        match action {
            Action::ArchiveCard => {
                if card.archived {
                    return Ok(Effect::Unchanged);
                }
                self.card_repo.set_archived(card_id, true).await?;
            }
            Action::MarkAsDone => {
                if card.is_done {
                    return Ok(Effect::Unchanged);
                }
                self.card_repo.set_done(card_id, true).await?;
            }
            Action::AddLabel(label_id) => {
                if card.has_label(label_id) {
                    return Ok(Effect::Unchanged);
                }
                self.card_repo.add_label(card_id, label_id).await?;
            }
            Action::RemoveLabel(label_id) => {
                if !card.has_label(label_id) {
                    return Ok(Effect::Unchanged);
                }
                self.card_repo.remove_label(card_id, label_id).await?;
            }
            Action::MoveCard(list_id) => {
                let position = self
                    .card_repo
                    .max_position(list_id)
                    .await?
                    .map_or(0, |max| max + 1);
                self.card_repo
                    .move_to_list(card_id, list_id, position)
                    .await?;
            }
            Action::AssignMember(user_id) => {
                if card.has_member(user_id) {
                    return Ok(Effect::Unchanged);
                }
                self.card_repo.assign_member(card_id, user_id).await?;
            }
            Action::SetDueDate(raw) => {
                let due_date = parse_due_date(raw)?;
                self.card_repo.set_due_date(card_id, Some(due_date)).await?;
            }
        }
        Ok(Effect::Applied)
    }

    /// Best-effort log write; failures are traced and swallowed.
    async fn record(&self, log: AutomationLog) {
        if let Err(err) = self.log_repo.record(log).await {
            tracing::warn!(error = %err, "failed to write automation log");
        }
    }
}
