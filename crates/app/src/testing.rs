//! In-memory port fakes shared by the unit tests of this crate.
//!
//! Each fake keeps its state behind an `Arc<Mutex<_>>` so a test can hand a
//! clone to the engine or a service and still inspect the state afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kanban_domain::automation::{AutomationLog, AutomationRule, TriggerEvent, TriggerType};
use kanban_domain::card::Card;
use kanban_domain::error::{KanbanError, NotFoundError};
use kanban_domain::id::{AutomationRuleId, BoardId, CardId, LabelId, ListId, UserId};
use kanban_domain::time::Timestamp;

use crate::ports::{
    AutomationLogRepository, AutomationRuleRepository, CardRepository, TriggerPublisher,
};

fn unavailable() -> KanbanError {
    KanbanError::Storage(Box::new(std::io::Error::other("store unavailable")))
}

fn card_not_found(id: &CardId) -> KanbanError {
    NotFoundError {
        entity: "Card",
        id: id.to_string(),
    }
    .into()
}

// ── Rules ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryRuleRepo {
    store: Arc<Mutex<Vec<AutomationRule>>>,
    fail_lookups: Arc<AtomicBool>,
}

impl InMemoryRuleRepo {
    pub fn with(rules: Vec<AutomationRule>) -> Self {
        Self {
            store: Arc::new(Mutex::new(rules)),
            fail_lookups: Arc::default(),
        }
    }

    /// Make every subsequent lookup fail with a storage error.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }
}

impl AutomationRuleRepository for InMemoryRuleRepo {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, KanbanError>> + Send {
        self.store.lock().unwrap().push(rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: &AutomationRuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, KanbanError>> + Send {
        let store = self.store.lock().unwrap();
        let r = store.iter().find(|rule| &rule.id == id).cloned();
        async { Ok(r) }
    }

    fn find_by_board(
        &self,
        board_id: &BoardId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanbanError>> + Send {
        let store = self.store.lock().unwrap();
        let r: Vec<_> = store
            .iter()
            .filter(|rule| &rule.board_id == board_id)
            .cloned()
            .collect();
        async { Ok(r) }
    }

    fn find_by_board_and_trigger(
        &self,
        board_id: &BoardId,
        trigger_type: TriggerType,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanbanError>> + Send {
        let r = if self.fail_lookups.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            let store = self.store.lock().unwrap();
            Ok(store
                .iter()
                .filter(|rule| {
                    &rule.board_id == board_id && rule.trigger.trigger_type() == trigger_type
                })
                .cloned()
                .collect())
        };
        async { r }
    }

    fn delete(
        &self,
        id: &AutomationRuleId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        self.store.lock().unwrap().retain(|rule| &rule.id != id);
        async { Ok(()) }
    }
}

// ── Cards ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryCardRepo {
    store: Arc<Mutex<HashMap<CardId, Card>>>,
    read_delay: Option<Duration>,
    panic_on: Option<CardId>,
}

impl InMemoryCardRepo {
    pub fn with(cards: Vec<Card>) -> Self {
        let map: HashMap<_, _> = cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            store: Arc::new(Mutex::new(map)),
            read_delay: None,
            panic_on: None,
        }
    }

    /// Make `get_by_id` panic when asked for `id`.
    pub fn panic_on(mut self, id: &str) -> Self {
        self.panic_on = Some(CardId::from(id));
        self
    }

    /// Make every `get_by_id` sleep before answering.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn card(&self, id: &str) -> Option<Card> {
        self.store.lock().unwrap().get(&CardId::from(id)).cloned()
    }

    fn mutate(&self, id: &CardId, f: impl FnOnce(&mut Card)) -> Result<(), KanbanError> {
        let mut store = self.store.lock().unwrap();
        let card = store.get_mut(id).ok_or_else(|| card_not_found(id))?;
        f(card);
        Ok(())
    }
}

impl CardRepository for InMemoryCardRepo {
    fn create(&self, card: Card) -> impl Future<Output = Result<Card, KanbanError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(card.id.clone(), card.clone());
        async { Ok(card) }
    }

    fn get_by_id(
        &self,
        id: &CardId,
    ) -> impl Future<Output = Result<Option<Card>, KanbanError>> + Send {
        assert!(self.panic_on.as_ref() != Some(id), "card store exploded");
        let r = self.store.lock().unwrap().get(id).cloned();
        let delay = self.read_delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(r)
        }
    }

    fn max_position(
        &self,
        list_id: &ListId,
    ) -> impl Future<Output = Result<Option<i64>, KanbanError>> + Send {
        let store = self.store.lock().unwrap();
        let r = store
            .values()
            .filter(|c| &c.list_id == list_id)
            .map(|c| c.position)
            .max();
        async move { Ok(r) }
    }

    fn move_to_list(
        &self,
        id: &CardId,
        list_id: &ListId,
        position: i64,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| {
            card.list_id = list_id.clone();
            card.position = position;
        });
        async { r }
    }

    fn set_done(
        &self,
        id: &CardId,
        done: bool,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| card.is_done = done);
        async { r }
    }

    fn set_archived(
        &self,
        id: &CardId,
        archived: bool,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| card.archived = archived);
        async { r }
    }

    fn add_label(
        &self,
        id: &CardId,
        label_id: &LabelId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| {
            if !card.has_label(label_id) {
                card.label_ids.push(label_id.clone());
            }
        });
        async { r }
    }

    fn remove_label(
        &self,
        id: &CardId,
        label_id: &LabelId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| card.label_ids.retain(|l| l != label_id));
        async { r }
    }

    fn assign_member(
        &self,
        id: &CardId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| {
            if !card.has_member(user_id) {
                card.member_ids.push(user_id.clone());
            }
        });
        async { r }
    }

    fn set_due_date(
        &self,
        id: &CardId,
        due_date: Option<Timestamp>,
    ) -> impl Future<Output = Result<(), KanbanError>> + Send {
        let r = self.mutate(id, |card| card.due_date = due_date);
        async { r }
    }
}

// ── Logs ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryLogRepo {
    store: Arc<Mutex<Vec<AutomationLog>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryLogRepo {
    /// Make every subsequent `record` fail with a storage error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> Vec<AutomationLog> {
        self.store.lock().unwrap().clone()
    }
}

impl AutomationLogRepository for InMemoryLogRepo {
    fn record(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<AutomationLog, KanbanError>> + Send {
        let r = if self.fail_writes.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            self.store.lock().unwrap().push(log.clone());
            Ok(log)
        };
        async { r }
    }

    fn find_by_board(
        &self,
        board_id: &BoardId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, KanbanError>> + Send {
        let store = self.store.lock().unwrap();
        let r: Vec<_> = store
            .iter()
            .rev()
            .filter(|log| &log.board_id == board_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(r) }
    }

    fn find_by_rule(
        &self,
        rule_id: &AutomationRuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, KanbanError>> + Send {
        let store = self.store.lock().unwrap();
        let r: Vec<_> = store
            .iter()
            .rev()
            .filter(|log| &log.rule_id == rule_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(r) }
    }
}

// ── Publisher ──────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SpyPublisher {
    events: Arc<Mutex<Vec<TriggerEvent>>>,
}

impl SpyPublisher {
    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TriggerPublisher for SpyPublisher {
    fn publish(&self, event: TriggerEvent) {
        self.events.lock().unwrap().push(event);
    }
}
