//! Fire-and-forget trigger dispatcher.
//!
//! Card mutations publish [`TriggerEvent`]s through [`AutomationDispatcher`]
//! and return immediately. A single worker task drains the bounded queue and
//! runs each trigger through the [`AutomationEngine`] on its own task, so a
//! slow or panicking pipeline never blocks the caller or the next trigger.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use kanban_domain::automation::TriggerEvent;

use crate::automation_engine::AutomationEngine;
use crate::ports::{
    AutomationLogRepository, AutomationRuleRepository, CardRepository, TriggerPublisher,
};

/// Default number of triggers buffered before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Publishing handle for the automation worker.
///
/// Cheap to clone. The worker stops once every handle has been dropped and
/// all queued triggers have been processed.
#[derive(Debug, Clone)]
pub struct AutomationDispatcher {
    sender: mpsc::Sender<TriggerEvent>,
}

impl AutomationDispatcher {
    /// Start the worker and return a publishing handle plus the worker's
    /// join handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<RR, CR, LR>(
        engine: Arc<AutomationEngine<RR, CR, LR>>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>)
    where
        RR: AutomationRuleRepository + Send + Sync + 'static,
        CR: CardRepository + Send + Sync + 'static,
        LR: AutomationLogRepository + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(engine, receiver));
        (Self { sender }, worker)
    }
}

impl TriggerPublisher for AutomationDispatcher {
    fn publish(&self, event: TriggerEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => tracing::warn!(
                board_id = %event.board_id,
                trigger = %event.trigger_type,
                card_id = %event.card_id,
                "automation queue full, dropping trigger"
            ),
            Err(TrySendError::Closed(event)) => tracing::warn!(
                board_id = %event.board_id,
                trigger = %event.trigger_type,
                card_id = %event.card_id,
                "automation worker stopped, dropping trigger"
            ),
        }
    }
}

async fn run_worker<RR, CR, LR>(
    engine: Arc<AutomationEngine<RR, CR, LR>>,
    mut receiver: mpsc::Receiver<TriggerEvent>,
) where
    RR: AutomationRuleRepository + Send + Sync + 'static,
    CR: CardRepository + Send + Sync + 'static,
    LR: AutomationLogRepository + Send + Sync + 'static,
{
    tracing::debug!("automation worker started");
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(event) => {
                    let engine = Arc::clone(&engine);
                    tasks.spawn(async move {
                        engine.process_trigger(&event).await;
                    });
                }
                None => break,
            },
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
        }
    }

    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
    tracing::debug!("automation worker stopped");
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        if err.is_panic() {
            tracing::error!(error = %err, "automation task panicked");
        } else {
            tracing::warn!(error = %err, "automation task cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_domain::automation::{Action, AutomationRule, Trigger};
    use kanban_domain::card::Card;
    use kanban_domain::id::{BoardId, CardId, ListId};

    use crate::testing::{InMemoryCardRepo, InMemoryLogRepo, InMemoryRuleRepo};

    fn card(id: &str) -> Card {
        Card::builder()
            .id(id)
            .board_id("B1")
            .list_id("list-2")
            .title("Card")
            .build()
            .unwrap()
    }

    fn done_rule() -> AutomationRule {
        AutomationRule::builder()
            .id("R1")
            .board_id("B1")
            .trigger(Trigger::CardMovedToList {
                list_id: Some(ListId::from("list-2")),
            })
            .action(Action::MarkAsDone)
            .build()
            .unwrap()
    }

    fn moved(card_id: &str) -> TriggerEvent {
        TriggerEvent::card_moved_to_list(
            BoardId::from("B1"),
            ListId::from("list-2"),
            CardId::from(card_id),
        )
    }

    fn engine(
        cards: InMemoryCardRepo,
        logs: InMemoryLogRepo,
    ) -> Arc<AutomationEngine<InMemoryRuleRepo, InMemoryCardRepo, InMemoryLogRepo>> {
        Arc::new(AutomationEngine::new(
            InMemoryRuleRepo::with(vec![done_rule()]),
            cards,
            logs,
        ))
    }

    #[tokio::test]
    async fn should_process_published_trigger_in_background() {
        let cards = InMemoryCardRepo::with(vec![card("C1")]);
        let logs = InMemoryLogRepo::default();
        let (dispatcher, worker) =
            AutomationDispatcher::spawn(engine(cards.clone(), logs.clone()), 8);

        dispatcher.publish(moved("C1"));
        drop(dispatcher);
        worker.await.unwrap();

        assert!(cards.card("C1").unwrap().is_done);
        assert_eq!(logs.entries().len(), 2);
    }

    #[tokio::test]
    async fn should_return_before_trigger_is_processed() {
        let cards = InMemoryCardRepo::with(vec![card("C1")]);
        let (dispatcher, worker) =
            AutomationDispatcher::spawn(engine(cards.clone(), InMemoryLogRepo::default()), 8);

        dispatcher.publish(moved("C1"));

        // current-thread runtime: the worker has not been polled yet
        assert!(!cards.card("C1").unwrap().is_done);

        drop(dispatcher);
        worker.await.unwrap();
        assert!(cards.card("C1").unwrap().is_done);
    }

    #[tokio::test]
    async fn should_drop_triggers_when_queue_is_full() {
        let cards = InMemoryCardRepo::with(vec![card("C1"), card("C2"), card("C3")]);
        let (dispatcher, worker) =
            AutomationDispatcher::spawn(engine(cards.clone(), InMemoryLogRepo::default()), 1);

        dispatcher.publish(moved("C1"));
        dispatcher.publish(moved("C2"));
        dispatcher.publish(moved("C3"));
        drop(dispatcher);
        worker.await.unwrap();

        assert!(cards.card("C1").unwrap().is_done);
        assert!(!cards.card("C2").unwrap().is_done);
        assert!(!cards.card("C3").unwrap().is_done);
    }

    #[tokio::test]
    async fn should_keep_running_when_a_pipeline_panics() {
        let cards = InMemoryCardRepo::with(vec![card("C1"), card("boom")]).panic_on("boom");
        let (dispatcher, worker) =
            AutomationDispatcher::spawn(engine(cards.clone(), InMemoryLogRepo::default()), 8);

        dispatcher.publish(moved("boom"));
        dispatcher.publish(moved("C1"));
        drop(dispatcher);

        assert!(worker.await.is_ok());
        assert!(cards.card("C1").unwrap().is_done);
    }

    #[tokio::test]
    async fn should_not_fail_publisher_when_worker_is_gone() {
        let cards = InMemoryCardRepo::with(vec![card("C1")]);
        let (dispatcher, worker) =
            AutomationDispatcher::spawn(engine(cards.clone(), InMemoryLogRepo::default()), 8);

        worker.abort();
        let _ = worker.await;

        dispatcher.publish(moved("C1"));
        assert!(!cards.card("C1").unwrap().is_done);
    }
}
