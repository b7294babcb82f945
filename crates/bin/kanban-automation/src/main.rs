//! # kanban-automation: board automation operator CLI
//!
//! Composition root that wires the `SQLite` adapter, the automation engine
//! and its dispatcher together.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialize logging to stderr
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct the engine, dispatcher and card service, injecting repositories
//!   via port traits
//! - Run one operator command and print its result as JSON on stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kanban_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteAutomationLogRepository, SqliteAutomationRuleRepository,
    SqliteCardRepository,
};
use kanban_app::automation_engine::AutomationEngine;
use kanban_app::dispatcher::AutomationDispatcher;
use kanban_app::ports::{AutomationLogRepository, AutomationRuleRepository, CardRepository};
use kanban_app::services::card_service::CardService;
use kanban_domain::automation::{
    Action, ActionType, AutomationRule, Trigger, TriggerEvent, TriggerType,
};
use kanban_domain::card::Card;
use kanban_domain::error::{KanbanError, NotFoundError};
use kanban_domain::id::{AutomationRuleId, BoardId, CardId, ListId};

use crate::config::Config;

type Engine = AutomationEngine<
    SqliteAutomationRuleRepository,
    SqliteCardRepository,
    SqliteAutomationLogRepository,
>;

#[derive(Parser)]
#[command(name = "kanban-automation")]
#[command(version, about = "Trigger/action automation for kanban boards")]
struct Cli {
    /// Path to the configuration file (defaults to ./kanban-automation.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a board's automation rules
    Rules {
        #[arg(long)]
        board: String,
    },
    /// Store a new automation rule
    AddRule {
        #[arg(long)]
        board: String,
        #[arg(long, value_enum)]
        trigger: TriggerKind,
        /// List the trigger is scoped to (omit to match any list on card creation)
        #[arg(long)]
        list: Option<String>,
        /// Action as `TYPE` or `TYPE=VALUE`, e.g. `ADD_LABEL=lbl-1`; repeatable, kept in order
        #[arg(long = "action", value_parser = parse_action)]
        actions: Vec<Action>,
    },
    /// Delete an automation rule
    DeleteRule {
        #[arg(long)]
        rule: String,
    },
    /// Print the most recent automation log entries
    Logs {
        #[arg(long)]
        board: String,
        /// Number of entries (defaults to `engine.log_limit`)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run a trigger through the engine synchronously and print the report
    Trigger {
        #[arg(long)]
        board: String,
        #[arg(long, value_enum)]
        kind: TriggerKind,
        #[arg(long)]
        list: String,
        #[arg(long)]
        card: String,
    },
    /// Create a card and let its automations run
    CreateCard {
        #[arg(long)]
        board: String,
        #[arg(long)]
        list: String,
        #[arg(long)]
        title: String,
    },
    /// Move a card to another list and let its automations run
    MoveCard {
        #[arg(long)]
        card: String,
        #[arg(long)]
        list: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TriggerKind {
    CardCreated,
    CardMovedToList,
}

impl From<TriggerKind> for TriggerType {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::CardCreated => Self::CardCreated,
            TriggerKind::CardMovedToList => Self::CardMovedToList,
        }
    }
}

fn parse_action(raw: &str) -> Result<Action, String> {
    let (kind, value) = match raw.split_once('=') {
        Some((kind, value)) => (kind, Some(value.to_string())),
        None => (raw, None),
    };
    let action_type = ActionType::from_str(kind).map_err(|err| err.to_string())?;
    Ok(Action::from_parts(action_type, value))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Repositories
    let rule_repo = SqliteAutomationRuleRepository::new(pool.clone());
    let log_repo = SqliteAutomationLogRepository::new(pool.clone());
    let card_repo = SqliteCardRepository::new(pool.clone());

    // Engine
    let engine: Arc<Engine> = Arc::new(
        AutomationEngine::new(
            SqliteAutomationRuleRepository::new(pool.clone()),
            SqliteCardRepository::new(pool.clone()),
            SqliteAutomationLogRepository::new(pool.clone()),
        )
        .with_config(config.engine_config()),
    );

    match cli.command {
        Command::Rules { board } => {
            let rules = rule_repo.find_by_board(&BoardId::from(board)).await?;
            print_json(&rules)
        }
        Command::AddRule {
            board,
            trigger,
            list,
            actions,
        } => {
            let rule = actions
                .into_iter()
                .fold(
                    AutomationRule::builder()
                        .board_id(board)
                        .trigger(Trigger::from_parts(trigger.into(), list)),
                    |builder, action| builder.action(action),
                )
                .build()?;
            let rule = rule_repo.create(rule).await?;
            tracing::info!(rule_id = %rule.id, trigger = %rule.trigger, "automation rule created");
            print_json(&rule)
        }
        Command::DeleteRule { rule } => {
            let rule_id = AutomationRuleId::from(rule);
            rule_repo.delete(&rule_id).await?;
            tracing::info!(%rule_id, "automation rule deleted");
            Ok(())
        }
        Command::Logs { board, limit } => {
            let limit = limit.unwrap_or(config.engine.log_limit);
            let logs = log_repo.find_by_board(&BoardId::from(board), limit).await?;
            print_json(&logs)
        }
        Command::Trigger {
            board,
            kind,
            list,
            card,
        } => {
            let event = TriggerEvent::new(
                BoardId::from(board),
                kind.into(),
                ListId::from(list),
                CardId::from(card),
            );
            let report = engine.process_trigger(&event).await;
            print_json(&report)
        }
        Command::CreateCard { board, list, title } => {
            let card = Card::builder()
                .board_id(board)
                .list_id(list)
                .title(title)
                .build()?;
            let card_id = card.id.clone();
            run_card_command(
                &engine,
                SqliteCardRepository::new(pool.clone()),
                config.engine.queue_capacity,
                |service| async move { service.create_card(card).await.map(|_| ()) },
            )
            .await?;
            print_card(&card_repo, &card_id).await
        }
        Command::MoveCard { card, list } => {
            let card_id = CardId::from(card);
            let moved_id = card_id.clone();
            run_card_command(
                &engine,
                SqliteCardRepository::new(pool.clone()),
                config.engine.queue_capacity,
                |service| async move {
                    service
                        .move_card(&moved_id, &ListId::from(list))
                        .await
                        .map(|_| ())
                },
            )
            .await?;
            print_card(&card_repo, &card_id).await
        }
    }
}

/// Run a card mutation through a [`CardService`] wired to a fresh dispatcher,
/// then wait for the triggers it fired to be processed.
async fn run_card_command<F, Fut>(
    engine: &Arc<Engine>,
    card_repo: SqliteCardRepository,
    queue_capacity: usize,
    command: F,
) -> anyhow::Result<()>
where
    F: FnOnce(CardService<SqliteCardRepository, AutomationDispatcher>) -> Fut,
    Fut: Future<Output = Result<(), KanbanError>>,
{
    let (dispatcher, worker) = AutomationDispatcher::spawn(Arc::clone(engine), queue_capacity);
    let result = command(CardService::new(card_repo, dispatcher)).await;

    // the service owned the last handle; the worker drains and exits
    worker.await.context("automation worker failed")?;
    result.map_err(Into::into)
}

async fn print_card(cards: &SqliteCardRepository, card_id: &CardId) -> anyhow::Result<()> {
    let card = cards
        .get_by_id(card_id)
        .await?
        .ok_or_else(|| NotFoundError {
            entity: "Card",
            id: card_id.to_string(),
        })?;
    print_json(&card)
}
