//! Command-line host for the pain tracker core.
//!
//! # Responsibility
//! - Wire `CoreConfig` to a store, the entry service and a notification queue.
//! - Expose add/list/summary/export over a local SQLite file.
//!
//! # Invariants
//! - Every command hydrates the record before reading or writing.
//! - `add` waits for its write so the process never exits with a queued entry.

mod args;

use args::{Cli, Commands, ExportFormat};
use chrono::Utc;
use clap::Parser;
use log::warn;
use pain_tracker_core::export::{export_csv, export_json};
use pain_tracker_core::insights::{narrative, summarize};
use pain_tracker_core::{
    init_logging, CandidateEntry, CoreConfig, EntryServiceError, NotificationQueue,
    PainEntryService, SystemClock,
};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Ping) {
        println!("pain_tracker_core ping={}", pain_tracker_core::ping());
        println!(
            "pain_tracker_core version={}",
            pain_tracker_core::core_version()
        );
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: cannot start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> CliResult<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::from_file(path)?,
        None => CoreConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }
    if config.db_path.is_none() {
        eprintln!("note: no database configured; entries last only for this run");
    }

    let notifications = Arc::new(NotificationQueue::new());
    let mut service = PainEntryService::new(
        config.open_repository()?,
        notifications.clone(),
        Arc::new(SystemClock),
    )?;

    if let Err(err) = service.load_entries().await {
        warn!("event=cli_load module=cli status=error error={err}");
    }
    print_notifications(&notifications);

    let outcome = execute(&mut service, cli.command).await;
    print_notifications(&notifications);
    service.shutdown();
    outcome
}

async fn execute(service: &mut PainEntryService, command: Commands) -> CliResult<()> {
    match command {
        Commands::Add {
            pain,
            locations,
            symptoms,
            sleep,
            mood,
            notes,
        } => {
            let mut candidate = CandidateEntry::with_pain(pain)
                .locations(locations)
                .symptoms(symptoms);
            if let (Some(sleep), Some(mood)) = (sleep, mood) {
                candidate = candidate.quality_of_life(sleep, mood);
            }
            if let Some(notes) = notes {
                candidate = candidate.notes(notes);
            }
            add(service, candidate).await
        }
        Commands::AddJson { json } => add(service, CandidateEntry::from_json(&json)?).await,
        Commands::List { limit } => {
            let entries = service.entries_by_recency();
            let shown = limit.unwrap_or(entries.len());
            for entry in entries.iter().take(shown) {
                println!(
                    "{}  {}  pain={}  sleep={}  mood={}  {}",
                    entry.id,
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.pain(),
                    entry.quality_of_life.sleep_quality,
                    entry.quality_of_life.mood_impact,
                    entry.baseline_data.locations.join(", ")
                );
            }
            if entries.is_empty() {
                println!("no entries");
            }
            Ok(())
        }
        Commands::Summary => {
            let entries = service.entries_chronological();
            if let Some(summary) = summarize(&entries) {
                println!("entries: {}", summary.entry_count);
                println!(
                    "pain: avg {:.1}, min {}, max {}",
                    summary.average_pain, summary.min_pain, summary.max_pain
                );
                println!(
                    "sleep quality avg {:.1}, mood impact avg {:.1}",
                    summary.average_sleep_quality, summary.average_mood_impact
                );
            }
            for line in narrative(&entries, Utc::now().date_naive()) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Export { format } => {
            let entries = service.entries_chronological();
            match format {
                ExportFormat::Json => println!("{}", export_json(&entries)?),
                ExportFormat::Csv => print!("{}", export_csv(&entries)),
            }
            Ok(())
        }
        Commands::Ping => Ok(()),
    }
}

async fn add(service: &mut PainEntryService, candidate: CandidateEntry) -> CliResult<()> {
    let added = service.add_entry(candidate)?;
    println!("added entry {} (pain {})", added.entry.id, added.entry.pain());
    match added.confirm().await {
        Ok(_) => Ok(()),
        // Already reported through the notification queue.
        Err(EntryServiceError::PersistenceWrite(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn print_notifications(queue: &NotificationQueue) {
    for notification in queue.drain() {
        eprintln!(
            "[{}] {}: {}",
            notification.level.as_str(),
            notification.title,
            notification.message
        );
    }
}
