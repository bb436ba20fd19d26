use std::fs;

use anyhow::Context;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use alertbot::cli::{Cli, Commands, Toggle};
use alertbot::config::Config;
use alertbot::domain::Category;
use alertbot::errors::AlertError;
use alertbot::services::{
    AdminService, AlertSink, Caller, DedupLedger, DiscordMessenger, Dispatcher, DryRunSink,
    PollService, SnapshotService, SubscribeOutcome, SubscriptionService, UnsubscribeOutcome,
};
use alertbot::sources::{HttpFeedFetcher, SourceRegistry};
use alertbot::storage::sqlite::{
    SqliteChannelBindingRepository, SqliteStorage, SqliteSubscriberRepository,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(&config)?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;

    match cli.command {
        Commands::Run { once, dry_run } => cmd_run(storage, &config, once, dry_run).await,
        Commands::Subscribe {
            user_id,
            categories,
        } => cmd_subscribe(storage, user_id, &categories),
        Commands::Unsubscribe { user_id } => cmd_unsubscribe(storage, user_id),
        Commands::Prefs {
            user_id,
            category,
            state,
        } => cmd_prefs(storage, user_id, category, state),
        Commands::Bind {
            category,
            channel_id,
            caller,
        } => cmd_bind(storage, &config, category, Some(channel_id), caller),
        Commands::Unbind { category, caller } => cmd_bind(storage, &config, category, None, caller),
        Commands::List => cmd_list(storage),
        Commands::Sources => cmd_sources(),
        Commands::Import { path } => cmd_import(storage, &path),
        Commands::Export { output } => cmd_export(storage, output),
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn cmd_run(
    storage: SqliteStorage,
    config: &Config,
    once: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let sink: Box<dyn AlertSink> = if dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(Dispatcher::new(
            SqliteSubscriberRepository::new(storage.clone()),
            SqliteChannelBindingRepository::new(storage),
            DiscordMessenger::new(config)?,
        ))
    };

    let sources = SourceRegistry::new()?.into_sources();
    let fetcher = HttpFeedFetcher::new(config.fetch_timeout)?;
    let ledger = DedupLedger::new(config.ledger_capacity);
    let mut poller = PollService::new(fetcher, sources, ledger, config.entries_per_cycle);

    println!("Polling {} sources...\n", poller.sources().len());

    if once {
        let report = poller.run_cycle(sink.as_ref()).await;
        println!(
            "Cycle complete: {} new alerts, {} delivered, {} failed, {} of {} sources unreachable.",
            report.new_entries,
            report.delivered,
            report.failed,
            report.sources_failed,
            report.sources_polled
        );
    } else {
        let cycles = poller
            .run(sink.as_ref(), config.poll_interval, shutdown_signal())
            .await;
        println!("Stopped after {} poll cycles.", cycles);
    }

    Ok(())
}

fn cmd_subscribe(storage: SqliteStorage, user_id: u64, categories: &[Category]) -> anyhow::Result<()> {
    let service = SubscriptionService::new(SqliteSubscriberRepository::new(storage));

    match service.subscribe(user_id, categories)? {
        SubscribeOutcome::Subscribed => {
            let names: Vec<&str> = match categories {
                [] => Category::ALL.iter().map(Category::as_str).collect(),
                some => some.iter().map(Category::as_str).collect(),
            };
            println!("Subscribed user {} ({}).", user_id, names.join(", "));
        }
        SubscribeOutcome::AlreadySubscribed => {
            println!("User {} is already subscribed.", user_id);
        }
    }

    Ok(())
}

fn cmd_unsubscribe(storage: SqliteStorage, user_id: u64) -> anyhow::Result<()> {
    let service = SubscriptionService::new(SqliteSubscriberRepository::new(storage));

    match service.unsubscribe(user_id)? {
        UnsubscribeOutcome::Unsubscribed => println!("Unsubscribed user {}.", user_id),
        UnsubscribeOutcome::NotSubscribed => println!("User {} is not subscribed.", user_id),
    }

    Ok(())
}

fn cmd_prefs(
    storage: SqliteStorage,
    user_id: u64,
    category: Category,
    state: Toggle,
) -> anyhow::Result<()> {
    let service = SubscriptionService::new(SqliteSubscriberRepository::new(storage));

    match service.set_preference(user_id, category, state.enabled()) {
        Ok(subscriber) => {
            let flags: Vec<String> = subscriber
                .preferences
                .iter()
                .map(|(c, on)| format!("{}={}", c, if *on { "on" } else { "off" }))
                .collect();
            println!("User {}: {}", user_id, flags.join(", "));
            Ok(())
        }
        Err(AlertError::SubscriberNotFound(_)) => {
            println!("User {} is not subscribed.", user_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_bind(
    storage: SqliteStorage,
    config: &Config,
    category: Category,
    channel_id: Option<u64>,
    caller_id: u64,
) -> anyhow::Result<()> {
    let service = AdminService::new(SqliteChannelBindingRepository::new(storage));
    let caller = Caller::from_config(caller_id, config);

    let result = match channel_id {
        Some(channel_id) => service
            .bind_channel(&caller, category, channel_id)
            .map(|()| format!("Bound {} alerts to channel {}.", category, channel_id)),
        None => service.unbind_channel(&caller, category).map(|removed| {
            if removed {
                format!("Unbound {} alerts.", category)
            } else {
                format!("No channel was bound for {} alerts.", category)
            }
        }),
    };

    match result {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(AlertError::Unauthorized(reason)) => {
            println!("Rejected: {}", reason);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_list(storage: SqliteStorage) -> anyhow::Result<()> {
    let subscriptions = SubscriptionService::new(SqliteSubscriberRepository::new(storage.clone()));
    let admin = AdminService::new(SqliteChannelBindingRepository::new(storage));

    let bindings = admin.bindings()?;
    if bindings.is_empty() {
        println!("No channel bindings.");
    } else {
        println!("Channel bindings:\n");
        for binding in bindings {
            println!("  {} -> channel {}", binding.category, binding.channel_id);
        }
    }
    println!();

    let subscribers = subscriptions.list()?;
    if subscribers.is_empty() {
        println!("No subscribers.");
        return Ok(());
    }

    println!("Subscribers ({}):\n", subscribers.len());
    for subscriber in subscribers {
        let wanted: Vec<&str> = Category::ALL
            .iter()
            .filter(|c| subscriber.wants(**c))
            .map(Category::as_str)
            .collect();
        println!(
            "  {} [{}] since {}",
            subscriber.user_id,
            wanted.join(", "),
            subscriber.created_at.as_deref().unwrap_or("?")
        );
    }

    Ok(())
}

fn cmd_sources() -> anyhow::Result<()> {
    let registry = SourceRegistry::new()?;

    println!("Configured sources:\n");
    for source in registry.sources() {
        println!("  {} [{}]", source.name, source.category);
        println!("    URL: {}", source.endpoint);
    }

    Ok(())
}

fn cmd_import(storage: SqliteStorage, path: &str) -> anyhow::Result<()> {
    let service = SnapshotService::new(
        SqliteSubscriberRepository::new(storage.clone()),
        SqliteChannelBindingRepository::new(storage),
    );

    println!("Importing snapshot from {}...\n", path);

    let result = service.import_file(path)?;

    if !result.added.is_empty() {
        println!("Added {} subscribers:", result.added.len());
        for user_id in &result.added {
            println!("  + {}", user_id);
        }
        println!();
    }

    if !result.duplicates.is_empty() {
        println!("Skipped {} existing subscribers:", result.duplicates.len());
        for user_id in &result.duplicates {
            println!("  - {}", user_id);
        }
        println!();
    }

    if !result.invalid.is_empty() {
        println!("Ignored {} invalid entries:", result.invalid.len());
        for (raw, reason) in &result.invalid {
            println!("  ! {}: {}", raw, reason);
        }
        println!();
    }

    println!(
        "Import complete: {} added, {} duplicates, {} invalid, {} channel bindings",
        result.added.len(),
        result.duplicates.len(),
        result.invalid.len(),
        result.bindings.len()
    );

    Ok(())
}

fn cmd_export(storage: SqliteStorage, output: Option<String>) -> anyhow::Result<()> {
    let service = SnapshotService::new(
        SqliteSubscriberRepository::new(storage.clone()),
        SqliteChannelBindingRepository::new(storage),
    );
    let json = service.export_json()?;

    match output {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("writing {}", path))?;
            println!("Exported snapshot to {}", path);
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
