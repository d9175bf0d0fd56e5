//! Command-line interface for the Ecole Directe poller.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ecoledirecte_client::EdClient;
use ecoledirecte_coordinator::{Coordinator, Poller};
use ecoledirecte_core::config::{defaults, env_vars};
use ecoledirecte_core::{Config, EventBus};
use ecoledirecte_notify::Dispatcher;

/// Ecole Directe poller - fetch school data and report what is new.
#[derive(Parser, Debug)]
#[command(name = "ecoledirecte")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Configuration file.
    #[arg(short, long, global = true, default_value = defaults::CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Poll on the configured interval until Ctrl-C.
    Run,
    /// Refresh once and print the snapshot as JSON.
    Once,
    /// Log in once and report whether the credentials are accepted.
    Check,
    /// Mark a homework as done (or not done with --undo).
    HomeworkDone {
        /// Student id.
        #[arg(long)]
        student: i64,
        /// Homework id.
        #[arg(long)]
        homework: i64,
        /// Mark as not done instead.
        #[arg(long)]
        undo: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    match args.command {
        Command::Run => run(config).await,
        Command::Once => once(config).await,
        Command::Check => check(config).await,
        Command::HomeworkDone {
            student,
            homework,
            undo,
        } => homework_done(config, student, homework, !undo).await,
    }
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Client plus a dispatcher forwarding its events to the configured sinks.
///
/// The dispatcher task ends once the client and everything built on it are
/// dropped; await it with [`flush`] before exiting.
fn connect(config: Config) -> Result<(EdClient, JoinHandle<()>)> {
    let events = EventBus::new();
    let dispatcher = Dispatcher::from_config(&config.notify, &config.qcm_file.display().to_string())
        .context("Invalid notification settings")?;
    let handle = dispatcher.spawn(&events);
    Ok((EdClient::new(config, events)?, handle))
}

/// Wait until the dispatcher has delivered every queued event.
async fn flush(dispatcher: JoinHandle<()>) {
    if let Err(e) = dispatcher.await {
        warn!(category = "notify", error = %e, "Dispatcher task failed");
    }
}

async fn run(config: Config) -> Result<()> {
    let period = config.refresh_period();
    let (client, dispatcher) = connect(config)?;
    let poller = Poller::new(Coordinator::new(client)?, period);

    poller.start().await;
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!(category = "poll", "Shutting down");
    poller.stop().await;
    drop(poller);
    flush(dispatcher).await;
    Ok(())
}

async fn once(config: Config) -> Result<()> {
    let (client, dispatcher) = connect(config)?;
    let mut coordinator = Coordinator::new(client)?;
    let output = match coordinator.refresh().await {
        Ok(snapshot) => serde_json::to_string_pretty(snapshot).map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };
    drop(coordinator);
    flush(dispatcher).await;
    println!("{}", output?);
    Ok(())
}

async fn check(config: Config) -> Result<()> {
    let username = config.username.clone();
    let (client, dispatcher) = connect(config)?;
    let accepted = client.check_credentials().await;
    drop(client);
    flush(dispatcher).await;
    if accepted? {
        println!("Credentials accepted for {}", username);
        Ok(())
    } else {
        bail!("Credentials rejected for {}", username)
    }
}

async fn homework_done(config: Config, student_id: i64, homework_id: i64, done: bool) -> Result<()> {
    let (client, dispatcher) = connect(config)?;
    let result = mark_homework(&client, student_id, homework_id, done).await;
    drop(client);
    flush(dispatcher).await;
    let name = result?;
    println!(
        "Homework {} of {} marked as {}",
        homework_id,
        name,
        if done { "done" } else { "not done" }
    );
    Ok(())
}

/// Log in and flag the homework; returns the student's name.
async fn mark_homework(client: &EdClient, student_id: i64, homework_id: i64, done: bool) -> Result<String> {
    let mut session = client.login().await?;

    let Some(student) = session.students.iter().find(|s| s.id == student_id) else {
        let known: Vec<String> = session
            .students
            .iter()
            .map(|s| format!("{} ({})", s.full_name(), s.id))
            .collect();
        bail!("No student {} on this account, known: {}", student_id, known.join(", "));
    };
    let name = student.full_name();

    client
        .set_homework_done(&mut session, student_id, homework_id, done)
        .await?;
    Ok(name)
}
