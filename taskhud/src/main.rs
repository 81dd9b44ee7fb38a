//! `TaskHUD`: active-task timer from the terminal.
//!
//! Talks to the task API, applies one timer transition, and prints the
//! resulting timer line. `watch` stays attached, re-checking the armed
//! target and printing updates until interrupted. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/taskhud/config.toml`).
//!
//! ```bash
//! # Show the timer for task 42
//! cargo run --bin taskhud -- --task-id 42
//!
//! # Start logging, then arm a 25 minute target and watch it
//! cargo run --bin taskhud -- --task-id 42 start
//! cargo run --bin taskhud -- --task-id 42 pomodoro
//! cargo run --bin taskhud -- --task-id 42 watch
//!
//! # Or via environment variables
//! TASKHUD_API_URL=https://tasks.example.com TASKHUD_TASK=42 cargo run -- watch
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskhud::clock::{Clock, SystemClock};
use taskhud::config::{CliArgs, Command, HudConfig};
use taskhud::notify::Notifier;
use taskhud::store::{HttpTaskStore, StoreError, TaskStore};
use taskhud::timer::{HudEvent, TimerController, TimerError};
use taskhud_proto::TaskId;

#[cfg(feature = "desktop")]
type HostNotifier = taskhud::notify::desktop::DesktopNotifier;
#[cfg(not(feature = "desktop"))]
type HostNotifier = taskhud::notify::LogNotifier;

/// Errors that end the process with a failure status.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("no task given (use --task-id or TASKHUD_TASK)")]
    MissingTaskId,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Timer(#[from] TimerError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > env > defaults).
    let config = match HudConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            HudConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "taskhud failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging to stderr, or to a file when `file_path` is given.
///
/// A `file_path` without a usable file name falls back to stderr.
///
/// Returns a [`WorkerGuard`] for file logging that must be held until
/// shutdown to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let target = file_path.map(|path| (path, log_file_target(path)));
    let Some((_, Some((log_dir, file_name)))) = target else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        if let Some((path, None)) = target {
            eprintln!(
                "Warning: cannot log to {}: no usable file name; logging to stderr",
                path.display()
            );
        }
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Splits a log file path into its directory and UTF-8 file name.
///
/// Returns `None` for paths without a usable file name (`..`, `/`, or a
/// non-UTF-8 name).
fn log_file_target(path: &Path) -> Option<(&Path, &str)> {
    let file_name = path.file_name()?.to_str()?;
    let log_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((log_dir, file_name))
}

async fn run(cli: &CliArgs, config: &HudConfig) -> Result<(), AppError> {
    let task_id = cli
        .task_id
        .as_deref()
        .map(TaskId::parse)
        .ok_or(AppError::MissingTaskId)?;

    let store = HttpTaskStore::new(&config.api_url, config.request_timeout)?;
    tracing::info!(task_id = %task_id, api = %store.endpoint(), "loading task");
    let record = store.fetch(&task_id).await?;

    let (controller, mut events) = TimerController::new(
        store,
        HostNotifier::default(),
        SystemClock,
        config.to_controller_config(),
    );
    controller.attach(record);

    let command = cli.command.unwrap_or_default();
    let outcome = match command {
        Command::Status => Ok(()),
        Command::Start => controller.start().await.map(drop),
        Command::Pause => controller.pause().await.map(drop),
        Command::Stop => controller.stop().await.map(drop),
        Command::Reset => controller.reset().await.map(drop),
        Command::Pomodoro => controller.arm_target().await.map(drop),
        Command::Watch => {
            watch(&controller, &mut events, config, tokio::signal::ctrl_c()).await;
            Ok(())
        }
    };

    if command != Command::Watch {
        print_status(&controller);
    }
    controller.detach();
    outcome.map_err(AppError::from)
}

fn print_status<S, N, C>(controller: &TimerController<S, N, C>)
where
    S: TaskStore,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    if let Some(snapshot) = controller.snapshot() {
        println!("{snapshot}");
    }
}

/// Print the timer on every event and every recheck period until `shutdown`
/// resolves.
///
/// `shutdown` is created once and polled across iterations, so a signal that
/// arrives while an event is being handled is not lost.
async fn watch<S, N, C>(
    controller: &TimerController<S, N, C>,
    events: &mut mpsc::Receiver<HudEvent>,
    config: &HudConfig,
    shutdown: impl Future,
) where
    S: TaskStore,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    print_status(controller);
    let mut ticker = tokio::time::interval(config.recheck_interval);
    ticker.tick().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted; detaching");
                break;
            }
            Some(event) = events.recv() => match event {
                HudEvent::TargetReached { minutes, .. } => {
                    println!("Target reached: {minutes} minutes logged");
                }
                HudEvent::RecordUpdated(_) => print_status(controller),
                HudEvent::PatchFailed { action, reason } => {
                    eprintln!("{action} failed: {reason}");
                }
            },
            _ = ticker.tick() => print_status(controller),
        }
    }
}
