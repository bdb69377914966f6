//! resty: an animated face that reacts to exercise and rest
//!
//! The face stays locked until the unlock slider is pushed past its
//! threshold. It then starts a pose classifier and:
//! - cheers the user on with rotating lines while they exercise
//! - walks them through a few questions and tips while they rest
//!
//! Commands are read from stdin (`slide <0-100>`, `answer <n>`, `quit`);
//! the face is drawn on stdout and logs go to stderr.

mod app;
mod classifier;
mod config;
mod dialogue;
mod display;
mod events;
mod input;
mod lifecycle;
mod unlock;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::classifier::ReplayBackend;
use crate::config::Config;
use crate::display::TerminalSurface;
use crate::events::FaceEvent;
use crate::lifecycle::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "resty starting");

    let config = Config::load().context("failed to load configuration")?;
    info!(
        model_dir = ?config.model_dir,
        replay = ?config.replay_path,
        threshold = config.threshold,
        "configuration loaded"
    );

    let shutdown = ShutdownSignal::new();

    // Dialogue and app -> event log
    let (event_tx, _event_rx) = broadcast::channel::<FaceEvent>(64);

    let log_task = config.event_log.clone().map(|path| {
        let rx = event_tx.subscribe();
        info!(?path, "writing event log");
        tokio::spawn(async move {
            if let Err(e) = events::write_log(&path, rx).await {
                error!(?e, "event log failed");
            }
        })
    });

    // Stdin -> app
    let (input_tx, input_rx) = mpsc::channel(32);
    input::spawn_stdin_reader(input_tx).context("failed to start input reader")?;

    let backend = Arc::new(ReplayBackend::new(config.replay_path.clone()));
    let surface = TerminalSurface::new(std::io::stdout());
    let mut app = App::new(&config, backend, surface, event_tx);

    app.run(input_rx, shutdown.wait()).await;

    // Dropping the app closes the event channel so the log can finish.
    drop(app);
    if let Some(task) = log_task {
        let _ = task.await;
    }

    info!("resty stopped");

    Ok(())
}
