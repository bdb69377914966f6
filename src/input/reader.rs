//! Line reader feeding commands to the event loop
//!
//! Stdin is read on a dedicated thread so a pending read never holds up
//! runtime shutdown.

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::command::InputCommand;

/// Errors from starting the reader
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("failed to spawn input thread: {0}")]
    ThreadSpawn(String),
}

/// Read lines from `reader` until EOF, forwarding parsed commands
///
/// Bad lines are logged and skipped. Returns when the reader is exhausted
/// or the receiver is gone. Must not be called from async context.
pub fn read_commands<R: BufRead>(reader: R, tx: &mpsc::Sender<InputCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(?e, "failed to read input");
                break;
            }
        };

        match line.parse::<InputCommand>() {
            Ok(command) => {
                if tx.blocking_send(command).is_err() {
                    debug!("input receiver gone");
                    return;
                }
            }
            Err(e) => warn!(error = %e, line = %line.trim(), "ignoring input"),
        }
    }
    debug!("input closed");
}

/// Start a thread that reads commands from stdin
///
/// The channel closes when stdin reaches EOF.
pub fn spawn_stdin_reader(tx: mpsc::Sender<InputCommand>) -> Result<(), ReaderError> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            read_commands(stdin.lock(), &tx);
        })
        .map_err(|e| ReaderError::ThreadSpawn(e.to_string()))?;

    info!("reading commands from stdin: slide <0-100>, answer <n>, quit");
    Ok(())
}
