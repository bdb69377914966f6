//! Events module for face activity
//!
//! Provides structured event types for unlocking, recognition setup,
//! mode transitions, and what the bubble shows. Events are broadcast
//! and can be appended to a JSON-lines log.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::warn;

use crate::dialogue::Mode;

/// Events emitted while the face runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FaceEvent {
    /// Unlock slider crossed its threshold
    Unlocked,

    /// Classifier and camera are up, polling begins
    RecognitionStarted,

    /// Classifier or camera setup failed; recognition stays off
    RecognitionFailed { reason: String },

    /// Mode changed
    ModeChanged { from: Mode, to: Mode },

    /// Bubble text replaced
    LineShown { text: String },

    /// Answer buttons shown
    ChoicesShown { labels: Vec<String> },

    /// User picked an answer
    ChoiceSelected { label: String },
}

impl std::fmt::Display for FaceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceEvent::Unlocked => write!(f, "UNLOCKED"),
            FaceEvent::RecognitionStarted => write!(f, "RECOGNITION_STARTED"),
            FaceEvent::RecognitionFailed { reason } => {
                write!(f, "RECOGNITION_FAILED ({})", reason)
            }
            FaceEvent::ModeChanged { from, to } => write!(f, "MODE_CHANGED ({} -> {})", from, to),
            FaceEvent::LineShown { text } => write!(f, "LINE_SHOWN ({})", text),
            FaceEvent::ChoicesShown { labels } => {
                write!(f, "CHOICES_SHOWN ({})", labels.join(", "))
            }
            FaceEvent::ChoiceSelected { label } => write!(f, "CHOICE_SELECTED ({})", label),
        }
    }
}

/// Append every received event to `path` as one JSON object per line
///
/// Runs until the sender side of the channel is dropped.
pub async fn write_log(path: &Path, mut rx: broadcast::Receiver<FaceEvent>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open event log {}", path.display()))?;

    loop {
        match rx.recv().await {
            Ok(event) => {
                let mut line = serde_json::to_vec(&event)?;
                line.push(b'\n');
                file.write_all(&line).await?;
                file.flush().await?;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}
