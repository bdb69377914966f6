//! Replay backend
//!
//! Stands in for a live pose model by replaying recorded classifier output.
//! The model folder must hold a Teachable-Machine style `metadata.json`
//! with the class labels; the replay file holds one JSON array of
//! `{"className", "probability"}` objects per frame.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::backend::{
    Camera, CameraSettings, ClassifierBackend, ClassifierError, Frame, PoseData, PoseModel,
    Prediction,
};

#[derive(Debug, Deserialize)]
struct Metadata {
    labels: Vec<String>,
}

/// Backend that replays a recorded prediction file
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    replay_path: PathBuf,
}

impl ReplayBackend {
    pub fn new(replay_path: PathBuf) -> Self {
        Self { replay_path }
    }
}

/// Recorded predictions, one entry per camera frame
#[derive(Debug)]
pub struct ReplayModel {
    frames: Vec<Vec<Prediction>>,
}

/// Camera that only counts frames
#[derive(Debug)]
pub struct ReplayCamera {
    frame: Frame,
    ready: bool,
    playing: bool,
}

fn load_error(path: &Path, reason: impl ToString) -> ClassifierError {
    ClassifierError::Load {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

fn parse_replay(path: &Path, contents: &str) -> Result<Vec<Vec<Prediction>>, ClassifierError> {
    let mut frames = Vec::new();
    for (n, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let predictions: Vec<Prediction> = serde_json::from_str(line)
            .map_err(|e| load_error(path, format!("line {}: {}", n + 1, e)))?;
        frames.push(predictions);
    }
    if frames.is_empty() {
        return Err(load_error(path, "replay file has no frames"));
    }
    Ok(frames)
}

#[async_trait]
impl ClassifierBackend for ReplayBackend {
    type Model = ReplayModel;
    type Camera = ReplayCamera;

    async fn load(&self, model_dir: &Path) -> Result<ReplayModel, ClassifierError> {
        let metadata_path = model_dir.join("metadata.json");
        let metadata = tokio::fs::read_to_string(&metadata_path)
            .await
            .map_err(|e| load_error(&metadata_path, e))?;
        let metadata: Metadata =
            serde_json::from_str(&metadata).map_err(|e| load_error(&metadata_path, e))?;

        let contents = tokio::fs::read_to_string(&self.replay_path)
            .await
            .map_err(|e| load_error(&self.replay_path, e))?;
        let frames = parse_replay(&self.replay_path, &contents)?;

        for prediction in frames.iter().flatten() {
            if !metadata.labels.contains(&prediction.class_name) {
                warn!(class = %prediction.class_name, "replayed class not in model labels");
            }
        }

        info!(
            labels = ?metadata.labels,
            frames = frames.len(),
            replay = ?self.replay_path,
            "replay model loaded"
        );
        Ok(ReplayModel { frames })
    }

    fn camera(&self, settings: CameraSettings) -> ReplayCamera {
        ReplayCamera {
            frame: Frame {
                width: settings.width,
                height: settings.height,
                flipped: settings.flip,
                ..Frame::default()
            },
            ready: false,
            playing: false,
        }
    }
}

#[async_trait]
impl PoseModel for ReplayModel {
    async fn estimate_pose(&mut self, frame: &Frame) -> Result<PoseData, ClassifierError> {
        if frame.sequence == 0 {
            return Err(ClassifierError::Estimate("no frame captured yet".into()));
        }
        Ok(PoseData {
            frame: frame.sequence,
        })
    }

    // Holds the last recorded frame once the replay runs out.
    async fn predict(&mut self, pose: &PoseData) -> Result<Vec<Prediction>, ClassifierError> {
        let last = self.frames.len().saturating_sub(1);
        let index = (pose.frame.saturating_sub(1) as usize).min(last);
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| ClassifierError::Predict("empty replay".into()))
    }
}

#[async_trait]
impl Camera for ReplayCamera {
    async fn setup(&mut self) -> Result<(), ClassifierError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(ClassifierError::CameraSetup(format!(
                "invalid frame size {}x{}",
                self.frame.width, self.frame.height
            )));
        }
        self.ready = true;
        debug!(
            width = self.frame.width,
            height = self.frame.height,
            flipped = self.frame.flipped,
            "replay camera ready"
        );
        Ok(())
    }

    async fn play(&mut self) -> Result<(), ClassifierError> {
        if !self.ready {
            return Err(ClassifierError::CameraPlay("camera not set up".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn update(&mut self) {
        if self.playing {
            self.frame.sequence += 1;
        }
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}
