//! Pose classifier capability
//!
//! The model and the camera come from outside the crate. A backend loads a
//! model from a model folder and hands out a camera; the bridge only ever
//! sees these traits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Errors from the classifier or its camera
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("failed to load model from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("camera setup failed: {0}")]
    CameraSetup(String),

    #[error("camera failed to start: {0}")]
    CameraPlay(String),

    #[error("pose estimation failed: {0}")]
    Estimate(String),

    #[error("prediction failed: {0}")]
    Predict(String),

    #[error("classifier setup aborted: {0}")]
    Aborted(String),
}

/// One class probability from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "className")]
    pub class_name: String,
    pub probability: f32,
}

#[cfg(test)]
impl Prediction {
    pub fn new(class_name: &str, probability: f32) -> Self {
        Self {
            class_name: class_name.to_string(),
            probability,
        }
    }
}

/// Camera frame buffer
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Incremented on every camera update
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub flipped: bool,
}

/// Pose estimated from a frame
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseData {
    /// Sequence number of the source frame
    pub frame: u64,
}

/// How the camera should capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub flip: bool,
}

impl CameraSettings {
    pub fn square(size: u32, flip: bool) -> Self {
        Self {
            width: size,
            height: size,
            flip,
        }
    }
}

#[async_trait]
pub trait PoseModel: Send + 'static {
    async fn estimate_pose(&mut self, frame: &Frame) -> Result<PoseData, ClassifierError>;

    async fn predict(&mut self, pose: &PoseData) -> Result<Vec<Prediction>, ClassifierError>;
}

#[async_trait]
pub trait Camera: Send + 'static {
    async fn setup(&mut self) -> Result<(), ClassifierError>;

    async fn play(&mut self) -> Result<(), ClassifierError>;

    /// Grab the next frame into the buffer
    fn update(&mut self);

    fn frame(&self) -> &Frame;
}

/// Source of models and cameras
#[async_trait]
pub trait ClassifierBackend: Send + Sync + 'static {
    type Model: PoseModel;
    type Camera: Camera;

    async fn load(&self, model_dir: &Path) -> Result<Self::Model, ClassifierError>;

    fn camera(&self, settings: CameraSettings) -> Self::Camera;
}

/// A loaded model with a running camera
pub struct Session<M, C> {
    pub model: M,
    pub camera: C,
}

/// Load the model, then set up and start the camera
pub async fn initialize<B: ClassifierBackend>(
    backend: Arc<B>,
    model_dir: PathBuf,
    settings: CameraSettings,
) -> Result<Session<B::Model, B::Camera>, ClassifierError> {
    debug!(?model_dir, "loading pose model");
    let model = backend.load(&model_dir).await?;

    let mut camera = backend.camera(settings);
    camera.setup().await?;
    camera.play().await?;

    info!(
        width = settings.width,
        height = settings.height,
        flip = settings.flip,
        "pose model loaded and camera started"
    );

    Ok(Session { model, camera })
}


#[cfg(test)]
mod tests {
    use super::fake::{FailAt, FakeBackend};
    use super::*;

    fn settings() -> CameraSettings {
        CameraSettings::square(224, true)
    }

    #[tokio::test]
    async fn test_initialize_success() {
        let backend = Arc::new(FakeBackend::new(FailAt::Nowhere));
        let session = initialize(backend, PathBuf::from("./my_model/"), settings())
            .await
            .unwrap();
        let frame = session.camera.frame();
        assert_eq!((frame.width, frame.height), (224, 224));
        assert!(frame.flipped);
    }

    #[tokio::test]
    async fn test_initialize_reports_each_failure() {
        for (fail_at, expected) in [
            (FailAt::Load, "failed to load model"),
            (FailAt::Setup, "camera setup failed"),
            (FailAt::Play, "camera failed to start"),
        ] {
            let backend = Arc::new(FakeBackend::new(fail_at));
            let err = initialize(backend, PathBuf::from("./my_model/"), settings())
                .await
                .err()
                .unwrap();
            assert!(err.to_string().starts_with(expected), "{}", err);
        }
    }

    #[test]
    fn test_prediction_wire_name() {
        let p: Prediction =
            serde_json::from_str(r#"{"className":"Sporten","probability":0.75}"#).unwrap();
        assert_eq!(p, Prediction::new("Sporten", 0.75));
    }
}
