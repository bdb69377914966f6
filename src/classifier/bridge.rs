//! Activity classifier bridge
//!
//! Dormant until the face is unlocked. Once the model and camera are up,
//! the session moves into its own poll task: every animation frame it runs
//! the model and sends any resulting mode request over a channel, so a slow
//! model never holds up the event loop. A failed setup leaves the bridge
//! dormant for good.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::dialogue::Mode;

use super::backend::{Camera, ClassifierBackend, ClassifierError, PoseModel, Session};
use super::decision::{decide, LabelRules};

/// Lifecycle of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    /// Waiting for the unlock
    Dormant,
    /// Model and camera are being set up
    Initializing,
    /// Polling every frame
    Active,
    /// Setup failed; never retried
    Failed,
}

/// Hands classifier output to the event loop as mode requests
pub struct ActivityBridge<B: ClassifierBackend> {
    status: BridgeStatus,
    rules: LabelRules,
    threshold: f32,
    frame_interval: Duration,
    requests: mpsc::Sender<Mode>,
    poller: Option<JoinHandle<()>>,
    _backend: std::marker::PhantomData<fn() -> B>,
}

impl<B: ClassifierBackend> ActivityBridge<B> {
    /// Create a dormant bridge and the receiver its mode requests arrive on
    pub fn new(
        rules: LabelRules,
        threshold: f32,
        frame_interval: Duration,
    ) -> (Self, mpsc::Receiver<Mode>) {
        let (requests, rx) = mpsc::channel(8);
        let bridge = Self {
            status: BridgeStatus::Dormant,
            rules,
            threshold,
            frame_interval,
            requests,
            poller: None,
            _backend: std::marker::PhantomData,
        };
        (bridge, rx)
    }

    #[cfg(test)]
    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    /// Mark setup as started; false unless the bridge was dormant
    pub fn begin(&mut self) -> bool {
        if self.status != BridgeStatus::Dormant {
            debug!(status = ?self.status, "classifier setup already attempted");
            return false;
        }
        self.status = BridgeStatus::Initializing;
        true
    }

    /// Take the outcome of setup
    ///
    /// On success the session starts polling in its own task. On failure
    /// the bridge stays off and the error is handed back for the caller to
    /// report.
    pub fn finish(
        &mut self,
        result: Result<Session<B::Model, B::Camera>, ClassifierError>,
    ) -> Result<(), ClassifierError> {
        if self.status != BridgeStatus::Initializing {
            warn!(status = ?self.status, "setup finished without being started");
        }

        match result {
            Ok(session) => {
                info!("activity classifier active");
                let poller = Poller {
                    session,
                    rules: self.rules.clone(),
                    threshold: self.threshold,
                };
                self.poller = Some(tokio::spawn(poller.run(
                    self.frame_interval,
                    self.requests.clone(),
                )));
                self.status = BridgeStatus::Active;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "activity classifier setup failed, recognition disabled");
                self.status = BridgeStatus::Failed;
                Err(e)
            }
        }
    }

    /// Stop polling; no further requests are sent
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
            debug!("classifier polling stopped");
        }
    }
}

impl<B: ClassifierBackend> Drop for ActivityBridge<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns a running session and classifies one frame at a time
struct Poller<M, C> {
    session: Session<M, C>,
    rules: LabelRules,
    threshold: f32,
}

impl<M: PoseModel, C: Camera> Poller<M, C> {
    async fn run(mut self, frame_interval: Duration, requests: mpsc::Sender<Mode>) {
        let mut frames = time::interval(frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            frames.tick().await;
            if let Some(mode) = self.classify().await {
                if requests.send(mode).await.is_err() {
                    debug!("mode request channel closed, polling ends");
                    break;
                }
            }
        }
    }

    /// Run one frame of classification
    ///
    /// Returns the mode to request, if any. A failing frame is logged and
    /// skipped.
    async fn classify(&mut self) -> Option<Mode> {
        let session = &mut self.session;
        session.camera.update();
        let pose = match session.model.estimate_pose(session.camera.frame()).await {
            Ok(pose) => pose,
            Err(e) => {
                warn!(error = %e, "skipping frame");
                return None;
            }
        };
        let predictions = match session.model.predict(&pose).await {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!(error = %e, "skipping frame");
                return None;
            }
        };

        let (p_sport, p_rest) = self.rules.scores(&predictions);
        let request = decide(p_sport, p_rest, self.threshold);
        if request.is_some() {
            debug!(frame = pose.frame, p_sport, p_rest, ?request, "classified frame");
        }
        request
    }
}
