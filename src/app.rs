//! The face's event loop
//!
//! A single task owns the unlock gate, the dialogue controller, and the
//! classifier bridge. It multiplexes user input, timer expiries, the
//! classifier setup task and mode requests from the poll task; none of its
//! branches waits on the model.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

use crate::classifier::{
    initialize, ActivityBridge, CameraSettings, ClassifierBackend, ClassifierError,
    LabelRules, Session,
};
use crate::config::Config;
use crate::dialogue::{DialogueController, Mode, Scheduler, Script, TimerFired};
use crate::display::DisplaySurface;
use crate::events::FaceEvent;
use crate::input::InputCommand;
use crate::unlock::UnlockGate;

const WAKE_LINE: &str = "Resty is wakker. Herkenning start...";
const READY_LINE: &str = "Herkenning actief. Beweeg (sport) of rust en kijk wat Resty zegt!";

type SetupResult<B> = Result<
    Session<<B as ClassifierBackend>::Model, <B as ClassifierBackend>::Camera>,
    ClassifierError,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Everything the face needs, driven by [`App::run`]
pub struct App<B: ClassifierBackend, S: DisplaySurface> {
    backend: Arc<B>,
    model_dir: PathBuf,
    camera: CameraSettings,
    gate: UnlockGate,
    dialogue: DialogueController<S>,
    bridge: ActivityBridge<B>,
    setup: JoinSet<SetupResult<B>>,
    timers: mpsc::UnboundedReceiver<TimerFired>,
    requests: mpsc::Receiver<Mode>,
    event_tx: broadcast::Sender<FaceEvent>,
}

impl<B: ClassifierBackend, S: DisplaySurface> App<B, S> {
    pub fn new(
        config: &Config,
        backend: Arc<B>,
        surface: S,
        event_tx: broadcast::Sender<FaceEvent>,
    ) -> Self {
        let (scheduler, timers) = Scheduler::channel();
        let dialogue = DialogueController::new(
            Script::default(),
            config.motivation_interval,
            scheduler,
            surface,
            event_tx.clone(),
        );
        let (bridge, requests) = ActivityBridge::new(
            LabelRules::new(&config.sport_label, &config.rest_label),
            config.threshold,
            config.frame_interval,
        );

        Self {
            backend,
            model_dir: config.model_dir.clone(),
            camera: CameraSettings::square(config.camera_size, config.camera_flip),
            gate: UnlockGate::new(config.unlock_threshold),
            dialogue,
            bridge,
            setup: JoinSet::new(),
            timers,
            requests,
            event_tx,
        }
    }

    #[cfg(test)]
    pub fn dialogue(&self) -> &DialogueController<S> {
        &self.dialogue
    }

    #[cfg(test)]
    pub fn bridge_status(&self) -> crate::classifier::BridgeStatus {
        self.bridge.status()
    }

    #[cfg(test)]
    pub fn is_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    /// Run until `quit`, end of input, or `shutdown` resolves
    pub async fn run<F>(&mut self, mut input: mpsc::Receiver<InputCommand>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!("face running, slide to unlock");

        loop {
            tokio::select! {
                command = input.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command) == Flow::Quit {
                            info!("quit requested");
                            break;
                        }
                    }
                    None => {
                        info!("input closed");
                        break;
                    }
                },

                Some(fired) = self.timers.recv() => self.dialogue.on_timer(fired),

                Some(result) = self.setup.join_next() => self.finish_setup(result),

                Some(mode) = self.requests.recv() => {
                    self.dialogue.set_mode(mode);
                }

                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.setup.abort_all();
        self.bridge.stop();
        self.dialogue.dispose();
    }

    fn handle_command(&mut self, command: InputCommand) -> Flow {
        match command {
            InputCommand::Slide(value) => {
                if self.gate.update(value) {
                    self.unlock();
                }
            }
            InputCommand::Answer(n) => {
                if !self.gate.is_unlocked() {
                    debug!(n, "answer before unlock, ignoring");
                } else {
                    self.dialogue.choose(n.saturating_sub(1));
                }
            }
            InputCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn unlock(&mut self) {
        let _ = self.event_tx.send(FaceEvent::Unlocked);
        self.dialogue.surface_mut().reveal_face();
        self.dialogue.show_status(WAKE_LINE);

        if self.bridge.begin() {
            let backend = Arc::clone(&self.backend);
            let model_dir = self.model_dir.clone();
            let camera = self.camera;
            self.setup.spawn(initialize(backend, model_dir, camera));
            debug!("classifier setup started");
        }
    }

    fn finish_setup(&mut self, result: Result<SetupResult<B>, JoinError>) {
        let result = result.unwrap_or_else(|e| Err(ClassifierError::Aborted(e.to_string())));

        match self.bridge.finish(result) {
            Ok(()) => {
                self.dialogue.show_status(READY_LINE);
                let _ = self.event_tx.send(FaceEvent::RecognitionStarted);
            }
            Err(e) => {
                let line = format!(
                    "Kon de herkenning niet starten. Controleer je modelmap ({}).",
                    self.model_dir.display()
                );
                self.dialogue.show_status(&line);
                let _ = self.event_tx.send(FaceEvent::RecognitionFailed {
                    reason: e.to_string(),
                });
            }
        }
    }
}
