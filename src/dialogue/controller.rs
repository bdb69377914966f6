//! Dialogue controller
//!
//! Owns the current mode and everything the bubble shows for it: the idle
//! prompt, the rotating motivation lines during sport, and the rest flow of
//! questions and notes during rest. At most one timer per kind is pending,
//! and a mode switch drops both before the new mode starts its own.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::display::DisplaySurface;
use crate::events::FaceEvent;

use super::mode::Mode;
use super::script::{AfterAck, Choice, ChoiceAction, DialogueStep, MotivationCycle, RestFlow, Script};
use super::timer::{Scheduler, TimerFired, TimerHandle, TimerKind};

/// Drives the face's dialogue for the current mode
pub struct DialogueController<S: DisplaySurface> {
    /// Current mode
    mode: Mode,
    idle_prompt: String,
    motivation: MotivationCycle,
    motivation_interval: Duration,
    rest: RestFlow,
    /// Answer buttons currently on screen
    choices: Vec<Choice>,
    scheduler: Scheduler,
    motivation_timer: Option<TimerHandle>,
    rest_timer: Option<TimerHandle>,
    surface: S,
    event_tx: broadcast::Sender<FaceEvent>,
}

impl<S: DisplaySurface> DialogueController<S> {
    /// Create a controller in idle mode; nothing is rendered until asked
    pub fn new(
        script: Script,
        motivation_interval: Duration,
        scheduler: Scheduler,
        surface: S,
        event_tx: broadcast::Sender<FaceEvent>,
    ) -> Self {
        Self {
            mode: Mode::Idle,
            idle_prompt: script.idle_prompt,
            motivation: MotivationCycle::new(script.motivation),
            motivation_interval,
            rest: RestFlow::new(script.rest_flow),
            choices: Vec::new(),
            scheduler,
            motivation_timer: None,
            rest_timer: None,
            surface,
            event_tx,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[cfg(test)]
    pub fn rest_cursor(&self) -> usize {
        self.rest.cursor()
    }

    #[cfg(test)]
    pub fn motivation_index(&self) -> usize {
        self.motivation.index()
    }

    /// Labels of the answer buttons currently shown
    #[cfg(test)]
    pub fn choice_labels(&self) -> Vec<&str> {
        self.choices.iter().map(|c| c.label.as_str()).collect()
    }

    #[cfg(test)]
    pub fn has_pending(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Motivation => self.motivation_timer.is_some(),
            TimerKind::RestFlow => self.rest_timer.is_some(),
        }
    }

    /// Switch to `next`; returns false when already in that mode
    pub fn set_mode(&mut self, next: Mode) -> bool {
        if next == self.mode {
            return false;
        }

        let from = self.mode;
        info!(from = %from, to = %next, "mode transition");

        self.cancel_timers();
        self.clear_choices();
        self.mode = next;
        self.emit(FaceEvent::ModeChanged { from, to: next });

        match next {
            Mode::Idle => {
                let prompt = self.idle_prompt.clone();
                self.show_line(&prompt);
            }
            Mode::Sport => self.start_motivation(),
            Mode::Rest => {
                self.rest.reset();
                self.step_rest_flow();
            }
        }

        true
    }

    /// Show the rest-flow step under the cursor
    ///
    /// A question waits for an answer; a note schedules its own advance.
    /// Once the cursor is past the last step this does nothing.
    pub fn step_rest_flow(&mut self) {
        let step = match self.rest.current() {
            Some(step) => step.clone(),
            None => {
                debug!(cursor = self.rest.cursor(), "rest flow finished");
                return;
            }
        };

        match step {
            DialogueStep::Question { text, choices } => {
                self.show_line(&text);
                self.show_choices(choices);
            }
            DialogueStep::Note { text, duration } => {
                self.show_line(&text);
                self.rest_timer = Some(self.scheduler.after(TimerKind::RestFlow, duration));
            }
        }
    }

    /// Act on the answer at `index` (0-based) among the shown buttons
    pub fn choose(&mut self, index: usize) {
        let Some(choice) = self.choices.get(index).cloned() else {
            warn!(index, shown = self.choices.len(), "no such answer, ignoring");
            return;
        };

        self.clear_choices();
        self.emit(FaceEvent::ChoiceSelected {
            label: choice.label.clone(),
        });

        match choice.action {
            ChoiceAction::Acknowledge {
                message,
                duration,
                then,
            } => {
                self.show_line(&message);
                match then {
                    AfterAck::Advance => {
                        self.rest_timer =
                            Some(self.scheduler.after(TimerKind::RestFlow, duration));
                    }
                    AfterAck::Finish => {
                        self.rest.finish();
                        debug!("rest flow completed by answer");
                    }
                }
            }
        }
    }

    /// Handle a timer expiry from the scheduler channel
    ///
    /// Firings from timers that were replaced or cancelled are ignored.
    pub fn on_timer(&mut self, fired: TimerFired) {
        match fired.kind {
            TimerKind::Motivation => {
                if !is_current(&self.motivation_timer, fired) {
                    debug!(?fired, "ignoring stale motivation timer");
                    return;
                }
                if let Some(line) = self.motivation.next_line().map(str::to_owned) {
                    self.show_line(&line);
                }
            }
            TimerKind::RestFlow => {
                if !is_current(&self.rest_timer, fired) {
                    debug!(?fired, "ignoring stale rest-flow timer");
                    return;
                }
                self.rest_timer = None;
                self.rest.advance();
                self.step_rest_flow();
            }
        }
    }

    /// Show a status message outside the scripted dialogue
    pub fn show_status(&mut self, text: &str) {
        self.show_line(text);
    }

    /// Cancel pending timers and remove the answer buttons
    pub fn dispose(&mut self) {
        self.cancel_timers();
        self.clear_choices();
        debug!("dialogue controller disposed");
    }

    fn start_motivation(&mut self) {
        let Some(first) = self.motivation.reset().map(str::to_owned) else {
            warn!("no motivation lines configured");
            return;
        };
        self.show_line(&first);
        self.motivation_timer = Some(
            self.scheduler
                .every(TimerKind::Motivation, self.motivation_interval),
        );
    }

    fn cancel_timers(&mut self) {
        self.motivation_timer = None;
        self.rest_timer = None;
    }

    fn show_line(&mut self, text: &str) {
        self.clear_choices();
        self.surface.render_line(text);
        self.emit(FaceEvent::LineShown {
            text: text.to_string(),
        });
    }

    fn show_choices(&mut self, choices: Vec<Choice>) {
        self.choices = choices;
        let labels: Vec<&str> = self.choices.iter().map(|c| c.label.as_str()).collect();
        self.surface.render_choices(&labels);
        let labels = labels.into_iter().map(str::to_owned).collect();
        self.emit(FaceEvent::ChoicesShown { labels });
    }

    fn clear_choices(&mut self) {
        if !self.choices.is_empty() {
            self.choices.clear();
            self.surface.render_choices(&[]);
        }
    }

    fn emit(&self, event: FaceEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

impl<S: DisplaySurface> Drop for DialogueController<S> {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

fn is_current(slot: &Option<TimerHandle>, fired: TimerFired) -> bool {
    slot.as_ref()
        .is_some_and(|handle| handle.generation() == fired.generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::recording::RecordingSurface;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    const MOTIVATION: Duration = Duration::from_millis(2500);

    struct Harness {
        controller: DialogueController<RecordingSurface>,
        timers: mpsc::UnboundedReceiver<TimerFired>,
        events: broadcast::Receiver<FaceEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let (scheduler, timers) = Scheduler::channel();
            let (event_tx, events) = broadcast::channel(64);
            let controller = DialogueController::new(
                Script::default(),
                MOTIVATION,
                scheduler,
                RecordingSurface::default(),
                event_tx,
            );
            Self {
                controller,
                timers,
                events,
            }
        }

        /// Wait for the next timer and hand it to the controller
        async fn pump(&mut self) -> TimerFired {
            let fired = self.timers.recv().await.unwrap();
            self.controller.on_timer(fired);
            fired
        }

        fn last_line(&self) -> &str {
            self.controller.surface().last_line().unwrap_or_default()
        }

        fn drain_events(&mut self) -> Vec<FaceEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state() {
        let h = Harness::new();
        assert_eq!(h.controller.mode(), Mode::Idle);
        assert!(h.controller.surface().lines.is_empty());
        assert!(!h.controller.has_pending(TimerKind::Motivation));
        assert!(!h.controller.has_pending(TimerKind::RestFlow));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_mode_is_noop() {
        let mut h = Harness::new();
        assert!(!h.controller.set_mode(Mode::Idle));

        assert!(h.controller.set_mode(Mode::Sport));
        assert!(!h.controller.set_mode(Mode::Sport));
        assert_eq!(h.controller.surface().lines, vec!["Goed zo, je bent lekker bezig!"]);

        let changes = h
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, FaceEvent::ModeChanged { .. }))
            .count();
        assert_eq!(changes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_motivation_cycles_with_period() {
        let mut h = Harness::new();
        let start = Instant::now();
        h.controller.set_mode(Mode::Sport);
        assert_eq!(h.controller.motivation_index(), 0);

        let expected = [
            "Niet opgeven!",
            "Kom op doorgaan!",
            "Goed zo, je bent lekker bezig!",
            "Niet opgeven!",
        ];
        for (n, line) in expected.iter().enumerate() {
            let fired = h.pump().await;
            assert_eq!(fired.kind, TimerKind::Motivation);
            assert_eq!(h.last_line(), *line);
            assert!(start.elapsed() >= MOTIVATION * (n as u32 + 1));
        }

        // Four ticks, each one period apart.
        assert!(start.elapsed() < MOTIVATION * 4 + Duration::from_millis(10));
        assert_eq!(h.controller.motivation_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentering_sport_restarts_cycle() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Sport);
        h.pump().await;
        assert_eq!(h.controller.motivation_index(), 1);

        h.controller.set_mode(Mode::Idle);
        h.controller.set_mode(Mode::Sport);
        assert_eq!(h.controller.motivation_index(), 0);
        assert_eq!(h.last_line(), "Goed zo, je bent lekker bezig!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_flow_walkthrough() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        assert_eq!(h.last_line(), "Ben je al moe?");
        assert_eq!(h.controller.choice_labels(), vec!["Ja", "Nee"]);
        assert_eq!(h.controller.surface().choices, vec!["Ja", "Nee"]);

        h.controller.choose(1);
        assert_eq!(h.last_line(), "dan moet je harder trainen");
        assert!(h.controller.choice_labels().is_empty());
        assert!(h.controller.surface().choices.is_empty());
        assert_eq!(h.controller.rest_cursor(), 0);

        let start = Instant::now();
        h.pump().await;
        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(h.controller.rest_cursor(), 1);
        assert_eq!(h.last_line(), "Vergeet je geen water te drinken?");

        h.controller.choose(0);
        assert_eq!(h.last_line(), "ga dan even snel wat drinken");
        let start = Instant::now();
        h.pump().await;
        assert!(start.elapsed() >= Duration::from_millis(1800));
        assert_eq!(
            h.last_line(),
            "Rust goed uit tussen de oefeningen door, maar niet te lang."
        );
        assert!(h.controller.has_pending(TimerKind::RestFlow));

        let start = Instant::now();
        h.pump().await;
        assert!(start.elapsed() >= Duration::from_millis(5000));
        assert_eq!(h.controller.rest_cursor(), 3);
        assert_eq!(h.last_line(), "Ben je klaar om verder te gaan?");
        assert_eq!(h.controller.choice_labels(), vec!["Ja"]);

        h.controller.choose(0);
        assert_eq!(h.last_line(), "zet hem op!");
        assert!(!h.controller.has_pending(TimerKind::RestFlow));
        assert_eq!(h.controller.rest_cursor(), 4);

        // Finished: stepping again shows nothing new.
        let shown = h.controller.surface().lines.len();
        h.controller.step_rest_flow();
        assert_eq!(h.controller.surface().lines.len(), shown);
        assert_eq!(h.controller.mode(), Mode::Rest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_cursor_resets_on_reentry() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        h.controller.choose(0);
        h.pump().await;
        assert_eq!(h.controller.rest_cursor(), 1);

        h.controller.set_mode(Mode::Sport);
        h.controller.set_mode(Mode::Rest);
        assert_eq!(h.controller.rest_cursor(), 0);
        assert_eq!(h.last_line(), "Ben je al moe?");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_cancels_pending_acknowledgement() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        h.controller.choose(0);
        assert!(h.controller.has_pending(TimerKind::RestFlow));

        h.controller.set_mode(Mode::Sport);
        assert!(!h.controller.has_pending(TimerKind::RestFlow));
        assert!(h.controller.has_pending(TimerKind::Motivation));

        // Only motivation firings arrive, well past the old 1.5s delay.
        for _ in 0..3 {
            let fired = h.pump().await;
            assert_eq!(fired.kind, TimerKind::Motivation);
        }
        assert_eq!(h.controller.rest_cursor(), 0);
        assert!(!h
            .controller
            .surface()
            .lines
            .iter()
            .any(|l| l == "Vergeet je geen water te drinken?"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_sport_stops_motivation() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Sport);
        h.controller.set_mode(Mode::Idle);
        assert!(!h.controller.has_pending(TimerKind::Motivation));
        assert_eq!(
            h.last_line(),
            "Gereed. Beweeg (sport) of rust om Resty te laten reageren."
        );

        tokio::time::sleep(MOTIVATION * 3).await;
        assert!(h.timers.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_firing_ignored() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Sport);
        let shown = h.controller.surface().lines.len();

        h.controller.on_timer(TimerFired {
            kind: TimerKind::Motivation,
            generation: 999,
        });
        h.controller.on_timer(TimerFired {
            kind: TimerKind::RestFlow,
            generation: 999,
        });
        assert_eq!(h.controller.surface().lines.len(), shown);
        assert_eq!(h.controller.rest_cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_answer_ignored() {
        let mut h = Harness::new();
        h.controller.choose(0);
        assert!(h.controller.surface().lines.is_empty());

        h.controller.set_mode(Mode::Rest);
        h.controller.choose(5);
        assert_eq!(h.last_line(), "Ben je al moe?");
        assert_eq!(h.controller.choice_labels(), vec!["Ja", "Nee"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_only_counts_once() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        h.controller.choose(0);
        h.controller.choose(0);
        let selected = h
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, FaceEvent::ChoiceSelected { .. }))
            .count();
        assert_eq!(selected, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_clears_choices() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        h.controller.show_status("Herkenning actief.");
        assert_eq!(h.last_line(), "Herkenning actief.");
        assert!(h.controller.choice_labels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_timers() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Sport);
        h.controller.dispose();
        assert!(!h.controller.has_pending(TimerKind::Motivation));

        tokio::time::sleep(MOTIVATION * 2).await;
        assert!(h.timers.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_rendering() {
        let mut h = Harness::new();
        h.controller.set_mode(Mode::Rest);
        let events = h.drain_events();
        assert_eq!(
            events,
            vec![
                FaceEvent::ModeChanged {
                    from: Mode::Idle,
                    to: Mode::Rest
                },
                FaceEvent::LineShown {
                    text: "Ben je al moe?".to_string()
                },
                FaceEvent::ChoicesShown {
                    labels: vec!["Ja".to_string(), "Nee".to_string()]
                },
            ]
        );
    }
}
