//! Cancellable timers that report back to the event loop
//!
//! Timers never touch dialogue state themselves. Each one runs as a small
//! tokio task that sends a [`TimerFired`] over a channel; the loop owning
//! the controller hands it over, and the controller decides whether the
//! firing is still current.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

/// The two timer slots the controller owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Repeating rotation of motivation lines
    Motivation,
    /// One-shot delay inside the rest flow (notes and acknowledgements)
    RestFlow,
}

/// A timer expiry delivered to the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Pending timer; dropping it cancels the timer
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns timers that report to a single channel
#[derive(Debug)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<TimerFired>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            tx,
            next_generation: 1,
        }
    }

    /// Create a scheduler together with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Fire once after `delay`
    pub fn after(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        let fired = self.next(kind);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            trace!(?fired, "timer fired");
            let _ = tx.send(fired);
        });

        TimerHandle {
            generation: fired.generation,
            task,
        }
    }

    /// Fire every `period`, starting one period from now
    pub fn every(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        let fired = self.next(kind);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                trace!(?fired, "interval fired");
                if tx.send(fired).is_err() {
                    break;
                }
            }
        });

        TimerHandle {
            generation: fired.generation,
            task,
        }
    }

    fn next(&mut self, kind: TimerKind) -> TimerFired {
        let generation = self.next_generation;
        self.next_generation += 1;
        TimerFired { kind, generation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_after_delay() {
        let (mut scheduler, mut rx) = Scheduler::channel();
        let start = Instant::now();
        let handle = scheduler.after(TimerKind::RestFlow, Duration::from_millis(1500));

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.kind, TimerKind::RestFlow);
        assert_eq!(fired.generation, handle.generation());
        assert_near(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_repeats() {
        let (mut scheduler, mut rx) = Scheduler::channel();
        let start = Instant::now();
        let _handle = scheduler.every(TimerKind::Motivation, Duration::from_millis(2500));

        for n in 1..=3u32 {
            rx.recv().await.unwrap();
            assert_near(start.elapsed(), Duration::from_millis(2500) * n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (mut scheduler, mut rx) = Scheduler::channel();
        let handle = scheduler.after(TimerKind::RestFlow, Duration::from_millis(100));
        drop(handle);

        time::sleep(Duration::from_secs(1)).await;
        let mut recv = tokio_test::task::spawn(rx.recv());
        tokio_test::assert_pending!(recv.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generations_are_unique() {
        let (mut scheduler, _rx) = Scheduler::channel();
        let a = scheduler.after(TimerKind::RestFlow, Duration::from_secs(1));
        let b = scheduler.every(TimerKind::Motivation, Duration::from_secs(1));
        assert_ne!(a.generation(), b.generation());
    }
}
