//! Authored dialogue content and the cursors that walk it
//!
//! The rest flow is a fixed list of questions and notes walked once per
//! rest session; the motivation cycle is a fixed list of lines walked
//! round-robin while exercising.

use std::time::Duration;

/// How long a note stays up when the script gives no duration
pub const DEFAULT_NOTE_DURATION: Duration = Duration::from_millis(3000);

/// What happens once an acknowledgement has been shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterAck {
    /// Move on to the next rest-flow step once the message expires
    Advance,
    /// End the rest flow; the message stays up
    Finish,
}

/// Effect of picking an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceAction {
    /// Show a short message for `duration`, then continue per `then`
    Acknowledge {
        message: String,
        duration: Duration,
        then: AfterAck,
    },
}

/// A single answer button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub action: ChoiceAction,
}

impl Choice {
    /// Answer that acknowledges and then advances the flow
    pub fn advance(label: &str, message: &str, millis: u64) -> Self {
        Self::acknowledge(label, message, millis, AfterAck::Advance)
    }

    /// Answer that acknowledges and then ends the flow
    pub fn finish(label: &str, message: &str, millis: u64) -> Self {
        Self::acknowledge(label, message, millis, AfterAck::Finish)
    }

    fn acknowledge(label: &str, message: &str, millis: u64, then: AfterAck) -> Self {
        Self {
            label: label.to_string(),
            action: ChoiceAction::Acknowledge {
                message: message.to_string(),
                duration: Duration::from_millis(millis),
                then,
            },
        }
    }
}

/// One step of the rest flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueStep {
    /// Text plus answer buttons; waits for a selection
    Question { text: String, choices: Vec<Choice> },
    /// Text that advances on its own after `duration`
    Note { text: String, duration: Duration },
}

impl DialogueStep {
    pub fn question(text: &str, choices: Vec<Choice>) -> Self {
        Self::Question {
            text: text.to_string(),
            choices,
        }
    }

    pub fn note(text: &str, duration: Option<Duration>) -> Self {
        Self::Note {
            text: text.to_string(),
            duration: duration.unwrap_or(DEFAULT_NOTE_DURATION),
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        match self {
            DialogueStep::Question { text, .. } | DialogueStep::Note { text, .. } => text,
        }
    }
}

/// Ordered rest-flow steps with a forward-only cursor
#[derive(Debug, Clone)]
pub struct RestFlow {
    steps: Vec<DialogueStep>,
    cursor: usize,
}

impl RestFlow {
    pub fn new(steps: Vec<DialogueStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step under the cursor, `None` once the flow is over
    pub fn current(&self) -> Option<&DialogueStep> {
        self.steps.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Move to the next step; saturates at the end
    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.cursor += 1;
        }
    }

    /// Jump to the end so no further step is shown
    pub fn finish(&mut self) {
        self.cursor = self.steps.len();
    }
}

/// Lines shown in rotation while exercising
#[derive(Debug, Clone)]
pub struct MotivationCycle {
    lines: Vec<String>,
    index: usize,
}

impl MotivationCycle {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, index: 0 }
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Rewind to the first line and return it
    pub fn reset(&mut self) -> Option<&str> {
        self.index = 0;
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.index).map(String::as_str)
    }

    /// Advance with wraparound and return the new line
    pub fn next_line(&mut self) -> Option<&str> {
        if self.lines.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.lines.len();
        self.current()
    }
}

/// Everything the face can say
#[derive(Debug, Clone)]
pub struct Script {
    pub idle_prompt: String,
    pub motivation: Vec<String>,
    pub rest_flow: Vec<DialogueStep>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            idle_prompt: "Gereed. Beweeg (sport) of rust om Resty te laten reageren.".to_string(),
            motivation: vec![
                "Goed zo, je bent lekker bezig!".to_string(),
                "Niet opgeven!".to_string(),
                "Kom op doorgaan!".to_string(),
            ],
            rest_flow: vec![
                DialogueStep::question(
                    "Ben je al moe?",
                    vec![
                        Choice::advance("Ja", "dan ben je goed bezig!", 1500),
                        Choice::advance("Nee", "dan moet je harder trainen", 1500),
                    ],
                ),
                DialogueStep::question(
                    "Vergeet je geen water te drinken?",
                    vec![
                        Choice::advance("Ja", "ga dan even snel wat drinken", 1800),
                        Choice::advance("Nee", "goed dat je genoeg drinkt", 1500),
                    ],
                ),
                DialogueStep::note(
                    "Rust goed uit tussen de oefeningen door, maar niet te lang.",
                    Some(Duration::from_millis(5000)),
                ),
                DialogueStep::question(
                    "Ben je klaar om verder te gaan?",
                    vec![Choice::finish("Ja", "zet hem op!", 1500)],
                ),
            ],
        }
    }
}
