//! Display surface for the face
//!
//! The dialogue controller only ever talks to a [`DisplaySurface`]: one
//! text line in the speech bubble and a row of answer buttons.

mod terminal;

pub use terminal::TerminalSurface;

/// Sink for everything the face shows
pub trait DisplaySurface {
    /// Hide the unlock control and show the face with its bubble
    fn reveal_face(&mut self);

    /// Replace the bubble text
    fn render_line(&mut self, text: &str);

    /// Show answer buttons; an empty slice removes them
    fn render_choices(&mut self, labels: &[&str]);
}

#[cfg(test)]
pub(crate) mod recording {
    use tokio::time::Instant;

    use super::DisplaySurface;

    /// Surface that remembers what was drawn, and when
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub revealed: bool,
        pub lines: Vec<String>,
        /// When each entry of `lines` was drawn
        pub shown_at: Vec<Instant>,
        pub choices: Vec<String>,
    }

    impl RecordingSurface {
        pub fn last_line(&self) -> Option<&str> {
            self.lines.last().map(String::as_str)
        }
    }

    impl DisplaySurface for RecordingSurface {
        fn reveal_face(&mut self) {
            self.revealed = true;
        }

        fn render_line(&mut self, text: &str) {
            self.lines.push(text.to_string());
            self.shown_at.push(Instant::now());
        }

        fn render_choices(&mut self, labels: &[&str]) {
            self.choices = labels.iter().map(|l| l.to_string()).collect();
        }
    }
}
