//! Plain-text rendering of the face on a terminal

use std::io::Write;

use tracing::warn;

use super::DisplaySurface;

const FACE: &str = "  (^_^)  Resty";

/// Writes the bubble and answer buttons as lines of text
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!(?e, "failed to write to terminal");
        }
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn reveal_face(&mut self) {
        self.write_line(FACE);
    }

    fn render_line(&mut self, text: &str) {
        self.write_line(&format!("  > {}", text));
    }

    fn render_choices(&mut self, labels: &[&str]) {
        if labels.is_empty() {
            return;
        }
        let buttons: Vec<String> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| format!("[{}] {}", i + 1, label))
            .collect();
        self.write_line(&format!("    {}", buttons.join("  ")));
    }
}
