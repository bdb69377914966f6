//! Command definitions and parsing

/// Commands a user can type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// Move the unlock slider to a value in 0-100
    Slide(f64),
    /// Pick an answer button, 1-based as shown on screen
    Answer(usize),
    /// Leave the program
    Quit,
}

/// Errors from parsing a command line
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{command} needs {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

impl std::str::FromStr for InputCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err(ParseError::Empty);
        };
        let arg = parts.next();

        match word.to_lowercase().as_str() {
            "slide" => arg
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .map(InputCommand::Slide)
                .ok_or(ParseError::BadArgument {
                    command: "slide",
                    expected: "a value between 0 and 100",
                }),
            "answer" => arg
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .map(InputCommand::Answer)
                .ok_or(ParseError::BadArgument {
                    command: "answer",
                    expected: "an answer number starting at 1",
                }),
            "quit" | "exit" => Ok(InputCommand::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}
