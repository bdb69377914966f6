//! Input module for user commands
//!
//! Reads commands line by line from stdin and forwards them to the event
//! loop over a channel.

mod command;
mod reader;

pub use command::InputCommand;
pub use reader::spawn_stdin_reader;
