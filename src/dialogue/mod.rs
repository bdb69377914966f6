//! Dialogue module for mode management
//!
//! The face has three modes:
//! - Idle: static prompt, waiting for activity
//! - Sport: motivation lines rotate on a fixed timer
//! - Rest: a short scripted flow of questions and notes

mod controller;
mod mode;
pub mod script;
pub mod timer;

pub use controller::DialogueController;
pub use mode::Mode;
pub use script::Script;
pub use timer::{Scheduler, TimerFired};
