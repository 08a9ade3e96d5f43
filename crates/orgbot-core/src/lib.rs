//! Core types and conversation flow for the orgkom intake bot

pub mod error;
pub mod flow;
pub mod record;
pub mod texts;

pub use error::{OrgbotError, Result};
pub use flow::{CourseAnswer, IntakeFlow, Keyboard, Outbound, Stage, Turn};
pub use record::Record;
