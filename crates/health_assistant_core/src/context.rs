//! crates/health_assistant_core/src/context.rs
//!
//! Renders the single grounding sentence injected into caretaker prompts.

use std::fmt;

use crate::domain::Reminder;

pub const NO_UPCOMING_REMINDERS: &str = "No upcoming reminders";

/// A one-line fact derived from the user's reminder state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFact(String);

impl ContextFact {
    pub fn from_next_reminder(reminder: Option<&Reminder>) -> Self {
        match reminder {
            Some(reminder) => Self(format!(
                "Next reminder: {} at {}",
                reminder.title,
                reminder.scheduled_time.format("%Y-%m-%dT%H:%M:%S")
            )),
            None => Self(NO_UPCOMING_REMINDERS.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
