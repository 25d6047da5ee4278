//! Reveal cursor over the message timeline.
//!
//! The timeline is in log order and assumed ascending by timestamp. The cursor counts revealed
//! messages, so it only ever moves forward.

use crate::chat::model::ChatMessage;

/// Number of messages visible at `time_s`: the index of the first message whose timestamp is
/// strictly greater than `time_s`, or `messages.len()` when every message is due.
pub fn find_start_index(messages: &[ChatMessage], time_s: f64) -> usize {
    messages.partition_point(|m| m.timestamp_s <= time_s)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Playhead {
    revealed: usize,
}

impl Playhead {
    /// Seed at the window start; messages at or before `from_s` are already on screen.
    pub fn seeded(messages: &[ChatMessage], from_s: f64) -> Self {
        Self {
            revealed: find_start_index(messages, from_s),
        }
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Reveal every message due at `time_s`. Returns how many became visible.
    ///
    /// Scans forward from the cursor instead of bisecting, so a non-ascending log still reveals
    /// in log order.
    pub fn advance(&mut self, messages: &[ChatMessage], time_s: f64) -> usize {
        let start = self.revealed;
        while let Some(next) = messages.get(self.revealed) {
            if next.timestamp_s > time_s {
                break;
            }
            self.revealed += 1;
        }
        self.revealed - start
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/playhead.rs"]
mod tests;
