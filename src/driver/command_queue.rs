//! Outbound protocol line queue shared by the concrete drivers.

use std::collections::VecDeque;

use tracing::trace;

/// FIFO of protocol lines waiting to be written to a backend.
#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    lines: VecDeque<String>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one protocol line. The terminator is added by the channel.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        trace!(line = line.as_str(), "command queued");
        self.lines.push_back(line);
    }

    /// Take every queued line, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }

    /// Number of queued lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
