//! Owner-side handle for a process channel.
//!
//! The owner never holds a bare [`ProcessChannel`] that might outlive its
//! backend. It holds a [`ChannelSlot`], and termination moves the slot from
//! `Live` to `Gone` in the same step that consumes the channel.

use tracing::debug;

use crate::channel::ProcessChannel;

/// Zero or one channel, plus the outcome of the last one.
#[derive(Debug, Default)]
pub enum ChannelSlot {
    /// No channel has been installed.
    #[default]
    Vacant,
    /// A running channel.
    Live(ProcessChannel),
    /// The channel terminated and has been destroyed.
    Gone {
        /// Exit code of the terminated backend.
        exit_code: Option<i32>,
    },
}

impl ChannelSlot {
    /// Install `channel`, dropping (and killing) any previous live one.
    pub fn install(&mut self, channel: ProcessChannel) {
        if let Self::Live(previous) = std::mem::replace(self, Self::Live(channel)) {
            debug!(channel_id = previous.channel_id(), "replacing live channel");
        }
    }

    /// The live channel, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&ProcessChannel> {
        match self {
            Self::Live(channel) => Some(channel),
            _ => None,
        }
    }

    /// The live channel, if any.
    pub fn channel_mut(&mut self) -> Option<&mut ProcessChannel> {
        match self {
            Self::Live(channel) => Some(channel),
            _ => None,
        }
    }

    /// Whether a channel is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Whether the last channel terminated.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }

    /// `Some(exit_code)` once the slot is `Gone`.
    #[must_use]
    pub fn exit_code(&self) -> Option<Option<i32>> {
        match self {
            Self::Gone { exit_code } => Some(*exit_code),
            _ => None,
        }
    }

    /// Idle step: drain available input, then handle a pending exit.
    ///
    /// On exit the channel is moved out, [`ProcessChannel::on_terminate`]
    /// runs (draining and emitting the termination event) and the slot
    /// becomes `Gone`. Returns whether any input or termination was
    /// processed.
    pub fn pump(&mut self) -> bool {
        let Self::Live(channel) = self else {
            return false;
        };

        let mut progressed = false;
        while channel.poll_input() {
            progressed = true;
        }

        let Some(exit_code) = channel.poll_exit() else {
            return progressed;
        };

        if let Self::Live(channel) = std::mem::replace(self, Self::Gone { exit_code }) {
            channel.on_terminate(exit_code);
        }
        true
    }

    /// Drop a live channel, killing its backend. No termination event is
    /// emitted. Other states are left untouched.
    pub fn stop(&mut self) {
        if !self.is_live() {
            return;
        }
        if let Self::Live(channel) = std::mem::take(self) {
            debug!(channel_id = channel.channel_id(), "channel stopped");
        }
    }
}
