//! Piped backend process handling.
//!
//! Manages the asynchronous byte streams of a debugger backend and turns
//! them into line events for the owner.
//!
//! Submodules:
//! - `codec`: [`LineFramer`] splitting raw output into lines and fragments.
//! - `reader`: task forwarding raw chunks from one output stream.
//! - `writer`: task writing queued lines to the backend's stdin.
//! - `spawner`: process spawning and the exit monitor.
//! - `process`: [`ProcessChannel`], the poll-driven channel itself.
//! - `slot`: [`ChannelSlot`], the owner's live / gone handle.

pub mod codec;
pub mod process;
pub mod reader;
pub mod slot;
pub mod spawner;
pub mod writer;

use std::fmt::{Display, Formatter};

pub use codec::{Fragment, LineFramer, MAX_LINE_BYTES};
pub use process::{ChannelOptions, ProcessChannel};
pub use slot::ChannelSlot;

/// Which backend output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    /// Standard output.
    Stdout,
    /// Error output.
    Stderr,
}

impl Display for StreamTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Events a channel delivers to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A line (or, in single-line mode, a partial line) of backend output.
    Line {
        /// Channel that produced the line.
        channel_id: String,
        /// Stream the line was read from.
        stream: StreamTag,
        /// Text without its terminator.
        text: String,
        /// Whether a line terminator was consumed.
        has_eol: bool,
    },
    /// The backend exited; always the channel's last event.
    Terminated {
        /// Channel whose backend exited.
        channel_id: String,
        /// Exit code, or `None` if killed by a signal.
        exit_code: Option<i32>,
    },
}
