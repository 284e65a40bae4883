//! Diagnostics sink injected into the registry and the process channel.
//!
//! The core never calls the logger at its diagnostic extension points;
//! it reports to a [`SessionObserver`] instead. [`TracingObserver`] forwards
//! everything to `tracing`, and tests substitute a recording sink.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::channel::StreamTag;

/// Extension points reported by the session core.
///
/// Every method has an empty default so sinks only implement what they need.
pub trait SessionObserver: Send + Sync {
    /// A `(filename, line)` lookup is starting.
    fn lookup_started(&self, _filename: &str, _line: u32) {}

    /// One registry entry is being compared during a lookup.
    fn lookup_compared(&self, _filename: &str, _line: u32) {}

    /// A lookup scanned the whole registry without a match.
    fn lookup_missed(&self, _filename: &str, _line: u32) {}

    /// Reconciliation is about to re-apply `count` breakpoints.
    fn breakpoints_applying(&self, _count: usize) {}

    /// One fragment was framed from a backend stream.
    fn fragment_read(
        &self,
        _channel_id: &str,
        _stream: StreamTag,
        _text: &str,
        _has_eol: bool,
        _has_more: bool,
    ) {
    }

    /// A line event was posted to the owner.
    fn line_posted(&self, _channel_id: &str, _stream: StreamTag, _text: &str) {}
}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn SessionObserver>;

/// Observer that writes every extension point to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    /// Build a [`SharedObserver`] backed by `tracing`.
    #[must_use]
    pub fn shared() -> SharedObserver {
        Arc::new(Self)
    }
}

impl SessionObserver for TracingObserver {
    fn lookup_started(&self, filename: &str, line: u32) {
        trace!(filename, line, "looking for breakpoint");
    }

    fn lookup_compared(&self, filename: &str, line: u32) {
        trace!(filename, line, "checking breakpoint");
    }

    fn lookup_missed(&self, filename: &str, line: u32) {
        trace!(filename, line, "breakpoint not found");
    }

    fn breakpoints_applying(&self, count: usize) {
        debug!(count, "setting breakpoints");
    }

    fn fragment_read(
        &self,
        channel_id: &str,
        stream: StreamTag,
        text: &str,
        has_eol: bool,
        has_more: bool,
    ) {
        trace!(channel_id, %stream, text, has_eol, has_more, "fragment read");
    }

    fn line_posted(&self, channel_id: &str, stream: StreamTag, text: &str) {
        debug!(channel_id, %stream, text, "line posted");
    }
}
