//! Breakpoint data model.

use std::fmt::{Display, Formatter};

/// A registered intent to halt execution at a source location.
///
/// Tracked independently of whatever the backend believes it has installed.
/// The [`BreakpointRegistry`](crate::breakpoints::BreakpointRegistry) is the
/// sole owner; drivers only ever see `&Breakpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Source path exactly as supplied by the caller (not normalized).
    pub filename: String,
    /// 1-based source line.
    pub line: u32,
    /// One-shot breakpoint, culled after one arm/fire cycle.
    pub temporary: bool,
    /// Optional source snippet; opaque to the session core.
    pub line_text: String,
    /// Stable number exposed to the backend and to callers.
    pub index: u32,
    /// Set once a live driver has been asked to install this breakpoint.
    pub already_set: bool,
}

impl Breakpoint {
    /// Create an unregistered breakpoint.
    ///
    /// `index` stays `0` until the registry assigns one.
    #[must_use]
    pub fn new(filename: impl Into<String>, line: u32, temporary: bool) -> Self {
        Self {
            filename: filename.into(),
            line,
            temporary,
            line_text: String::new(),
            index: 0,
            already_set: false,
        }
    }

    /// Attach a source snippet.
    #[must_use]
    pub fn with_line_text(mut self, line_text: impl Into<String>) -> Self {
        self.line_text = line_text.into();
        self
    }

    /// Whether this breakpoint sits at `(filename, line)`.
    #[must_use]
    pub fn is_at(&self, filename: &str, line: u32) -> bool {
        self.line == line && self.filename == filename
    }

    /// `file:line` location string.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.filename, self.line)
    }
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}:{}", self.index, self.filename, self.line)?;
        if self.temporary {
            write!(f, " (temporary)")?;
        }
        Ok(())
    }
}
