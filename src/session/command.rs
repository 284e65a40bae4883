//! Interactive front-end command parsing.
//!
//! One line typed by the user maps to one [`UserCommand`]. Anything that is
//! not a recognised command is forwarded to the backend verbatim, so the
//! backend's own command language stays reachable.

/// A parsed interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `b FILE:LINE` / `tb FILE:LINE`.
    Break {
        /// Source file.
        filename: String,
        /// 1-based line.
        line: u32,
        /// One-shot breakpoint.
        temporary: bool,
    },
    /// `d FILE:LINE`.
    Delete {
        /// Source file.
        filename: String,
        /// 1-based line.
        line: u32,
    },
    /// `d` with no location.
    DeleteAll,
    /// `bl`.
    List,
    /// `c`.
    Continue,
    /// `s`.
    Step,
    /// `n`.
    Next,
    /// `int`.
    Interrupt,
    /// `q`.
    Quit,
    /// Anything else, sent to the backend as typed.
    Raw(String),
    /// Blank input.
    Empty,
}

impl UserCommand {
    /// Parse one input line.
    ///
    /// A breakpoint command with a malformed location falls through to
    /// [`UserCommand::Raw`].
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let (verb, rest) = trimmed
            .split_once(char::is_whitespace)
            .map_or((trimmed, ""), |(verb, rest)| (verb, rest.trim()));

        match (verb, rest.is_empty()) {
            ("b" | "tb", false) => match parse_location(rest) {
                Some((filename, line)) => Self::Break {
                    filename,
                    line,
                    temporary: verb == "tb",
                },
                None => Self::Raw(trimmed.to_owned()),
            },
            ("d", true) => Self::DeleteAll,
            ("d", false) => match parse_location(rest) {
                Some((filename, line)) => Self::Delete { filename, line },
                None => Self::Raw(trimmed.to_owned()),
            },
            ("bl", true) => Self::List,
            ("c", true) => Self::Continue,
            ("s", true) => Self::Step,
            ("n", true) => Self::Next,
            ("int", true) => Self::Interrupt,
            ("q", true) => Self::Quit,
            _ => Self::Raw(trimmed.to_owned()),
        }
    }
}

/// Split `FILE:LINE` on the last colon, so drive-letter paths such as
/// `C:\src\main.c:12` keep their prefix.
///
/// Returns `None` for an empty file, a non-numeric line, or line 0.
#[must_use]
pub fn parse_location(location: &str) -> Option<(String, u32)> {
    let (filename, line) = location.trim().rsplit_once(':')?;
    let line: u32 = line.trim().parse().ok()?;
    if filename.is_empty() || line == 0 {
        return None;
    }
    Some((filename.to_owned(), line))
}
