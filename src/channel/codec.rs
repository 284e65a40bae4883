//! Line framer for backend output streams.
//!
//! Turns the raw bytes a debugger backend writes into [`Fragment`]s: complete
//! `\n`-terminated lines, or partial lines when the stream has nothing more
//! to give right now. Backends that flush a prompt without a newline (GDB's
//! `(gdb) `) still surface promptly this way.
//!
//! # Usage
//!
//! The process channel feeds raw chunks into a `BytesMut` and calls
//! [`LineFramer::next_fragment`] once per poll.

use bytes::BytesMut;

/// Longest fragment the framer emits: 1 MiB.
///
/// An unterminated run longer than this is cut into `has_more` fragments
/// instead of growing the buffer without bound.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// One framed unit of backend output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Text without its line terminator.
    pub text: String,
    /// An end-of-line sequence was consumed.
    pub has_eol: bool,
    /// The line is incomplete and more bytes are expected later.
    pub has_more: bool,
}

/// Stateful `\n` framer with `\r\n` tolerance and UTF-8-safe partial reads.
#[derive(Debug)]
pub struct LineFramer {
    max_length: usize,
    /// Offset already scanned for `\n` in the current buffer.
    next_index: usize,
}

impl LineFramer {
    /// Create a framer with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a framer with a custom fragment limit (minimum 1).
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            next_index: 0,
        }
    }

    /// Frame the next unit from `src`.
    ///
    /// Returns a complete line when one is buffered. Otherwise returns the
    /// decodable prefix of `src` as a partial fragment. With `eof` set the
    /// remainder is flushed even if it ends inside a UTF-8 sequence. Returns
    /// `None` when nothing can be emitted yet.
    pub fn next_fragment(&mut self, src: &mut BytesMut, eof: bool) -> Option<Fragment> {
        if let Some(line) = self.complete_line(src) {
            return Some(line);
        }
        self.partial(src, eof)
    }

    /// Forget scan progress, e.g. after the caller cleared the buffer.
    pub fn reset(&mut self) {
        self.next_index = 0;
    }

    fn complete_line(&mut self, src: &mut BytesMut) -> Option<Fragment> {
        let start = self.next_index.min(src.len());
        let Some(offset) = src[start..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            return None;
        };

        self.next_index = 0;
        let newline = start + offset;
        let line = src.split_to(newline + 1);
        let mut body = &line[..newline];
        if let Some(stripped) = body.strip_suffix(b"\r") {
            body = stripped;
        }

        Some(Fragment {
            text: String::from_utf8_lossy(body).into_owned(),
            has_eol: true,
            has_more: false,
        })
    }

    fn partial(&mut self, src: &mut BytesMut, eof: bool) -> Option<Fragment> {
        let limit = src.len().min(self.max_length);
        let mut take = if eof {
            limit
        } else {
            complete_utf8_prefix(&src[..limit])
        };

        // A lone `\r` may be the first half of a `\r\n` split across reads.
        if !eof && take > 0 && src[take - 1] == b'\r' {
            take -= 1;
        }

        if take == 0 {
            return None;
        }

        self.next_index = 0;
        let chunk = src.split_to(take);
        Some(Fragment {
            text: String::from_utf8_lossy(&chunk).into_owned(),
            has_eol: false,
            has_more: !eof || !src.is_empty(),
        })
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Length of the longest prefix of `bytes` that does not end inside a
/// multi-byte UTF-8 sequence.
fn complete_utf8_prefix(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { len - back } else { len };
    }
    len
}
