//! Piped backend process channel.
//!
//! A [`ProcessChannel`] owns one running backend: reader tasks for its stdout
//! and stderr, a writer task for its stdin, and an exit monitor. The owner
//! drives it cooperatively: [`ProcessChannel::poll_input`] never blocks, it
//! only frames bytes the reader tasks have already delivered.
//!
//! Termination is one-way. [`ProcessChannel::on_terminate`] consumes the
//! channel, so after it runs there is no handle left to misuse;
//! [`ChannelSlot`](crate::channel::ChannelSlot) records the outcome for the
//! owner.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::channel::codec::{Fragment, LineFramer};
use crate::channel::reader::run_reader;
use crate::channel::spawner::{monitor_exit, spawn_backend, SpawnConfig};
use crate::channel::writer::run_writer;
use crate::channel::{ChannelEvent, StreamTag};
use crate::config::GlobalConfig;
use crate::observer::SharedObserver;
use crate::Result;

// ── Options ──────────────────────────────────────────────────────────────────

/// Per-channel launch options.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Identifier stamped on every event from this channel.
    pub channel_id: String,
    /// Working directory for the backend.
    pub working_dir: PathBuf,
    /// Aggregate un-terminated fragments until a full line arrives.
    pub multiline: bool,
    /// Extra environment variables.
    pub env: HashMap<String, String>,
    /// How long the exit monitor waits for output pipes to close.
    pub drain_grace: Duration,
}

impl ChannelOptions {
    /// Options with the current directory, single-line mode and a 500 ms
    /// drain grace.
    #[must_use]
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            working_dir: PathBuf::from("."),
            multiline: false,
            env: HashMap::new(),
            drain_grace: Duration::from_millis(500),
        }
    }

    /// Options taken from the global configuration.
    #[must_use]
    pub fn from_config(channel_id: impl Into<String>, config: &GlobalConfig) -> Self {
        Self {
            channel_id: channel_id.into(),
            working_dir: config.working_dir.clone(),
            multiline: config.multiline,
            env: config.env.clone(),
            drain_grace: config.drain_grace(),
        }
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set multiline aggregation.
    #[must_use]
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }
}

// ── Output stream state ──────────────────────────────────────────────────────

/// Poll-side state of one backend output stream.
struct OutputStream {
    tag: StreamTag,
    chunks: mpsc::UnboundedReceiver<Bytes>,
    buffer: BytesMut,
    framer: LineFramer,
    /// Multiline aggregation buffer.
    pending: String,
    eof: bool,
}

impl OutputStream {
    fn new(tag: StreamTag, chunks: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self {
            tag,
            chunks,
            buffer: BytesMut::new(),
            framer: LineFramer::new(),
            pending: String::new(),
            eof: false,
        }
    }

    /// Move every chunk already delivered by the reader into the buffer.
    fn fill(&mut self) {
        while !self.eof {
            match self.chunks.try_recv() {
                Ok(chunk) => self.buffer.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.eof = true,
            }
        }
    }

    /// Frame one unit if the stream has any data available right now.
    fn next_available(&mut self) -> Option<Fragment> {
        self.fill();
        self.framer.next_fragment(&mut self.buffer, self.eof)
    }

    fn discard(&mut self) -> usize {
        self.fill();
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.framer.reset();
        self.pending.clear();
        discarded
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

/// Asynchronous piped connection to one backend process.
pub struct ProcessChannel {
    channel_id: String,
    pid: u32,
    multiline: bool,
    /// `None` once input is closed or the writer task is gone.
    stdin: Option<mpsc::UnboundedSender<String>>,
    stdout: OutputStream,
    stderr: OutputStream,
    exit_rx: oneshot::Receiver<Option<i32>>,
    exit: Option<Option<i32>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    observer: SharedObserver,
    cancel: CancellationToken,
}

impl ProcessChannel {
    /// Launch `command_line` and start pumping its streams.
    ///
    /// Returns as soon as the process is spawned; output is delivered later
    /// through [`poll_input`](Self::poll_input). Must be called from within a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the command line is empty or malformed,
    /// or if the process cannot be started.
    pub fn launch(
        command_line: &str,
        options: ChannelOptions,
        events: mpsc::UnboundedSender<ChannelEvent>,
        observer: SharedObserver,
    ) -> Result<Self> {
        let span = info_span!("launch", channel_id = options.channel_id.as_str());
        let _guard = span.enter();

        let process = spawn_backend(&SpawnConfig {
            command_line: command_line.to_owned(),
            working_dir: options.working_dir.clone(),
            env: options.env.clone(),
        })?;

        let cancel = CancellationToken::new();
        let channel_id = options.channel_id;

        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        let readers = vec![
            tokio::spawn(run_reader(
                channel_id.clone(),
                StreamTag::Stdout,
                process.stdout,
                stdout_tx,
                cancel.clone(),
            )),
            tokio::spawn(run_reader(
                channel_id.clone(),
                StreamTag::Stderr,
                process.stderr,
                stderr_tx,
                cancel.clone(),
            )),
        ];
        tokio::spawn(run_writer(
            channel_id.clone(),
            process.stdin,
            stdin_rx,
            cancel.clone(),
        ));
        // Detached: the monitor ends on exit or cancellation.
        let _monitor = monitor_exit(
            channel_id.clone(),
            process.child,
            readers,
            options.drain_grace,
            exit_tx,
            cancel.clone(),
        );

        info!(pid = process.pid, command_line, "channel launched");

        Ok(Self {
            channel_id,
            pid: process.pid,
            multiline: options.multiline,
            stdin: Some(stdin_tx),
            stdout: OutputStream::new(StreamTag::Stdout, stdout_rx),
            stderr: OutputStream::new(StreamTag::Stderr, stderr_rx),
            exit_rx,
            exit: None,
            events,
            observer,
            cancel,
        })
    }

    /// Identifier stamped on this channel's events.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// OS process id of the backend.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether [`send_line`](Self::send_line) still reaches the backend.
    #[must_use]
    pub fn is_input_open(&self) -> bool {
        self.stdin.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Write `text` plus a line terminator to the backend's input.
    ///
    /// Silently does nothing if input is closed or the backend has exited.
    pub fn send_line(&mut self, text: &str) {
        let Some(tx) = &self.stdin else {
            return;
        };
        if tx.send(format!("{text}\n")).is_err() {
            debug!(channel_id = self.channel_id, "send_line: input closed, dropping");
            self.stdin = None;
        } else {
            debug!(channel_id = self.channel_id, text, "line sent");
        }
    }

    /// Close the backend's input so it reads EOF. Output stays readable.
    pub fn close_input(&mut self) {
        if self.stdin.take().is_some() {
            debug!(channel_id = self.channel_id, "input closed");
        }
    }

    /// Frame and deliver one unit of available output.
    ///
    /// Error output is checked first. Returns `false` only when neither
    /// stream has data right now; never waits for data to arrive.
    pub fn poll_input(&mut self) -> bool {
        self.poll_stream(StreamTag::Stderr) || self.poll_stream(StreamTag::Stdout)
    }

    /// Non-blocking check for the backend's exit.
    ///
    /// Returns `Some(exit_code)` once the exit monitor has published it;
    /// `exit_code` is `None` when the process was killed by a signal or the
    /// monitor is gone.
    pub fn poll_exit(&mut self) -> Option<Option<i32>> {
        if self.exit.is_none() {
            match self.exit_rx.try_recv() {
                Ok(code) => self.exit = Some(code),
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => self.exit = Some(None),
            }
        }
        self.exit
    }

    /// Discard everything currently buffered or available on both output
    /// streams without framing it or emitting events.
    ///
    /// Returns the number of bytes discarded.
    pub fn forfeit_streams(&mut self) -> usize {
        let discarded = self.stderr.discard() + self.stdout.discard();
        debug!(channel_id = self.channel_id, discarded, "streams forfeited");
        discarded
    }

    /// Interrupt the backend (SIGINT), the way a front-end breaks into a
    /// running debuggee.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Channel` if the signal cannot be delivered.
    #[cfg(unix)]
    pub fn interrupt(&self) -> Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        use crate::AppError;

        let pid = i32::try_from(self.pid)
            .map_err(|_| AppError::Channel(format!("pid {} out of range", self.pid)))?;
        kill(Pid::from_raw(pid), Signal::SIGINT)
            .map_err(|err| AppError::Channel(format!("failed to interrupt backend: {err}")))?;
        debug!(channel_id = self.channel_id, pid, "backend interrupted");
        Ok(())
    }

    /// Interrupt the backend.
    ///
    /// # Errors
    ///
    /// Always returns `AppError::Channel`: signals are unix-only.
    #[cfg(not(unix))]
    pub fn interrupt(&self) -> Result<()> {
        Err(crate::AppError::Channel(
            "interrupt is only supported on unix".into(),
        ))
    }

    /// Final step of the channel's life.
    ///
    /// Drains all remaining output as line events, flushes any multiline
    /// aggregation as an un-terminated line, emits
    /// [`ChannelEvent::Terminated`], then drops the channel.
    pub fn on_terminate(mut self, exit_code: Option<i32>) {
        while self.poll_input() {}
        self.flush_pending(StreamTag::Stderr);
        self.flush_pending(StreamTag::Stdout);

        info!(channel_id = self.channel_id, ?exit_code, "channel terminated");
        let event = ChannelEvent::Terminated {
            channel_id: self.channel_id.clone(),
            exit_code,
        };
        if self.events.send(event).is_err() {
            debug!(channel_id = self.channel_id, "event receiver dropped before termination");
        }
    }

    // ── Private helpers ──────────────────────────────────────────────────────

    fn poll_stream(&mut self, tag: StreamTag) -> bool {
        let stream = match tag {
            StreamTag::Stdout => &mut self.stdout,
            StreamTag::Stderr => &mut self.stderr,
        };
        let Some(fragment) = stream.next_available() else {
            return false;
        };

        self.observer.fragment_read(
            &self.channel_id,
            stream.tag,
            &fragment.text,
            fragment.has_eol,
            fragment.has_more,
        );

        let (text, has_eol) = if self.multiline {
            stream.pending.push_str(&fragment.text);
            if !fragment.has_eol {
                return true;
            }
            (std::mem::take(&mut stream.pending), true)
        } else {
            (fragment.text, fragment.has_eol)
        };

        self.post_line(tag, text, has_eol);
        true
    }

    fn flush_pending(&mut self, tag: StreamTag) {
        let stream = match tag {
            StreamTag::Stdout => &mut self.stdout,
            StreamTag::Stderr => &mut self.stderr,
        };
        if stream.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut stream.pending);
        self.post_line(tag, text, false);
    }

    fn post_line(&self, stream: StreamTag, text: String, has_eol: bool) {
        self.observer.line_posted(&self.channel_id, stream, &text);
        let event = ChannelEvent::Line {
            channel_id: self.channel_id.clone(),
            stream,
            text,
            has_eol,
        };
        if self.events.send(event).is_err() {
            debug!(channel_id = self.channel_id, "event receiver dropped, line discarded");
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Debug for ProcessChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessChannel")
            .field("channel_id", &self.channel_id)
            .field("pid", &self.pid)
            .field("multiline", &self.multiline)
            .field("input_open", &self.is_input_open())
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}
