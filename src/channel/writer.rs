//! Backend input writer task.
//!
//! Receives already-terminated protocol lines from an unbounded [`mpsc`]
//! channel and writes them to the backend's stdin. Callers enqueue without
//! blocking; the task does the awaiting.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Writer task: drain `line_rx` into `stdin`.
///
/// The task exits cleanly when:
/// - `cancel` is triggered,
/// - `line_rx` is closed (all senders dropped), or
/// - a write fails (the backend closed its input or exited).
///
/// Returning drops `stdin`, which is how the backend sees EOF on its input.
pub async fn run_writer<W>(
    channel_id: String,
    mut stdin: W,
    mut line_rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(channel_id, "writer: cancellation received, stopping");
                break;
            }

            line = line_rx.recv() => {
                let Some(line) = line else {
                    debug!(channel_id, "writer: input closed, stopping");
                    break;
                };

                let written = match stdin.write_all(line.as_bytes()).await {
                    Ok(()) => stdin.flush().await,
                    Err(err) => Err(err),
                };

                if let Err(err) = written {
                    warn!(channel_id, %err, "writer: write to stdin failed");
                    break;
                }
            }
        }
    }
}
