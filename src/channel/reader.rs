//! Backend output reader task.
//!
//! Forwards the raw bytes of one backend output stream (stdout or stderr)
//! to the owning [`ProcessChannel`](crate::channel::ProcessChannel) through
//! an unbounded [`mpsc`] channel. Framing happens on the poll side, not here:
//! the reader cannot know whether "no newline yet" means "more is coming" or
//! "this is a prompt".
//!
//! Dropping the sender on return is the EOF signal the poll side observes.

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::{BytesCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::channel::StreamTag;

/// Reader task: copy chunks from `source` into `chunk_tx` until EOF.
///
/// Exits on EOF, on an I/O error, when `chunk_tx` is closed, or when
/// `cancel` fires.
pub async fn run_reader<R>(
    channel_id: String,
    stream: StreamTag,
    source: R,
    chunk_tx: mpsc::UnboundedSender<Bytes>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(source, BytesCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(channel_id, %stream, "reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!(channel_id, %stream, "reader: EOF detected");
                        break;
                    }

                    Some(Err(err)) => {
                        warn!(channel_id, %stream, %err, "reader: IO error, stopping");
                        break;
                    }

                    Some(Ok(chunk)) => {
                        if chunk_tx.send(chunk.freeze()).is_err() {
                            debug!(channel_id, %stream, "reader: channel dropped, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
