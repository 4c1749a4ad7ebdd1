//! Inbound half of the session transport.
//!
//! Modeled directly on `core_input::async_service::AsyncEventStreamTask`: a
//! `tokio::select!` race between a shutdown signal and the next transport message,
//! translating whatever arrives into either a forwarded input event or a fulfilled
//! query/load reply, and ending the task (and firing shutdown) the moment the stream
//! errors or closes.

use crate::error::SessionError;
use crate::telemetry::{CHANNEL_SEND_BLOCKED, FRAMES_RECEIVED};
use canvas_context::{ImageLoadOutcome, PendingImageLoads, PendingQueries, QuitSignal};
use canvas_wire::ClientEvent;
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, trace, warn};

/// An event forwarded from the browser that is not a reply to a query — the reader
/// never puts reply events on this channel, it resolves them internally instead.
pub type InputEvent = ClientEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
    DecodeError,
}

impl ExitReason {
    fn as_str(self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
            ExitReason::DecodeError => "decode_error",
        }
    }
}

pub struct ReaderTask<S> {
    stream: SplitStream<WebSocketStream<S>>,
    quit: QuitSignal,
    input_tx: Sender<InputEvent>,
    pending_queries: Arc<PendingQueries>,
    pending_image_loads: Arc<PendingImageLoads>,
    image_dims: Arc<Mutex<HashMap<canvas_wire::ResourceId, Arc<Mutex<(u32, u32)>>>>>,
    canvas_size: Arc<Mutex<(u32, u32)>>,
}

impl<S> ReaderTask<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        stream: SplitStream<WebSocketStream<S>>,
        quit: QuitSignal,
        input_tx: Sender<InputEvent>,
        pending_queries: Arc<PendingQueries>,
        pending_image_loads: Arc<PendingImageLoads>,
        image_dims: Arc<Mutex<HashMap<canvas_wire::ResourceId, Arc<Mutex<(u32, u32)>>>>>,
        canvas_size: Arc<Mutex<(u32, u32)>>,
    ) -> Self {
        Self {
            stream,
            quit,
            input_tx,
            pending_queries,
            pending_image_loads,
            image_dims,
            canvas_size,
        }
    }

    /// Runs until shutdown, stream end, or a fatal transport/decode error. The
    /// latter two are returned so `Session::run` can log the actual failure kind
    /// instead of just "the reader stopped".
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(target: "session.reader", "reader_task_started");
        let mut fatal: Option<SessionError> = None;
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.quit.wait() => break ExitReason::ShutdownSignal,
                item = self.stream.next() => item,
            };

            let Some(item) = next else {
                break ExitReason::StreamEnded;
            };

            let message = match item {
                Ok(message) => message,
                Err(err) => {
                    warn!(target: "session.reader", %err, "transport_error");
                    fatal = Some(SessionError::Transport(err));
                    break ExitReason::StreamError;
                }
            };

            let bytes = match message {
                Message::Binary(bytes) => bytes,
                Message::Close(_) => break ExitReason::StreamEnded,
                // Ping/Pong/Text/Frame are handled transparently by tungstenite or
                // carry no protocol meaning here; ignore and keep reading.
                _ => continue,
            };

            FRAMES_RECEIVED.fetch_add(1, Ordering::Relaxed);
            let mut cursor = bytes.as_ref();
            let event = match ClientEvent::decode(&mut cursor) {
                Ok(event) => event,
                Err(err) => {
                    warn!(target: "session.reader", %err, "decode_error");
                    fatal = Some(SessionError::Decode(err));
                    break ExitReason::DecodeError;
                }
            };

            if !self.dispatch(event).await {
                break ExitReason::ChannelClosed;
            }
        };

        if !matches!(reason, ExitReason::ShutdownSignal) {
            self.quit.signal();
        }
        info!(target: "session.reader", reason = reason.as_str(), "reader_task_stopped");

        match fatal {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Returns `false` if the input channel is closed and the task should stop.
    async fn dispatch(&mut self, event: ClientEvent) -> bool {
        match event {
            ClientEvent::TextMetrics { query_id, .. }
            | ClientEvent::ImageData { query_id, .. }
            | ClientEvent::PointInPath { query_id, .. }
            | ClientEvent::PointInStroke { query_id, .. } => {
                trace!(target: "session.reader", query_id, "reply_event");
                self.pending_queries.fulfill(query_id, event);
                true
            }
            ClientEvent::ImageLoaded {
                id,
                ok,
                width,
                height,
            } => {
                let resource_id = canvas_wire::ResourceId(id);
                if let Some(dims) = self.image_dims.lock().unwrap().get(&resource_id) {
                    *dims.lock().unwrap() = (width, height);
                }
                debug!(target: "session.reader", id, ok, width, height, "image_loaded");
                self.pending_image_loads
                    .fulfill(resource_id, ImageLoadOutcome { ok, width, height });
                true
            }
            ClientEvent::Resize { width, height } => {
                *self.canvas_size.lock().unwrap() = (width.max(0) as u32, height.max(0) as u32);
                debug!(target: "session.reader", width, height, "canvas_resized");
                match self
                    .input_tx
                    .try_send(ClientEvent::Resize { width, height })
                {
                    Ok(()) => true,
                    Err(tokio::sync::mpsc::error::TrySendError::Full(event)) => {
                        CHANNEL_SEND_BLOCKED.fetch_add(1, Ordering::Relaxed);
                        self.input_tx.send(event).await.is_ok()
                    }
                    Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => false,
                }
            }
            other => match self.input_tx.try_send(other) {
                Ok(()) => true,
                Err(tokio::sync::mpsc::error::TrySendError::Full(event)) => {
                    CHANNEL_SEND_BLOCKED.fetch_add(1, Ordering::Relaxed);
                    self.input_tx.send(event).await.is_ok()
                }
                Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => false,
            },
        }
    }
}
