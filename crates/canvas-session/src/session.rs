//! One connected browser session: startup handshake, the user's task, and staged
//! shutdown, mirroring `ox-bin`'s `AppStartup`/`EditorRuntime::finalize_shutdown`
//! translated from "restore the terminal" to "close the connection".

use crate::error::SessionError;
use crate::reader::{InputEvent, ReaderTask};
use crate::telemetry;
use crate::writer::Writer;
use canvas_context::{ContextHandles, DrawContext, PendingImageLoads, PendingQueries, QuitSignal};
use canvas_wire::{Color, Command, CursorStyle, EventMask, PROTOCOL_VERSION};
use futures_util::SinkExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{channel, Receiver};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::info;

/// Initial canvas state sent as the `Configure` frame before anything else.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub background: Color,
    pub event_mask: EventMask,
    pub cursor: CursorStyle,
    /// Capacity of the bounded input channel. Defaults to a small constant (16) —
    /// enough to absorb a burst of input events without buffering unboundedly.
    pub input_channel_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: String::from("canvas"),
            background: Color::WHITE,
            event_mask: EventMask::all(),
            cursor: CursorStyle::Default,
            input_channel_capacity: 16,
        }
    }
}

/// A single WebSocket connection, already upgraded, not yet handed to user code.
pub struct Session<S> {
    draw: DrawContext<Writer<S>>,
    input_rx: Receiver<InputEvent>,
    quit: QuitSignal,
    reader_handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    pending_queries: Arc<PendingQueries>,
    canvas_size: Arc<Mutex<(u32, u32)>>,
    telemetry_start: telemetry::Snapshot,
}

/// Everything the user's entry function needs, owned outright so it can be carried
/// across await points with no borrow back into `Session`.
pub struct SessionContext<S> {
    draw: DrawContext<Writer<S>>,
    input_rx: Receiver<InputEvent>,
    quit: QuitSignal,
    canvas_size: Arc<Mutex<(u32, u32)>>,
}

impl<S> SessionContext<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn draw_context(&mut self) -> &mut DrawContext<Writer<S>> {
        &mut self.draw
    }

    /// Receives the next forwarded browser event, or `None` once the reader task has
    /// stopped and the channel has drained.
    pub async fn next_event(&mut self) -> Option<InputEvent> {
        self.input_rx.recv().await
    }

    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }

    /// Current canvas dimensions: the server-configured size until the first
    /// `Resize` event arrives, the last seen resize after that.
    pub fn canvas_size(&self) -> (u32, u32) {
        *self.canvas_size.lock().unwrap()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Completes the startup handshake (version byte, then `Configure`) and spawns
    /// the reader task. `stream` must already be a successfully upgraded WebSocket.
    pub async fn start(
        mut stream: WebSocketStream<S>,
        options: SessionOptions,
    ) -> anyhow::Result<Self> {
        stream
            .send(Message::Binary(vec![PROTOCOL_VERSION].into()))
            .await?;

        let telemetry_start = telemetry::snapshot();
        let (sink, stream) = futures_util::StreamExt::split(stream);
        let writer = Arc::new(Writer::new(sink));
        let pending_queries = Arc::new(PendingQueries::new());
        let pending_image_loads = Arc::new(PendingImageLoads::new());
        let image_dims = Arc::new(Mutex::new(HashMap::new()));
        let quit = QuitSignal::new();

        let handles = ContextHandles {
            writer: writer.clone(),
            pending_queries: pending_queries.clone(),
            pending_image_loads: pending_image_loads.clone(),
            image_dims: image_dims.clone(),
            quit: quit.clone(),
        };
        let draw = DrawContext::new(handles);

        let mut configure_bytes = Vec::new();
        Command::Configure {
            width: options.width,
            height: options.height,
            title: options.title.clone(),
            background: options.background,
            event_mask: options.event_mask,
            cursor: options.cursor,
        }
        .encode(&mut configure_bytes);
        writer.send_frame(configure_bytes).await?;

        let canvas_size = Arc::new(Mutex::new((options.width, options.height)));
        let (input_tx, input_rx) = channel(options.input_channel_capacity.max(1));
        let reader = ReaderTask::new(
            stream,
            quit.clone(),
            input_tx,
            pending_queries.clone(),
            pending_image_loads,
            image_dims,
            canvas_size.clone(),
        );
        let reader_handle = tokio::spawn(reader.run());

        Ok(Self {
            draw,
            input_rx,
            quit,
            reader_handle,
            pending_queries,
            canvas_size,
            telemetry_start,
        })
    }

    /// Runs `entry` as the user task, then tears the session down regardless of how
    /// `entry` completes. Mirrors `finalize_shutdown`'s staged teardown: signal
    /// quit, drop the input receiver (via `ctx` going out of scope when `entry`
    /// returns), join the reader with a timeout, log each stage.
    pub async fn run<F, Fut>(self, entry: F) -> anyhow::Result<()>
    where
        F: FnOnce(SessionContext<S>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let Session {
            draw,
            input_rx,
            quit,
            reader_handle,
            pending_queries,
            canvas_size,
            telemetry_start,
        } = self;
        let ctx = SessionContext {
            draw,
            input_rx,
            quit: quit.clone(),
            canvas_size,
        };

        let result = entry(ctx).await;

        let result = match result {
            Err(err) => match err.downcast::<canvas_context::IdSpaceExhausted>() {
                Ok(exhausted) => {
                    tracing::error!(target: "session.shutdown", kind = ?exhausted.kind, "id_space_exhausted");
                    Err(SessionError::IdSpaceExhausted(exhausted.kind).into())
                }
                Err(err) => Err(err),
            },
            Ok(()) => Ok(()),
        };

        info!(target: "session.shutdown", "begin");
        quit.signal();

        match tokio::time::timeout(std::time::Duration::from_millis(500), reader_handle).await {
            Ok(Ok(Ok(()))) => info!(target: "session.shutdown", "reader_joined"),
            Ok(Ok(Err(err))) => {
                tracing::warn!(target: "session.shutdown", %err, "reader_ended_with_error")
            }
            Ok(Err(join_err)) => {
                tracing::error!(target: "session.shutdown", ?join_err, "reader_task_panicked")
            }
            Err(_) => tracing::warn!(target: "session.shutdown", "reader_join_timeout"),
        }

        // The counters in `telemetry` are process-wide, so a concurrent session's
        // traffic would otherwise bleed into this line; subtracting the snapshot
        // taken at `start` isolates just what this session did.
        let snapshot = telemetry::snapshot().since(&telemetry_start);
        let queries_issued = pending_queries.issued_count();
        info!(target: "session.shutdown", ?snapshot, queries_issued, "complete");
        result
    }
}
