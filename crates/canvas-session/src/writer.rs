//! Outbound half of the session transport.
//!
//! Wraps the WebSocket sink behind a `tokio::sync::Mutex`, the same shape
//! `core_render::writer::Writer` uses for its own flush-under-lock discipline,
//! generalized from "exclusive access to stdout" to "exclusive access to the
//! socket". Every `DrawContext::flush` and query call goes through
//! [`send_frame`](Writer::send_frame), which is what keeps the outbound byte stream
//! a clean concatenation of whole frames even with multiple tasks drawing.

use crate::telemetry::FRAMES_SENT;
use canvas_context::FrameWriter;
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::sync::atomic::Ordering;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub struct Writer<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
}

impl<S> Writer<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(sink: SplitSink<WebSocketStream<S>, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

impl<S> FrameWriter for Writer<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_frame(&self, bytes: Vec<u8>) -> anyhow::Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Binary(bytes.into())).await?;
        FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
