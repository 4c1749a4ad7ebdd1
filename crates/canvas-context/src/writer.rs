//! The seam between [`DrawContext`](crate::DrawContext) and whatever owns the real
//! transport. `canvas-session` implements this for its WebSocket writer; tests
//! implement it for an in-memory `Vec<u8>` sink. Keeping this a plain trait (rather
//! than `DrawContext` depending on `canvas-session` directly) avoids the circular
//! crate dependency that would otherwise exist, since the session crate needs
//! `DrawContext` itself.

use std::future::Future;

pub trait FrameWriter: Send + Sync + 'static {
    /// Send one complete, already-encoded frame. Implementations must preserve call
    /// order — the outbound stream is a concatenation of whole frames — and should
    /// serialize concurrent callers rather than interleave partial writes.
    fn send_frame(&self, bytes: Vec<u8>) -> impl Future<Output = anyhow::Result<()>> + Send;
}
