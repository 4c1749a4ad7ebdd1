//! Narrow, matchable errors for the paths callers are expected to branch on. Every
//! other fallible session operation returns a plain `anyhow::Result`.

/// Failure kind for a session that has gone fatally wrong: a transport drop, a
/// malformed frame from the peer, or resource id space exhaustion. Exists so code
/// that inspects a session-ending `anyhow::Error` (e.g. via `downcast_ref`) can
/// distinguish "the peer disconnected" from "the peer sent garbage" if it wants to.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("decode error: {0}")]
    Decode(#[from] canvas_wire::DecodeError),
    #[error("resource id space exhausted for {0:?}")]
    IdSpaceExhausted(canvas_wire::ResourceKind),
}
