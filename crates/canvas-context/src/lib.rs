//! The drawing API and resource bookkeeping layered over the wire codec.
//!
//! This crate knows nothing about transports: [`DrawContext`] is generic over a
//! [`FrameWriter`] the session crate supplies, so it can be exercised in tests with
//! an in-memory sink and in production with a real WebSocket.

pub mod context;
pub mod handle;
pub mod query;
pub mod quit;
pub mod registry;
pub mod writer;

pub use context::{ContextHandles, DrawContext};
pub use handle::{GradientHandle, ImageDataHandle, ImageHandle, PatternHandle, ReleaseSink};
pub use query::{ImageDataResult, ImageLoadOutcome, PendingImageLoads, PendingQueries, TextMetrics};
pub use quit::QuitSignal;
pub use registry::{IdSpaceExhausted, ResourceRegistry};
pub use writer::FrameWriter;
