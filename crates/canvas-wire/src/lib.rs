//! Binary wire codec shared by the server and the browser-side shim.
//!
//! Everything in this crate is pure, synchronous, and allocation-only: no I/O, no
//! async runtime. [`canvas_session`](../canvas_session/index.html) owns framing the
//! byte stream over a transport; this crate only owns turning typed values into bytes
//! and back.

pub mod command;
pub mod enums;
pub mod event;
pub mod primitives;
pub mod resource;

pub use command::{Command, EventMask, Opcode, PROTOCOL_VERSION};
pub use enums::{
    CompositeOperation, CursorStyle, Direction, FillRule, ImageSmoothingQuality, LineCap,
    LineJoin, PatternRepetition, TextAlign, TextBaseline,
};
pub use event::{ClientEvent, Modifiers, MouseButtons, Touch};
pub use resource::{ResourceId, ResourceKind};

/// An RGBA color, one byte per channel. Carried inline in commands rather than as a
/// resource because colors never need the browser to hold onto an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

/// Every way decoding a frame can fail. Any variant here means the peer sent a
/// malformed frame; the session layer treats all of them as fatal for that connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("frame truncated")]
    Truncated,
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,
    #[error("bad value {value} for enum field {field}")]
    BadEnum { field: &'static str, value: u8 },
}
