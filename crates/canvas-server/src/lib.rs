//! Remote 2D canvas drawing server: binds a port, upgrades browser connections to
//! canvas sessions, and hands each one to a user-supplied entry function.

pub mod config;
pub mod listener;

pub use canvas_context::DrawContext;
pub use canvas_session::{InputEvent, SessionContext, SessionOptions};
pub use canvas_wire::{ClientEvent, Color, Command};
pub use config::{Args, ServerConfig};
pub use listener::Listener;
