//! Transport and lifecycle for one browser connection: the WebSocket handshake, the
//! reader/writer task pair, and staged shutdown. Built on the async-task vocabulary
//! `core-input`/`core-events` use for the terminal input pipeline, generalized from
//! a single stdin stream to a per-connection duplex socket.

pub mod error;
pub mod reader;
pub mod session;
pub mod telemetry;
pub mod writer;

pub use canvas_context::QuitSignal;
pub use error::SessionError;
pub use reader::InputEvent;
pub use session::{Session, SessionContext, SessionOptions};
pub use writer::Writer;
