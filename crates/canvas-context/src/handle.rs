//! RAII handles to browser-resident resources.
//!
//! Modeled on `core_terminal::TerminalGuard`: holding the handle is the only way to
//! reference the resource, and dropping it restores the browser to the state it was
//! in before the resource existed (here: freeing the id) rather than leaving it
//! around until the session ends.

use canvas_wire::{Command, ResourceId, ResourceKind};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// The sink a handle sends its release command into on drop. Cloned cheaply and
/// shared between every handle a [`DrawContext`](crate::DrawContext) creates; the
/// context drains it each flush and appends any pending releases to the outbound
/// buffer ahead of whatever the caller just drew.
#[derive(Clone)]
pub struct ReleaseSink {
    tx: UnboundedSender<Command>,
}

impl ReleaseSink {
    pub fn new(tx: UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    fn release(&self, kind: ResourceKind, id: ResourceId) {
        // Closed receiver means the session already tore down; nothing left to tell.
        let _ = self.tx.send(Command::ReleaseResource { kind, id });
    }
}

macro_rules! resource_handle {
    ($name:ident, $kind:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name {
            id: Option<ResourceId>,
            sink: ReleaseSink,
        }

        impl $name {
            pub(crate) fn new(id: ResourceId, sink: ReleaseSink) -> Self {
                Self { id: Some(id), sink }
            }

            pub fn id(&self) -> ResourceId {
                self.id.expect("handle used after release")
            }

            /// Release the resource early instead of waiting for drop. Consumes the
            /// handle so no further use is possible.
            pub fn release(mut self) {
                if let Some(id) = self.id.take() {
                    self.sink.release($kind, id);
                }
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                if let Some(id) = self.id.take() {
                    self.sink.release($kind, id);
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).field("id", &self.id).finish()
            }
        }
    };
}

resource_handle!(
    ImageDataHandle,
    ResourceKind::ImageData,
    "Handle to a `createImageData`/`getImageData` pixel buffer."
);
resource_handle!(GradientHandle, ResourceKind::Gradient, "Handle to a linear or radial gradient.");
resource_handle!(PatternHandle, ResourceKind::Pattern, "Handle to a tiling pattern.");

/// Handle to a decoded `<img>`-like resource.
///
/// Unlike the other handle kinds, an image has dimensions the caller may need before
/// it has had a chance to `wait_loaded`. The reader task writes them into `dims` the
/// moment the `ImageLoaded` reply arrives, independent of whether anyone is awaiting
/// the load outcome.
pub struct ImageHandle {
    id: Option<ResourceId>,
    sink: ReleaseSink,
    dims: Arc<Mutex<(u32, u32)>>,
}

impl ImageHandle {
    pub(crate) fn new(id: ResourceId, sink: ReleaseSink, dims: Arc<Mutex<(u32, u32)>>) -> Self {
        Self {
            id: Some(id),
            sink,
            dims,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id.expect("handle used after release")
    }

    /// Zero until the `ImageLoaded` reply has been observed.
    pub fn width(&self) -> u32 {
        self.dims.lock().unwrap().0
    }

    /// Zero until the `ImageLoaded` reply has been observed.
    pub fn height(&self) -> u32 {
        self.dims.lock().unwrap().1
    }

    pub fn release(mut self) {
        if let Some(id) = self.id.take() {
            self.sink.release(ResourceKind::Image, id);
        }
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.sink.release(ResourceKind::Image, id);
        }
    }
}

impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("dims", &*self.dims.lock().unwrap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_emits_release_command() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ReleaseSink::new(tx);
        {
            let _handle = ImageHandle::new(ResourceId(3), sink, Arc::new(Mutex::new((0, 0))));
        }
        let cmd = rx.try_recv().unwrap();
        assert_eq!(
            cmd,
            Command::ReleaseResource {
                kind: ResourceKind::Image,
                id: ResourceId(3),
            }
        );
    }

    #[test]
    fn explicit_release_does_not_double_send() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ReleaseSink::new(tx);
        let handle = GradientHandle::new(ResourceId(1), sink);
        handle.release();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
