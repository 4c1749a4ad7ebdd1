//! Plumbing that lets a query method (`measure_text`, `get_image_data`, ...) await a
//! reply the session's reader task receives on a completely different future.
//!
//! The maps here are the shared state between [`DrawContext`](crate::DrawContext) and
//! whatever owns the reader task (`canvas-session`); they carry no transport
//! knowledge themselves, which is what lets `canvas-context` stay free of a dependency
//! on the session crate.

use canvas_wire::{ClientEvent, ResourceId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Outcome of a `CreateImage` load, delivered once the browser finishes decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLoadOutcome {
    pub ok: bool,
    pub width: u32,
    pub height: u32,
}

/// Reply to `MeasureText`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub actual_bounding_box_ascent: f64,
    pub actual_bounding_box_descent: f64,
}

/// Reply to `GetImageData`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDataResult {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Allocates query ids and routes the matching reply event to whoever registered it.
///
/// Shared between the context that issues queries and the reader task that observes
/// replies; cloning is cheap (it's an `Arc` internally via the caller holding one).
#[derive(Default)]
pub struct PendingQueries {
    next_id: AtomicU32,
    pending: Mutex<HashMap<u32, oneshot::Sender<ClientEvent>>>,
}

impl PendingQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next query id and a receiver for its reply.
    pub fn register(&self) -> (u32, oneshot::Receiver<ClientEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);
        (id, rx)
    }

    /// Called by the reader task when a reply event with this query id arrives.
    /// Silently drops the reply if nobody is waiting (the query's future was
    /// cancelled, e.g. the session is shutting down).
    pub fn fulfill(&self, query_id: u32, event: ClientEvent) {
        if let Some(tx) = self.pending.lock().unwrap().remove(&query_id) {
            let _ = tx.send(event);
        }
    }

    /// Total queries registered over this context's lifetime. `next_id` is
    /// monotonic and zero-based, so its current value is exactly that count.
    pub fn issued_count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) as u64
    }
}

/// Routes `ImageLoaded` replies, keyed by resource id rather than a query id since a
/// load is fire-and-forget from the caller's point of view: the draw call that
/// kicks it off never blocks, only `wait_loaded` does.
#[derive(Default)]
pub struct PendingImageLoads {
    pending: Mutex<HashMap<ResourceId, oneshot::Sender<ImageLoadOutcome>>>,
}

impl PendingImageLoads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ResourceId) -> oneshot::Receiver<ImageLoadOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);
        rx
    }

    pub fn fulfill(&self, id: ResourceId, outcome: ImageLoadOutcome) {
        if let Some(tx) = self.pending.lock().unwrap().remove(&id) {
            let _ = tx.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_query_receives_its_reply() {
        let pending = PendingQueries::new();
        let (id, rx) = pending.register();
        pending.fulfill(
            id,
            ClientEvent::PointInPath {
                query_id: id,
                result: true,
            },
        );
        assert_eq!(
            rx.await.unwrap(),
            ClientEvent::PointInPath {
                query_id: id,
                result: true
            }
        );
    }

    #[tokio::test]
    async fn fulfilling_unknown_id_is_a_noop() {
        let pending = PendingQueries::new();
        pending.fulfill(
            999,
            ClientEvent::PointInPath {
                query_id: 999,
                result: false,
            },
        );
    }

    #[tokio::test]
    async fn image_load_routes_by_resource_id() {
        let pending = PendingImageLoads::new();
        let rx = pending.register(ResourceId(4));
        pending.fulfill(
            ResourceId(4),
            ImageLoadOutcome {
                ok: true,
                width: 16,
                height: 16,
            },
        );
        let outcome = rx.await.unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.width, 16);
    }
}
