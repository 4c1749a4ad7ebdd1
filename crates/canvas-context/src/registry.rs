//! Per-kind resource ID allocation.
//!
//! Each [`ResourceKind`] gets its own monotonic counter so an image and a gradient
//! can both be "id 0" without colliding — the kind tag in [`ResourceId`]'s owning
//! [`Command`](canvas_wire::Command) disambiguates them on the wire.

use canvas_wire::{ResourceId, ResourceKind};

/// Raised when a kind's counter has handed out `u32::MAX` ids. The session treats
/// this as fatal rather than wrapping, since a wrapped id could alias a still-live
/// resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("resource id space exhausted for {kind:?}")]
pub struct IdSpaceExhausted {
    pub kind: ResourceKind,
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    next_image: u32,
    next_image_data: u32,
    next_gradient: u32,
    next_pattern: u32,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Image => &mut self.next_image,
            ResourceKind::ImageData => &mut self.next_image_data,
            ResourceKind::Gradient => &mut self.next_gradient,
            ResourceKind::Pattern => &mut self.next_pattern,
        }
    }

    /// Allocate the next id for `kind`. Ids within a kind are never reused, even
    /// after [`release`](Self::release) — a released id simply stays retired.
    pub fn alloc(&mut self, kind: ResourceKind) -> Result<ResourceId, IdSpaceExhausted> {
        let counter = self.counter(kind);
        if *counter == u32::MAX {
            return Err(IdSpaceExhausted { kind });
        }
        let id = ResourceId(*counter);
        *counter += 1;
        Ok(id)
    }

    /// Record that `id` is no longer in use. The registry does not track live ids
    /// itself (the browser owns object lifetime); this exists so callers have a
    /// single place to route release bookkeeping if they need it later.
    pub fn release(&mut self, _kind: ResourceKind, _id: ResourceId) {}

    /// Test-only: a registry with `kind`'s counter already at `u32::MAX`, so
    /// exhaustion can be exercised without four billion `alloc` calls.
    #[cfg(test)]
    pub(crate) fn exhausted(kind: ResourceKind) -> Self {
        let mut reg = Self::new();
        *reg.counter(kind) = u32::MAX;
        reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_independent_counters_per_kind() {
        let mut reg = ResourceRegistry::new();
        assert_eq!(reg.alloc(ResourceKind::Image).unwrap(), ResourceId(0));
        assert_eq!(reg.alloc(ResourceKind::Image).unwrap(), ResourceId(1));
        assert_eq!(reg.alloc(ResourceKind::Gradient).unwrap(), ResourceId(0));
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut reg = ResourceRegistry {
            next_pattern: u32::MAX,
            ..ResourceRegistry::new()
        };
        assert_eq!(
            reg.alloc(ResourceKind::Pattern),
            Err(IdSpaceExhausted {
                kind: ResourceKind::Pattern
            })
        );
    }
}
