//! Session-lifetime counters, in the style of `core_events`'s `ASYNC_INPUT_*` and
//! `CHANNEL_SEND_FAILURES` statics: simple, relaxed-ordering atomics inspectable in
//! tests and loggable at shutdown, with no external metrics dependency.
//!
//! Queries issued are tracked separately, by `canvas_context::PendingQueries`
//! itself (it has no way to reach these statics without a dependency cycle);
//! `Session::run` folds that count into the same shutdown log line.

use std::sync::atomic::AtomicU64;

pub static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
pub static FRAMES_RECEIVED: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SEND_BLOCKED: AtomicU64 = AtomicU64::new(0);

pub fn snapshot() -> Snapshot {
    use std::sync::atomic::Ordering::Relaxed;
    Snapshot {
        frames_sent: FRAMES_SENT.load(Relaxed),
        frames_received: FRAMES_RECEIVED.load(Relaxed),
        channel_send_blocked: CHANNEL_SEND_BLOCKED.load(Relaxed),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub channel_send_blocked: u64,
}

impl Snapshot {
    /// This snapshot minus an earlier one from the same process, e.g. to turn the
    /// process-wide counters into a per-session count: take one snapshot when a
    /// session starts, another at shutdown, and subtract. Saturates instead of
    /// wrapping, since a counter can only have grown between the two calls.
    pub fn since(&self, earlier: &Snapshot) -> Snapshot {
        Snapshot {
            frames_sent: self.frames_sent.saturating_sub(earlier.frames_sent),
            frames_received: self.frames_received.saturating_sub(earlier.frames_received),
            channel_send_blocked: self
                .channel_send_blocked
                .saturating_sub(earlier.channel_send_blocked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_subtracts_componentwise() {
        let earlier = Snapshot {
            frames_sent: 10,
            frames_received: 4,
            channel_send_blocked: 1,
        };
        let later = Snapshot {
            frames_sent: 15,
            frames_received: 4,
            channel_send_blocked: 3,
        };
        assert_eq!(
            later.since(&earlier),
            Snapshot {
                frames_sent: 5,
                frames_received: 0,
                channel_send_blocked: 2,
            }
        );
    }

    #[test]
    fn since_saturates_instead_of_wrapping() {
        let later = Snapshot::default();
        let earlier = Snapshot {
            frames_sent: 3,
            ..Snapshot::default()
        };
        assert_eq!(later.since(&earlier).frames_sent, 0);
    }
}
