use crate::core::member::GroupId;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Outcome of asking to recompute a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// This caller runs the computation and must later call `complete`
    /// (or `release` on failure).
    Lead,
    /// Another caller was already computing; it has published by now and
    /// the result can be read back, possibly one sequence behind.
    Follow,
}

#[derive(Debug, Default)]
struct Flight {
    running: bool,
    /// Newest sequence requested while the leader was computing. A newer
    /// request replaces an older one outright: recomputation is a pure
    /// function of ledger state, so only the latest needs to run.
    pending: Option<u64>,
}

/// Per-group single-flight coordination for recomputations.
///
/// At most one computation per group is in flight at a time. Callers that
/// arrive while one is running register the sequence they want and block
/// until the leader publishes; the queue holds at most one pending
/// request, with newer arrivals superseding older ones. The leader drains
/// that slot before letting go.
#[derive(Debug, Default)]
pub struct RecomputeGate {
    flights: Mutex<HashMap<GroupId, Flight>>,
    released: Condvar,
}

impl RecomputeGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GroupId, Flight>> {
        self.flights.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ask to recompute `group` at ledger sequence `sequence`.
    ///
    /// The first caller for an idle group leads. Anyone arriving while a
    /// computation runs registers `sequence` (newest wins) and blocks
    /// until the leader releases the group.
    pub fn begin(&self, group: &GroupId, sequence: u64) -> Admission {
        let mut flights = self.lock();
        {
            let flight = flights.entry(group.clone()).or_default();
            if !flight.running {
                flight.running = true;
                return Admission::Lead;
            }
            flight.pending = Some(flight.pending.map_or(sequence, |p| p.max(sequence)));
        }
        while flights.get(group).map(|f| f.running).unwrap_or(false) {
            flights = self.released.wait(flights).unwrap_or_else(|e| e.into_inner());
        }
        Admission::Follow
    }

    /// Report a finished computation.
    ///
    /// If a newer request queued up meanwhile, leadership is retained and
    /// its sequence returned — the caller computes again. Otherwise the
    /// group is released and waiting followers wake up.
    pub fn complete(&self, group: &GroupId) -> Option<u64> {
        let mut flights = self.lock();
        let pending = flights.get_mut(group).and_then(|flight| {
            let pending = flight.pending.take();
            if pending.is_none() {
                flight.running = false;
            }
            pending
        });
        if pending.is_none() {
            self.released.notify_all();
        }
        pending
    }

    /// Release the group unconditionally, dropping any pending request.
    /// For failure paths where the leader cannot keep computing.
    pub fn release(&self, group: &GroupId) {
        let mut flights = self.lock();
        if let Some(flight) = flights.get_mut(group) {
            flight.running = false;
            flight.pending = None;
        }
        self.released.notify_all();
    }

    #[cfg(test)]
    fn pending_of(&self, group: &GroupId) -> Option<u64> {
        self.lock().get(group).and_then(|f| f.pending)
    }

    #[cfg(test)]
    fn is_running(&self, group: &GroupId) -> bool {
        self.lock().get(group).map(|f| f.running).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn group(id: &str) -> GroupId {
        GroupId::new(id)
    }

    #[test]
    fn test_first_caller_leads() {
        let gate = RecomputeGate::new();
        let g = group("trip");
        assert_eq!(gate.begin(&g, 1), Admission::Lead);
        assert!(gate.is_running(&g));
        assert_eq!(gate.complete(&g), None);
        assert!(!gate.is_running(&g));
    }

    #[test]
    fn test_groups_are_independent() {
        let gate = RecomputeGate::new();
        assert_eq!(gate.begin(&group("trip"), 1), Admission::Lead);
        assert_eq!(gate.begin(&group("flat"), 1), Admission::Lead);
        gate.release(&group("trip"));
        gate.release(&group("flat"));
    }

    #[test]
    fn test_follower_blocks_until_release() {
        let gate = Arc::new(RecomputeGate::new());
        let g = group("trip");
        assert_eq!(gate.begin(&g, 1), Admission::Lead);

        let follower = {
            let gate = Arc::clone(&gate);
            let g = g.clone();
            thread::spawn(move || gate.begin(&g, 2))
        };

        // Wait until the follower has registered its request.
        while gate.pending_of(&g) != Some(2) {
            thread::yield_now();
        }

        assert_eq!(gate.complete(&g), Some(2));
        // Leadership retained for the rerun; follower still waits.
        assert!(gate.is_running(&g));
        assert_eq!(gate.complete(&g), None);

        assert_eq!(follower.join().unwrap(), Admission::Follow);
    }

    #[test]
    fn test_newer_request_supersedes_pending() {
        let gate = Arc::new(RecomputeGate::new());
        let g = group("trip");
        assert_eq!(gate.begin(&g, 1), Admission::Lead);

        let first = {
            let gate = Arc::clone(&gate);
            let g = g.clone();
            thread::spawn(move || gate.begin(&g, 5))
        };
        while gate.pending_of(&g) != Some(5) {
            thread::yield_now();
        }

        let second = {
            let gate = Arc::clone(&gate);
            let g = g.clone();
            thread::spawn(move || gate.begin(&g, 7))
        };
        while gate.pending_of(&g) != Some(7) {
            thread::yield_now();
        }

        // Only the newest queued sequence survives.
        assert_eq!(gate.complete(&g), Some(7));
        assert_eq!(gate.complete(&g), None);

        assert_eq!(first.join().unwrap(), Admission::Follow);
        assert_eq!(second.join().unwrap(), Admission::Follow);
    }

    #[test]
    fn test_release_drops_pending() {
        let gate = Arc::new(RecomputeGate::new());
        let g = group("trip");
        assert_eq!(gate.begin(&g, 1), Admission::Lead);

        let follower = {
            let gate = Arc::clone(&gate);
            let g = g.clone();
            thread::spawn(move || gate.begin(&g, 2))
        };
        while gate.pending_of(&g) != Some(2) {
            thread::yield_now();
        }

        gate.release(&g);
        assert_eq!(follower.join().unwrap(), Admission::Follow);
        assert_eq!(gate.complete(&g), None);
    }
}
