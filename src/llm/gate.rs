//! Single-flight guard for the ask action.
//!
//! Each asking client (a dashboard page, the CLI) has at most one question
//! in flight. A second ask from the same client that arrives while its first
//! is still pending is turned away immediately instead of queueing behind it.
//! Other clients are not affected.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct AskGate {
    in_flight: Mutex<HashSet<String>>,
}

/// Held for the duration of one request; releases its client's slot on drop.
#[derive(Debug)]
pub struct AskPermit<'a> {
    gate: &'a AskGate,
    client: String,
}

impl AskGate {
    pub fn new() -> Self {
        Self::default()
    }

    // The set stays consistent even if a holder panicked, so poisoning is ignored.
    fn slots(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for `client`, or `None` if that client already has a
    /// request in flight.
    pub fn try_acquire(&self, client: &str) -> Option<AskPermit<'_>> {
        if !self.slots().insert(client.to_string()) {
            return None;
        }
        Some(AskPermit {
            gate: self,
            client: client.to_string(),
        })
    }

    /// Whether `client` has a request in flight.
    pub fn is_busy_for(&self, client: &str) -> bool {
        self.slots().contains(client)
    }

    /// Whether any client has a request in flight.
    pub fn is_busy(&self) -> bool {
        !self.slots().is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.slots().len()
    }
}

impl Drop for AskPermit<'_> {
    fn drop(&mut self) {
        self.gate.slots().remove(&self.client);
    }
}
