//! One-shot gating of the tracking pipeline.

use std::sync::atomic::{AtomicBool, Ordering};

/// The gate's two states. `Tracked` is terminal for the owning page
/// instance; a fresh instance constructs a fresh gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NotYetTracked,
    Tracked,
}

/// Guards the pipeline so it runs at most once per page-instance
/// lifetime. The transition happens synchronously in [`try_acquire`],
/// so callers that check the gate before spawning any asynchronous work
/// cannot double-run even under rapid re-invocation.
///
/// [`try_acquire`]: SessionGate::try_acquire
#[derive(Debug, Default)]
pub struct SessionGate {
    tracked: AtomicBool,
}

impl SessionGate {
    /// Creates a gate in the `NotYetTracked` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate. Returns `true` for exactly one caller over the
    /// gate's lifetime.
    pub fn try_acquire(&self) -> bool {
        !self.tracked.swap(true, Ordering::SeqCst)
    }

    /// The gate's current state.
    pub fn state(&self) -> GateState {
        if self.tracked.load(Ordering::SeqCst) {
            GateState::Tracked
        } else {
            GateState::NotYetTracked
        }
    }
}
