//! Development-only counters.
//!
//! Injected into [`crate::Session`] in debug builds; production logic never
//! reads these. This replaces ad-hoc globals with an explicit surface that
//! tests and debugging tools can inspect.

#![cfg(debug_assertions)]

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Diagnostics {
    pub stale_workouts_collected: AtomicU64,
    pub cascade_deletes: AtomicU64,
    pub dates_repaired: AtomicU64,
}

impl Diagnostics {
    pub fn stale_workouts(&self) -> u64 {
        self.stale_workouts_collected.load(Ordering::Relaxed)
    }

    pub fn cascades(&self) -> u64 {
        self.cascade_deletes.load(Ordering::Relaxed)
    }
}
