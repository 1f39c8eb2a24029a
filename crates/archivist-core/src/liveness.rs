//! Liveness of the view that started a remote call
//!
//! Remote calls are never cancelled. When they finish, their results are
//! applied only if the owning view is still alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag, alive until torn down. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn tear_down(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Guard that tears the flag down when dropped
    pub fn guard(&self) -> TeardownGuard {
        TeardownGuard {
            liveness: self.clone(),
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a view for as long as it lives
#[derive(Debug)]
pub struct TeardownGuard {
    liveness: Liveness,
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.liveness.tear_down();
    }
}
