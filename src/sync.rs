//! GPU synchronization primitives.
//!
//! Three primitives coordinate work at different boundaries:
//!
//! | Primitive | Boundary | Purpose |
//! |-----------|----------|---------|
//! | [`Fence`] | GPU → CPU | Block the CPU until a submitted batch finished |
//! | [`Semaphore`] | GPU → GPU | Order one submission's start after another's completion |
//! | [`TimelineSemaphore`] | GPU → GPU/CPU | Monotonic counter sequencing a chain of submissions |
//!
//! The types here carry the CPU-visible state; a real GPU backend would hold
//! the corresponding native handle alongside it and signal through the same
//! methods when device work completes. The in-tree queue signals eagerly at
//! submit time, which keeps every ordering contract observable from tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Status of a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The fence has not yet been signaled.
    Unsignaled,
    /// The fence has been signaled.
    Signaled,
}

/// CPU-GPU synchronization primitive.
///
/// A fence starts life signaled so the first frame through a slot never
/// blocks, mirroring how command submission loops create their fences.
/// [`wait`](Self::wait) returns immediately while the fence stays signaled;
/// it only blocks after a [`reset`](Self::reset) that has not been followed
/// by a [`signal`](Self::signal).
#[derive(Debug)]
pub struct Fence {
    label: String,
    signaled: Arc<AtomicBool>,
}

impl Fence {
    /// Create a fence in the signaled state.
    pub fn new_signaled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            signaled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a fence in the unsignaled state.
    pub fn new_unsignaled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            signaled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check the current status of the fence.
    pub fn status(&self) -> FenceStatus {
        if self.signaled.load(Ordering::Acquire) {
            FenceStatus::Signaled
        } else {
            FenceStatus::Unsignaled
        }
    }

    /// Check if the fence is signaled (non-blocking).
    pub fn is_signaled(&self) -> bool {
        self.status() == FenceStatus::Signaled
    }

    /// Block the calling thread until the fence is signaled.
    ///
    /// Returns immediately if already signaled. Fences remain signaled until
    /// reset, so repeated waits without an intervening reset do not block.
    pub fn wait(&self) {
        while !self.signaled.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }

    /// Wait for the fence with a timeout.
    ///
    /// Returns `true` if the fence was signaled, `false` if the timeout
    /// elapsed first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while !self.signaled.load(Ordering::Acquire) {
            if start.elapsed() >= timeout {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// Reset the fence to the unsignaled state.
    ///
    /// Must only be called once the work guarded by this fence has been
    /// observed complete.
    pub fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    /// Signal the fence.
    ///
    /// Called by the queue when the guarded submission completes.
    pub fn signal(&self) {
        self.signaled.store(true, Ordering::Release);
    }
}

/// GPU-GPU synchronization primitive for ordering submissions.
///
/// A binary semaphore is signaled by one submission and waited on by another.
/// The CPU-visible signal counter exists for validation: it records how many
/// times the semaphore has been signaled over its lifetime.
#[derive(Debug)]
pub struct Semaphore {
    label: String,
    signal_count: AtomicU64,
}

impl Semaphore {
    /// Create a new semaphore.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            signal_count: AtomicU64::new(0),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of times this semaphore has been signaled.
    pub fn signal_count(&self) -> u64 {
        self.signal_count.load(Ordering::Acquire)
    }

    /// Record a signal operation.
    pub fn signal(&self) {
        self.signal_count.fetch_add(1, Ordering::AcqRel);
    }
}

/// Monotonically increasing semaphore sequencing a chain of submissions.
///
/// Each submission in a frame waits for the previous value and signals the
/// next, so the chain's current value also tells an observer how many
/// submissions of the frame have retired.
#[derive(Debug)]
pub struct TimelineSemaphore {
    label: String,
    value: AtomicU64,
}

impl TimelineSemaphore {
    /// Create a new timeline semaphore with value 0.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: AtomicU64::new(0),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current counter value.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advance the counter to `value`.
    ///
    /// Timeline values only move forward; signaling a lower value is ignored.
    pub fn signal(&self, value: u64) {
        self.value.fetch_max(value, Ordering::AcqRel);
    }

    /// Block until the counter reaches at least `value`.
    pub fn wait(&self, value: u64) {
        while self.value.load(Ordering::Acquire) < value {
            std::hint::spin_loop();
        }
    }
}
