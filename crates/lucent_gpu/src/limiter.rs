//! Bounded in-flight upload tracking
//!
//! At most [`MAX_IN_FLIGHT`] capture uploads may be queued on the GPU at
//! once, one per staging buffer. Acquiring never waits: when every slot is
//! busy the caller keeps showing the previous frame's texture instead.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Staging buffers per capturer, and therefore uploads in flight
pub const MAX_IN_FLIGHT: usize = 3;

/// Counting limiter plus the list of staging slots not currently in use
#[derive(Debug)]
pub struct InFlightLimiter {
    permits: Arc<Semaphore>,
    free: Arc<Mutex<Vec<usize>>>,
    capacity: usize,
}

impl InFlightLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            // Popped from the back, so slot 0 is handed out first
            free: Arc::new(Mutex::new((0..capacity).rev().collect())),
            capacity,
        }
    }

    /// Claim a slot without waiting
    pub fn try_acquire(&self) -> Option<InFlightSlot> {
        let permit = Arc::clone(&self.permits).try_acquire_owned().ok()?;
        let index = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()?;
        Some(InFlightSlot {
            index,
            free: Arc::clone(&self.free),
            _permit: permit,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently claimed
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }
}

impl Default for InFlightLimiter {
    fn default() -> Self {
        Self::new(MAX_IN_FLIGHT)
    }
}

/// A claimed staging slot; returned to the limiter when dropped.
///
/// Uploads move the slot into the GPU completion callback, which may run on
/// any thread.
#[derive(Debug)]
pub struct InFlightSlot {
    index: usize,
    free: Arc<Mutex<Vec<usize>>>,
    _permit: OwnedSemaphorePermit,
}

impl InFlightSlot {
    /// Which staging buffer this slot owns
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        // The index goes back before the permit is released
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_more_than_capacity() {
        let limiter = InFlightLimiter::default();
        let a = limiter.try_acquire().unwrap();
        let b = limiter.try_acquire().unwrap();
        let c = limiter.try_acquire().unwrap();
        assert_eq!(limiter.in_flight(), 3);
        assert!(limiter.try_acquire().is_none());

        let mut indices = [a.index(), b.index(), c.index()];
        indices.sort_unstable();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_drop_returns_slot() {
        let limiter = InFlightLimiter::default();
        let mut slots: Vec<_> = (0..3).map(|_| limiter.try_acquire().unwrap()).collect();
        let middle = slots.remove(1);
        let index = middle.index();
        drop(middle);
        assert_eq!(limiter.in_flight(), 2);
        assert_eq!(limiter.try_acquire().unwrap().index(), index);

        drop(slots);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn test_release_from_other_thread() {
        let limiter = InFlightLimiter::new(1);
        let slot = limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_none());

        std::thread::spawn(move || drop(slot)).join().unwrap();
        assert!(limiter.try_acquire().is_some());
    }
}
