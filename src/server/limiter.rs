//! Bound on concurrently served connections

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Hands out one permit per live connection
#[derive(Clone)]
pub struct ConnectionLimiter {
    semaphore: Arc<Semaphore>,
    max_connections: usize,
}

impl ConnectionLimiter {
    /// Create a limiter admitting up to `max_connections` connections
    ///
    /// # Panics
    ///
    /// Panics if `max_connections` is 0
    #[must_use]
    pub fn new(max_connections: usize) -> Self {
        assert!(max_connections > 0, "max_connections must be > 0");

        Self {
            semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Admit a connection, or `None` when the limit is reached
    ///
    /// The slot is released when the returned permit is dropped.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok()
    }

    /// Number of connections currently admitted
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.max_connections - self.semaphore.available_permits()
    }

    /// Configured limit
    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_basic() {
        let limiter = ConnectionLimiter::new(2);

        assert_eq!(limiter.active_connections(), 0);
        assert_eq!(limiter.max_connections(), 2);
    }

    #[test]
    fn test_limiter_full() {
        let limiter = ConnectionLimiter::new(2);

        let _first = limiter.try_acquire().unwrap();
        let _second = limiter.try_acquire().unwrap();

        assert_eq!(limiter.active_connections(), 2);
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn test_limiter_release() {
        let limiter = ConnectionLimiter::new(1);

        {
            let _permit = limiter.try_acquire().unwrap();
            assert_eq!(limiter.active_connections(), 1);
        }

        assert_eq!(limiter.active_connections(), 0);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    #[should_panic(expected = "max_connections must be > 0")]
    fn test_limiter_zero_panic() {
        let _ = ConnectionLimiter::new(0);
    }
}
