//! Queue entry wrapping a submitted payload

/// A submitted item waiting for delivery.
#[derive(Debug)]
pub(crate) struct QueueEntry<T> {
    pub(crate) payload: T,
    /// Close the pause gate as this entry is delivered
    pub(crate) stop_after: bool,
    /// Reset generation the entry was submitted under
    pub(crate) generation: u64,
}

impl<T> QueueEntry<T> {
    pub(crate) fn new(payload: T, stop_after: bool, generation: u64) -> Self {
        Self {
            payload,
            stop_after,
            generation,
        }
    }

    /// Whether a `reset()` happened after this entry was submitted
    #[inline]
    pub(crate) fn is_stale(&self, current_generation: u64) -> bool {
        self.generation < current_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_generation() {
        let entry = QueueEntry::new("a", false, 3);
        assert!(!entry.is_stale(3));
        assert!(entry.is_stale(4));
    }
}
