//! Lazily recomputed frame margins.

use std::cell::Cell;

use crate::geometry::Margins;

/// Frame margins cached against an invalidation token.
///
/// Every operation that can change a window's style or state bumps the
/// token. The next read recomputes the margins once and caches them under
/// the current token.
#[derive(Debug, Default)]
pub struct FrameCache {
    token: Cell<u64>,
    cached: Cell<Option<(u64, Margins)>>,
}

impl FrameCache {
    /// An empty cache that computes on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the cached margins stale.
    pub fn invalidate(&self) {
        self.token.set(self.token.get().wrapping_add(1));
    }

    /// Whether the next lookup recomputes the margins.
    pub fn is_dirty(&self) -> bool {
        !matches!(self.cached.get(), Some((token, _)) if token == self.token.get())
    }

    /// Returns the cached margins, computing them first if stale.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> Margins) -> Margins {
        let token = self.token.get();
        if let Some((cached_token, margins)) = self.cached.get() {
            if cached_token == token {
                return margins;
            }
        }
        let margins = compute();
        // A re-entrant invalidation during `compute` leaves the result stale.
        self.cached.set(Some((token, margins)));
        margins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_per_token() {
        let cache = FrameCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Margins::uniform(3)
        };
        assert!(cache.is_dirty());
        assert_eq!(cache.get_or_compute(compute), Margins::uniform(3));
        assert_eq!(cache.get_or_compute(compute), Margins::uniform(3));
        assert_eq!(calls.get(), 1);
        assert!(!cache.is_dirty());

        cache.invalidate();
        assert!(cache.is_dirty());
        cache.get_or_compute(compute);
        assert_eq!(calls.get(), 2);
    }
}
