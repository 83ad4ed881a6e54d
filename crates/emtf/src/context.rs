//! Read-only state shared by all pipeline stages for a whole run.

use crate::bank::PatternBank;
use crate::geometry::GeometryTables;
use crate::pipeline::recognition::PatternCache;

/// Geometry tables, pattern bank and the (zone, layer) match cache.
///
/// Built once before the first event; every stage borrows it immutably, so
/// it can be shared across sector worker threads without locking.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    tables: GeometryTables,
    bank: PatternBank,
    cache: PatternCache,
}

impl TriggerContext {
    /// Build tables and precompute the pattern cache for `phi_window`.
    pub fn new(bank: PatternBank, phi_window: i32) -> Self {
        let cache = PatternCache::build(&bank, phi_window);
        tracing::debug!(
            "Pattern cache: {} (zone, layer) cells, {} matches, window +/-{}",
            cache.n_cells(),
            cache.n_matches(),
            phi_window
        );
        Self {
            tables: GeometryTables::new(),
            bank,
            cache,
        }
    }

    pub fn tables(&self) -> &GeometryTables {
        &self.tables
    }

    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Rebuild the cache if `phi_window` differs from the one it was built for.
    pub(crate) fn ensure_window(&mut self, phi_window: i32) {
        if self.cache.window() != phi_window {
            self.cache = PatternCache::build(&self.bank, phi_window);
        }
    }
}
