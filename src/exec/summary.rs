//! The bulk-run result aggregator.
//!
//! A [`RunSummary`] is created at run start with the known item total,
//! updated after every executed unit, and finalized once into an
//! immutable [`SummaryPayload`]. The wall-clock start is constructor-time
//! state; nothing outside this module can touch it. The accumulator is
//! owned by the single sequential run loop, so no locking is involved.

use std::time::Instant;

use serde::Serialize;

use super::MutationCounters;

/// Mutable accumulator for one bulk run.
#[derive(Debug)]
pub struct RunSummary {
    total: usize,
    processed: usize,
    counters: MutationCounters,
    errors: usize,
    diagnostics: Vec<serde_json::Value>,
    started: Instant,
}

impl RunSummary {
    /// Starts a summary for a run of `total` declared items; captures
    /// the wall clock.
    pub fn new(total: usize) -> Self {
        RunSummary {
            total,
            processed: 0,
            counters: MutationCounters::default(),
            errors: 0,
            diagnostics: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Records one successfully executed unit covering `items` declared
    /// items.
    pub fn record(&mut self, items: usize, counters: &MutationCounters) {
        self.processed += items;
        self.counters.absorb(counters);
    }

    /// Records a per-item diagnostic for a failed unit.
    pub fn record_error(&mut self, diagnostic: serde_json::Value) {
        self.errors += 1;
        self.diagnostics.push(diagnostic);
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Freezes the accumulator into an immutable snapshot.
    pub fn finalize(self) -> SummaryPayload {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let changed = self.counters.changed();
        SummaryPayload {
            total: self.total,
            processed: self.processed,
            counters: self.counters,
            errors: self.errors,
            diagnostics: self.diagnostics,
            elapsed_ms,
            changed,
        }
    }
}

/// Immutable snapshot of a finished (or aborted) bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPayload {
    pub total: usize,
    pub processed: usize,
    pub counters: MutationCounters,
    pub errors: usize,
    pub diagnostics: Vec<serde_json::Value>,
    pub elapsed_ms: u64,
    pub changed: bool,
}
