//! Execution: the adapter seam, mutation counters, and the sequential
//! run orchestration.
//!
//! The crate never talks to a store directly. Callers supply an
//! [`ExecutionAdapter`] that runs one statement/bindings pair inside a
//! session or transaction and reports rows plus mutation counters;
//! session scope, timeouts, and cancellation all live behind that seam
//! and pass through unmodified.

mod runner;
mod summary;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use runner::{run_bulk, run_single, MutationPayload, RunFailure};
pub use summary::{RunSummary, SummaryPayload};

/// Mutation counters reported by the store for one executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCounters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub properties_set: u64,
    pub constraints_added: u64,
    pub constraints_removed: u64,
}

impl MutationCounters {
    /// Component-wise accumulation.
    pub fn absorb(&mut self, other: &MutationCounters) {
        self.nodes_created += other.nodes_created;
        self.nodes_deleted += other.nodes_deleted;
        self.relationships_created += other.relationships_created;
        self.relationships_deleted += other.relationships_deleted;
        self.labels_added += other.labels_added;
        self.labels_removed += other.labels_removed;
        self.properties_set += other.properties_set;
        self.constraints_added += other.constraints_added;
        self.constraints_removed += other.constraints_removed;
    }

    /// True when any creation or deletion counter is non-zero.
    /// `properties_set` alone does not count as a change: a singleton
    /// re-run reapplies its property bag without changing the graph.
    pub fn changed(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.labels_added > 0
            || self.labels_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }
}

/// One result row, keyed by the statement's RETURN aliases.
pub type Row = BTreeMap<String, serde_json::Value>;

/// What the store reported for one executed statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub rows: Vec<Row>,
    pub counters: MutationCounters,
}

/// Failure reported by an execution adapter.
///
/// `Store` is an operation-level failure: the call completed and the
/// store rejected it for a domain reason, reproducibly. `Unexpected` is
/// everything else; the statement buffer can no longer be trusted and
/// the run must abort without attempting further items.
#[derive(Debug, Clone, Error)]
pub enum AdapterFailure {
    #[error("store error{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Store {
        code: Option<String>,
        message: String,
    },
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// The seam to the backing graph store.
///
/// Implementations run the statement inside one transaction boundary
/// and own every session-scoped concern. The adapter is acquired by the
/// caller before a run and dropped (released) on every exit path,
/// success or failure.
pub trait ExecutionAdapter {
    fn execute(
        &mut self,
        statement: &str,
        bindings: &serde_json::Value,
    ) -> std::result::Result<ExecutionOutcome, AdapterFailure>;
}
