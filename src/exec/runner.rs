//! Sequential run orchestration: single-item and bulk paths.
//!
//! Both paths are strictly sequential; batching reduces round trips, it
//! never introduces parallelism. Validation and casting failures surface
//! before any store interaction. During execution the first failure
//! aborts the remaining queue: batches already committed by the adapter
//! stay committed, nothing is retried, and the failure report carries
//! everything needed to reproduce the statement by hand.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::batch::batch_compile;
use crate::compiler::Compiler;
use crate::config::RunOptions;
use crate::error::MutationError;
use crate::model::{Bindings, EntityDescriptor};

use super::summary::{RunSummary, SummaryPayload};
use super::{AdapterFailure, ExecutionAdapter, MutationCounters, Row};

/// Result payload of a single-item run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationPayload {
    /// The executed parameterized statement.
    pub statement: String,
    /// The bindings it was executed with.
    pub bindings: Bindings,
    /// Human-readable statement with values substituted inline. Never
    /// sent to the store.
    pub debug_statement: String,
    /// Rows returned by the statement.
    pub rows: Vec<Row>,
    /// Mutation counters reported by the store.
    pub counters: MutationCounters,
    /// Whether any creation or deletion counter moved.
    pub changed: bool,
}

/// A failed run, with everything needed to reproduce and resume.
#[derive(Debug)]
pub struct RunFailure {
    /// The classified failure.
    pub error: MutationError,
    /// Debug form of the failing statement, when one was compiled.
    pub statement: Option<String>,
    /// Bindings of the failing statement/batch.
    pub bindings: Option<serde_json::Value>,
    /// Offset of the first failing item in declaration order.
    pub offset: Option<usize>,
    /// Partial summary accumulated before the abort (bulk runs only).
    pub summary: Option<SummaryPayload>,
}

impl RunFailure {
    fn local(error: MutationError, offset: Option<usize>, summary: Option<SummaryPayload>) -> Self {
        RunFailure {
            error,
            statement: None,
            bindings: None,
            offset,
            summary,
        }
    }
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "run aborted at item {offset}: {}", self.error),
            None => write!(f, "run aborted: {}", self.error),
        }
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Compiles and executes one descriptor through the adapter.
pub fn run_single<A: ExecutionAdapter>(
    compiler: &Compiler,
    adapter: &mut A,
    descriptor: &EntityDescriptor,
    options: &RunOptions,
) -> std::result::Result<MutationPayload, RunFailure> {
    let compiled = compiler
        .compile(descriptor, options.check_mode)
        .map_err(|e| RunFailure::local(e, None, None))?;
    let bindings = bindings_value(&compiled.bindings);
    let outcome = adapter
        .execute(&compiled.text, &bindings)
        .map_err(|failure| RunFailure {
            error: classify(failure),
            statement: Some(compiled.debug_text.clone()),
            bindings: Some(bindings.clone()),
            offset: None,
            summary: None,
        })?;
    let changed = outcome.counters.changed();
    Ok(MutationPayload {
        statement: compiled.text,
        bindings: compiled.bindings,
        debug_statement: compiled.debug_text,
        rows: outcome.rows,
        counters: outcome.counters,
        changed,
    })
}

/// Compiles every descriptor, batches the compiled statements, and
/// executes the batches in declaration order.
///
/// All compilation happens up front: a validation or cast failure is the
/// terminal result of the whole run with zero store interaction. In
/// check mode the connectivity probe is executed exactly once after
/// everything compiled.
pub fn run_bulk<A: ExecutionAdapter>(
    compiler: &Compiler,
    adapter: &mut A,
    descriptors: &[EntityDescriptor],
    options: &RunOptions,
) -> std::result::Result<SummaryPayload, RunFailure> {
    let mut summary = RunSummary::new(descriptors.len());
    info!(total = descriptors.len(), check_mode = options.check_mode, "starting bulk run");

    let mut compiled = Vec::with_capacity(descriptors.len());
    for (offset, descriptor) in descriptors.iter().enumerate() {
        match compiler.compile(descriptor, options.check_mode) {
            Ok(statement) => compiled.push(statement),
            Err(e) => {
                error!(offset, error = %e, "bulk run rejected before execution");
                return Err(RunFailure::local(e, Some(offset), Some(summary.finalize())));
            }
        }
    }

    if options.check_mode {
        // Everything validated and cast; exercise the session once.
        let probe = compiler.graph_reset(true);
        let bindings = bindings_value(&probe.bindings);
        let outcome = adapter.execute(&probe.text, &bindings).map_err(|failure| RunFailure {
            error: classify(failure),
            statement: Some(probe.text.clone()),
            bindings: Some(bindings.clone()),
            offset: None,
            summary: None,
        });
        match outcome {
            Ok(result) => {
                summary.record(descriptors.len(), &result.counters);
                return Ok(summary.finalize());
            }
            Err(mut failure) => {
                failure.summary = Some(summary.finalize());
                return Err(failure);
            }
        }
    }

    let units = batch_compile(&compiled, options.batch_size);
    debug!(units = units.len(), batch_size = options.batch_size, "batched bulk run");

    let mut offset = 0;
    for unit in &units {
        let bindings = unit.batch_bindings();
        match adapter.execute(&unit.statement, &bindings) {
            Ok(outcome) => {
                summary.record(unit.len(), &outcome.counters);
                debug!(
                    offset,
                    items = unit.len(),
                    nodes_created = outcome.counters.nodes_created,
                    relationships_created = outcome.counters.relationships_created,
                    "batch executed"
                );
            }
            Err(failure) => {
                let classified = classify(failure);
                error!(offset, error = %classified, "bulk run aborted");
                summary.record_error(serde_json::json!({
                    "offset": offset,
                    "statement": unit.statement,
                    "error": classified.to_string(),
                }));
                return Err(RunFailure {
                    error: classified,
                    statement: Some(unit.statement.clone()),
                    bindings: Some(bindings),
                    offset: Some(offset),
                    summary: Some(summary.finalize()),
                });
            }
        }
        offset += unit.len();
    }
    Ok(summary.finalize())
}

fn classify(failure: AdapterFailure) -> MutationError {
    match failure {
        AdapterFailure::Store { code, message } => MutationError::Store { code, message },
        AdapterFailure::Unexpected(message) => MutationError::Abend(message),
    }
}

// Property values serialize to plain JSON scalars and lists; the only
// way serde_json::to_value can fail is a non-string map key, which
// Bindings cannot contain.
fn bindings_value(bindings: &Bindings) -> serde_json::Value {
    serde_json::to_value(bindings).expect("bindings serialize to JSON")
}
