//! graphstate - declarative graph mutation compiler.
//!
//! An operator declares the desired state of vertices, edges, labels,
//! and uniqueness constraints; this crate compiles each declaration into
//! a safe, idempotent, parameterized Cypher statement and executes it
//! through a caller-supplied adapter, one at a time or batched into
//! chunked single-round-trip statements.
//!
//! - Identifiers are validated against a restrictive character class
//!   before they are embedded in statement text; data values always
//!   travel as bound parameters.
//! - Declared properties are `{value, type}` pairs cast to native typed
//!   values before binding.
//! - Singleton vertices merge by business key, so re-applying the same
//!   declaration is a no-op; always-create mode produces duplicates by
//!   design.
//! - The bulk path rewrites per-item placeholders into per-row field
//!   references and wraps them in one iteration statement per chunk,
//!   aggregating mutation counters into a run summary.

pub mod batch;
pub mod cast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod model;
pub mod schema;
pub(crate) mod statement;

pub use batch::{batch_compile, BatchUnit, DEFAULT_BATCH_SIZE};
pub use cast::cast_properties;
pub use compiler::Compiler;
pub use config::{aura_uri, RunOptions};
pub use error::{MutationError, Result};
pub use exec::{
    run_bulk, run_single, AdapterFailure, ExecutionAdapter, ExecutionOutcome, MutationCounters,
    MutationPayload, Row, RunFailure, RunSummary, SummaryPayload,
};
pub use logging::init_logging;
pub use model::{
    Bindings, CompiledStatement, DesiredState, EndpointRef, EntityDescriptor, PropertyMap,
    PropertyValue,
};
pub use schema::{FieldKind, ValidationRule, ValidationRules};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
