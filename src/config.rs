//! Run configuration.
//!
//! Options controlling how a run executes; compilation semantics are
//! fixed by the descriptors themselves.

use crate::batch::DEFAULT_BATCH_SIZE;

/// Options for a single- or bulk-mutation run.
///
/// # Example
///
/// ```rust
/// use graphstate::RunOptions;
///
/// let options = RunOptions::default().with_batch_size(500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of items per batched statement (bulk path only).
    pub batch_size: usize,

    /// When set, statements are replaced by a connectivity probe: input
    /// is validated and cast in full, the session is exercised, nothing
    /// is mutated.
    pub check_mode: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            check_mode: false,
        }
    }
}

impl RunOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }
}

/// Connection URI for a managed Aura instance.
pub fn aura_uri(instance_id: &str) -> String {
    format!("neo4j+s://{instance_id}.databases.neo4j.io")
}
