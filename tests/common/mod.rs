//! Shared test support: an in-memory execution adapter that emulates the
//! store's merge-by-key semantics at the bindings level.

use std::collections::{BTreeMap, HashSet};

use graphstate::{AdapterFailure, ExecutionAdapter, ExecutionOutcome, MutationCounters};

/// Fake store keyed on `entity_name` bindings. Vertices merged with
/// `MERGE` are created once per distinct name; `CREATE` always creates;
/// deletes remove from the seen set. Statements are recorded verbatim
/// for call-shape assertions.
#[derive(Default)]
pub struct MockStore {
    pub vertices: HashSet<String>,
    pub calls: Vec<(String, serde_json::Value)>,
    /// When set, the call with this index fails with the given failure.
    pub fail_on_call: Option<(usize, AdapterFailure)>,
}

impl MockStore {
    pub fn new() -> Self {
        MockStore::default()
    }

    pub fn failing_at(call: usize, failure: AdapterFailure) -> Self {
        MockStore {
            fail_on_call: Some((call, failure)),
            ..MockStore::default()
        }
    }

    fn apply_row(
        &mut self,
        statement: &str,
        row: &serde_json::Value,
        counters: &mut MutationCounters,
    ) {
        let entity_name = row
            .get("entity_name")
            .and_then(|v| v.as_str())
            .map(String::from);
        if statement.contains("DETACH DELETE n") {
            if let Some(name) = entity_name {
                if self.vertices.remove(&name) {
                    counters.nodes_deleted += 1;
                }
            }
        } else if statement.contains("MERGE (n:") {
            if let Some(name) = entity_name {
                if self.vertices.insert(name) {
                    counters.nodes_created += 1;
                }
                counters.properties_set += property_count(row);
            }
        } else if statement.contains("CREATE (n:") {
            counters.nodes_created += 1;
            counters.properties_set += property_count(row);
        } else if statement.contains("MERGE (a)-[") {
            counters.relationships_created += 1;
            if statement.contains("MERGE (b)-[") {
                counters.relationships_created += 1;
            }
        } else if statement.contains("DELETE r") {
            counters.relationships_deleted += 1;
        }
    }
}

fn property_count(row: &serde_json::Value) -> u64 {
    let reserved = ["entity_name", "entity_name_from", "entity_name_to"];
    row.as_object()
        .map(|map| map.keys().filter(|k| !reserved.contains(&k.as_str())).count() as u64)
        .unwrap_or(0)
}

impl ExecutionAdapter for MockStore {
    fn execute(
        &mut self,
        statement: &str,
        bindings: &serde_json::Value,
    ) -> Result<ExecutionOutcome, AdapterFailure> {
        let call_index = self.calls.len();
        self.calls.push((statement.to_string(), bindings.clone()));
        if let Some((index, failure)) = &self.fail_on_call {
            if call_index == *index {
                return Err(failure.clone());
            }
        }

        if statement.starts_with("CALL dbms.components()") {
            let mut row = BTreeMap::new();
            row.insert("version".to_string(), serde_json::json!("5.20.0"));
            return Ok(ExecutionOutcome {
                rows: vec![row],
                counters: MutationCounters::default(),
            });
        }

        let mut counters = MutationCounters::default();
        if statement.starts_with("UNWIND $batch AS row") {
            let rows = bindings
                .get("batch")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            for row in &rows {
                self.apply_row(statement, row, &mut counters);
            }
        } else {
            self.apply_row(statement, bindings, &mut counters);
        }
        Ok(ExecutionOutcome {
            rows: Vec::new(),
            counters,
        })
    }
}
