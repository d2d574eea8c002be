//! The bulk batch rewriter.
//!
//! Rewrites a sequence of individually compiled statements that share a
//! template shape into chunked batched statements: one round trip per
//! chunk instead of one per item. Each original item keeps its own
//! bindings map as one row of the batch parameter, so a single row's
//! match failure never blocks the other rows in the chunk - the store's
//! iteration construct executes the per-row body once per element.

use crate::model::{Bindings, CompiledStatement};

/// Default number of items per batched statement.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One batched statement covering at most `batch_size` original items.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUnit {
    /// The wrapped statement: `UNWIND $batch AS row` plus the rewritten
    /// per-row body.
    pub statement: String,
    /// One bindings map per original item, in declaration order.
    pub rows: Vec<Bindings>,
}

impl BatchUnit {
    /// Number of original items covered by this unit.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The unit's single `batch` parameter: the ordered row list, ready
    /// for the execution adapter.
    pub fn batch_bindings(&self) -> serde_json::Value {
        serde_json::json!({ "batch": self.rows })
    }
}

/// Groups compiled statements into batch units.
///
/// Contiguous statements with an identical per-row body share a unit;
/// every unit is cut at `batch_size` items. Input order is preserved
/// throughout - rows are never merged, deduplicated, or reordered.
pub fn batch_compile(statements: &[CompiledStatement], batch_size: usize) -> Vec<BatchUnit> {
    let batch_size = batch_size.max(1);
    let mut units: Vec<BatchUnit> = Vec::new();
    let mut current_body: Option<String> = None;

    for compiled in statements {
        let body = per_row_body(compiled);
        let start_new = match (&current_body, units.last()) {
            (Some(prev), Some(unit)) => *prev != body || unit.len() >= batch_size,
            _ => true,
        };
        if start_new {
            units.push(BatchUnit {
                statement: format!("UNWIND $batch AS row\n{body}"),
                rows: Vec::new(),
            });
            current_body = Some(body);
        }
        // Unit rows carry the item's bindings untouched; the rewrite
        // only changed how the statement references them.
        units
            .last_mut()
            .expect("a unit was just pushed")
            .rows
            .push(compiled.bindings.clone());
    }
    units
}

/// Derives the per-row body of one compiled statement: the trailing
/// RETURN clause is dropped (bulk aggregates mutation counters, not
/// rows) and every `$key` placeholder becomes a `row.key` field
/// reference. The rewrite is purely textual; all items sharing a
/// template shape share the same placeholder set.
fn per_row_body(compiled: &CompiledStatement) -> String {
    let body: Vec<&str> = compiled
        .text
        .lines()
        .take_while(|line| !line.starts_with("RETURN"))
        .collect();
    let mut body = body.join("\n");

    let mut keys: Vec<&String> = compiled.bindings.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for key in keys {
        body = body.replace(&format!("${key}"), &format!("row.{key}"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::model::{DesiredState, EntityDescriptor, PropertyMap};
    use serde_json::json;

    fn vertex(name: &str) -> EntityDescriptor {
        let mut properties = PropertyMap::new();
        properties.insert("row".into(), json!({"value": 1, "type": "int"}));
        EntityDescriptor::Vertex {
            label: "Cell".into(),
            entity_name: name.into(),
            properties,
            singleton: true,
            state: DesiredState::Present,
        }
    }

    fn compile_many(count: usize) -> Vec<CompiledStatement> {
        let compiler = Compiler::new();
        (0..count)
            .map(|i| compiler.compile(&vertex(&format!("cell {i}")), false).unwrap())
            .collect()
    }

    #[test]
    fn chunks_preserve_order_and_size() {
        let units = batch_compile(&compile_many(250), 100);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].len(), 100);
        assert_eq!(units[1].len(), 100);
        assert_eq!(units[2].len(), 50);
        assert_eq!(
            units[0].rows[0].get("entity_name").unwrap().cypher_literal(),
            "'cell 0'"
        );
        assert_eq!(
            units[2].rows[49].get("entity_name").unwrap().cypher_literal(),
            "'cell 249'"
        );
    }

    #[test]
    fn placeholders_become_row_references() {
        let units = batch_compile(&compile_many(1), 100);
        let statement = &units[0].statement;
        assert!(statement.starts_with("UNWIND $batch AS row\n"));
        assert!(statement.contains("MERGE (n:`Cell` { entity_name: row.entity_name })"));
        assert!(statement.contains("SET n += { row: row.row }"));
        assert!(!statement.contains("RETURN"));
        assert!(!statement.contains("$entity_name"));
    }

    #[test]
    fn batch_parameter_lists_rows_in_order() {
        let units = batch_compile(&compile_many(3), 100);
        let bindings = units[0].batch_bindings();
        let rows = bindings["batch"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["entity_name"], json!("cell 1"));
    }

    #[test]
    fn differing_shapes_split_units() {
        let compiler = Compiler::new();
        let mut statements = compile_many(2);
        let bare = EntityDescriptor::Vertex {
            label: "Cell".into(),
            entity_name: "no props".into(),
            properties: PropertyMap::new(),
            singleton: true,
            state: DesiredState::Present,
        };
        statements.push(compiler.compile(&bare, false).unwrap());
        let units = batch_compile(&statements, 100);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].len(), 2);
        assert_eq!(units[1].len(), 1);
    }
}
