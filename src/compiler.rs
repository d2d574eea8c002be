//! The mutation compiler: validation, casting, and templating for one
//! declared entity.
//!
//! `compile` is a pure transformation. Validation and casting failures
//! are reported before any statement text exists (fail-fast, no partial
//! compiled state); once both succeed, compilation itself cannot fail
//! and the result is always a syntactically complete statement.
//!
//! Normalization follows the backing store's conventions: vertex labels
//! capitalised, relation types uppercased, property keys lowercased
//! (duplicate-property prevention). Validation always runs against the
//! raw declared input.

use tracing::debug;

use crate::cast::cast_properties;
use crate::error::{MutationError, Result};
use crate::model::{
    Bindings, CompiledStatement, EntityDescriptor, PropertyMap, PropertyValue,
};
use crate::schema::ValidationRules;
use crate::statement;

/// Compiles entity descriptors into parameterized statements.
///
/// Owns the validation rule set; build one per call context and reuse it
/// across a run.
#[derive(Debug, Default)]
pub struct Compiler {
    rules: ValidationRules,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            rules: ValidationRules::new(),
        }
    }

    /// Compiles one descriptor.
    ///
    /// In check mode the real statement is replaced by a connectivity
    /// probe with no side effects; validation and casting still run in
    /// full, and the bindings are retained for inspection.
    pub fn compile(
        &self,
        descriptor: &EntityDescriptor,
        check_mode: bool,
    ) -> Result<CompiledStatement> {
        self.rules.check_descriptor(descriptor)?;
        let (text, bindings) = self.build(descriptor)?;
        let compiled = if check_mode {
            CompiledStatement::new(statement::PROBE.to_string(), bindings)
        } else {
            CompiledStatement::new(text, bindings)
        };
        debug!(statement = %compiled.text.replace('\n', " "), "compiled statement");
        Ok(compiled)
    }

    /// Compiles the whole-graph wipe (probe in check mode).
    pub fn graph_reset(&self, check_mode: bool) -> CompiledStatement {
        let text = if check_mode {
            statement::PROBE
        } else {
            statement::GRAPH_RESET
        };
        CompiledStatement::new(text.to_string(), Bindings::new())
    }

    /// Read-query passthrough: caller-supplied statement text with
    /// validated, lowercased parameter keys. No templating is applied;
    /// the caller owns the statement's correctness.
    pub fn read_query(
        &self,
        query: &str,
        parameters: &PropertyMap,
    ) -> Result<CompiledStatement> {
        self.rules.check_parameter_keys(parameters)?;
        let mut bindings = Bindings::new();
        for (key, raw) in parameters {
            bindings.insert(key.to_lowercase(), parameter_value(key, raw)?);
        }
        Ok(CompiledStatement::new(query.to_string(), bindings))
    }

    fn build(&self, descriptor: &EntityDescriptor) -> Result<(String, Bindings)> {
        match descriptor {
            EntityDescriptor::Vertex {
                label,
                entity_name,
                properties,
                singleton,
                state,
            } => {
                let cast = lowercase_keys(cast_properties(properties)?);
                let label = statement::capitalise(label);
                let mut bindings = Bindings::new();
                bindings.insert(
                    "entity_name".into(),
                    PropertyValue::Str(entity_name.clone()),
                );
                if state.is_present() {
                    let text = if *singleton {
                        statement::vertex_merge(&label, cast.keys())
                    } else {
                        statement::vertex_create(&label, cast.keys())
                    };
                    bindings.extend(cast);
                    Ok((text, bindings))
                } else {
                    Ok((statement::vertex_delete(&label), bindings))
                }
            }
            EntityDescriptor::Edge {
                relation_type,
                from,
                to,
                properties,
                bi_directional,
                unique_key,
                state,
            } => {
                let cast = lowercase_keys(cast_properties(properties)?);
                let relation_type = relation_type.to_uppercase();
                let from_label = statement::capitalise(&from.label);
                let to_label = statement::capitalise(&to.label);
                let unique = unique_key
                    .as_deref()
                    .map(|key| key.trim().to_lowercase());

                let mut bindings = Bindings::new();
                bindings.insert(
                    "entity_name_from".into(),
                    PropertyValue::Str(from.entity_name.clone()),
                );
                bindings.insert(
                    "entity_name_to".into(),
                    PropertyValue::Str(to.entity_name.clone()),
                );
                if state.is_present() {
                    let text = statement::edge_merge(
                        &from_label,
                        &to_label,
                        &relation_type,
                        unique.as_deref(),
                        cast.keys(),
                        *bi_directional,
                    );
                    bindings.extend(cast);
                    Ok((text, bindings))
                } else {
                    // Deletes bind only what the match needs; the unique
                    // key's value is reused from the declared property.
                    if let Some(key) = &unique {
                        let value = cast.get(key).ok_or_else(|| {
                            MutationError::UniqueKeyNotFound { key: key.clone() }
                        })?;
                        bindings.insert(key.clone(), value.clone());
                    }
                    let text = statement::edge_delete(
                        &from_label,
                        &to_label,
                        &relation_type,
                        unique.as_deref(),
                        *bi_directional,
                    );
                    Ok((text, bindings))
                }
            }
            EntityDescriptor::Label {
                base_label,
                label,
                entity_name,
                state,
            } => {
                let base_label = statement::capitalise(base_label);
                let label = statement::capitalise(label);
                let mut bindings = Bindings::new();
                bindings.insert(
                    "entity_name".into(),
                    PropertyValue::Str(entity_name.clone()),
                );
                let text = if state.is_present() {
                    statement::label_add(&base_label, &label)
                } else {
                    statement::label_remove(&base_label, &label)
                };
                Ok((text, bindings))
            }
            EntityDescriptor::Constraint {
                label,
                property_key,
                state,
            } => {
                let label = statement::capitalise(label);
                let property_key = property_key.to_lowercase();
                let text = if state.is_present() {
                    statement::constraint_add(&label, &property_key)
                } else {
                    statement::constraint_drop(&label, &property_key)
                };
                Ok((text, Bindings::new()))
            }
        }
    }
}

fn lowercase_keys(bindings: Bindings) -> Bindings {
    bindings
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}

/// Read-query parameters are plain scalars (or lists of them), not
/// `{value, type}` declarations; they are converted as-is.
fn parameter_value(key: &str, raw: &serde_json::Value) -> Result<PropertyValue> {
    use serde_json::Value;
    match raw {
        Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(PropertyValue::Int(v))
            } else if let Some(v) = n.as_f64() {
                Ok(PropertyValue::Float(v))
            } else {
                Err(MutationError::MalformedProperty {
                    key: key.to_string(),
                    reason: "number is out of range".into(),
                })
            }
        }
        Value::String(s) => Ok(PropertyValue::Str(s.clone())),
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(parameter_value(key, item)?);
            }
            Ok(PropertyValue::List(values))
        }
        Value::Null | Value::Object(_) => Err(MutationError::MalformedProperty {
            key: key.to_string(),
            reason: "parameter values must be scalars or lists of scalars".into(),
        }),
    }
}
