//! Core value objects: entity descriptors, typed property values, and
//! compiled statements.
//!
//! Descriptors arrive from an external declaration loader as serde values
//! and are immutable once compiled; the lifecycle is a single
//! compile-then-execute pass with no persistence between runs.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// Raw property map as declared: key to `{value, type, element_type?}`.
///
/// Entries are kept as loose JSON values so the caster can report
/// structural problems per key instead of failing wholesale at
/// deserialization time.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Cast property map: placeholder name to natively typed value.
pub type Bindings = BTreeMap<String, PropertyValue>;

/// Desired state of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The entity should exist after the run.
    #[default]
    Present,
    /// The entity should not exist after the run.
    Absent,
}

impl DesiredState {
    pub fn is_present(self) -> bool {
        matches!(self, DesiredState::Present)
    }
}

/// Reference to an existing vertex by `(label, entity_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef {
    pub label: String,
    pub entity_name: String,
}

/// One declared entity: the unit of compilation.
///
/// The variant tag selects the mutation family; the desired `state`
/// selects create/merge versus delete within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum EntityDescriptor {
    /// A labeled node keyed by its `entity_name` business key.
    Vertex {
        label: String,
        entity_name: String,
        #[serde(default)]
        properties: PropertyMap,
        /// Merge-by-key when true; always-create (duplicates permitted,
        /// by design) when false.
        #[serde(default = "default_true")]
        singleton: bool,
        #[serde(default)]
        state: DesiredState,
    },
    /// A typed relationship between two existing vertices.
    Edge {
        #[serde(rename = "type")]
        relation_type: String,
        from: EndpointRef,
        to: EndpointRef,
        #[serde(default)]
        properties: PropertyMap,
        #[serde(default)]
        bi_directional: bool,
        /// Extra match predicate allowing multiple same-type edges between
        /// one endpoint pair, disambiguated by this property's value.
        #[serde(default)]
        unique_key: Option<String>,
        #[serde(default)]
        state: DesiredState,
    },
    /// A secondary label attached to an existing vertex.
    Label {
        base_label: String,
        label: String,
        entity_name: String,
        #[serde(default)]
        state: DesiredState,
    },
    /// A uniqueness constraint on `(label, property_key)`.
    Constraint {
        label: String,
        property_key: String,
        #[serde(default)]
        state: DesiredState,
    },
}

impl EntityDescriptor {
    /// Desired state of this descriptor, whatever the variant.
    pub fn state(&self) -> DesiredState {
        match self {
            EntityDescriptor::Vertex { state, .. }
            | EntityDescriptor::Edge { state, .. }
            | EntityDescriptor::Label { state, .. }
            | EntityDescriptor::Constraint { state, .. } => *state,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A natively typed property value, the output of the property caster.
///
/// Serializes to the matching JSON scalar; datetimes become RFC 3339
/// strings. Values also know how to render themselves as Cypher literals
/// for debug statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<FixedOffset>),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Str(_) => "str",
            PropertyValue::DateTime(_) => "datetime",
            PropertyValue::List(_) => "list",
        }
    }

    /// Renders the value as a Cypher literal for debug text.
    ///
    /// Debug text is for human inspection only and is never sent to the
    /// store, but string quoting is still escaped so the rendered
    /// statement pastes cleanly into a console.
    pub fn cypher_literal(&self) -> String {
        match self {
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Float(v) => format!("{v:?}"),
            PropertyValue::Str(v) => {
                format!("'{}'", v.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            PropertyValue::DateTime(v) => {
                format!(
                    "datetime('{}')",
                    v.to_rfc3339_opts(SecondsFormat::Secs, true)
                )
            }
            PropertyValue::List(items) => {
                let rendered: Vec<String> =
                    items.iter().map(PropertyValue::cypher_literal).collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Bool(v) => serializer.serialize_bool(*v),
            PropertyValue::Int(v) => serializer.serialize_i64(*v),
            PropertyValue::Float(v) => serializer.serialize_f64(*v),
            PropertyValue::Str(v) => serializer.serialize_str(v),
            PropertyValue::DateTime(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            PropertyValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A fully compiled, parameterized statement ready for execution.
///
/// `text` contains only named placeholders; every placeholder has a key in
/// `bindings`. `debug_text` has the values substituted inline and must
/// never be sent to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    pub text: String,
    pub bindings: Bindings,
    pub debug_text: String,
}

impl CompiledStatement {
    /// Builds a statement and derives its debug text by substituting each
    /// `$key` placeholder with the bound value's Cypher literal.
    pub fn new(text: String, bindings: Bindings) -> Self {
        let debug_text = substitute_inline(&text, &bindings);
        CompiledStatement {
            text,
            bindings,
            debug_text,
        }
    }
}

/// Replaces `$key` placeholders with inline literals, longest key first so
/// a shorter key never corrupts a longer one sharing its prefix.
pub(crate) fn substitute_inline(text: &str, bindings: &Bindings) -> String {
    let mut keys: Vec<&String> = bindings.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let mut rendered = text.to_string();
    for key in keys {
        let literal = bindings[key].cypher_literal();
        rendered = rendered.replace(&format!("${key}"), &literal);
    }
    rendered
}
