//! Input validation for identifiers and entity names.
//!
//! Identifiers (labels, relation types, property keys) are interpolated
//! directly into statement text because the query language cannot bind
//! them as parameters, so they are restricted to a safe character class
//! to prevent statement injection. Entity names travel as bound
//! parameters; their pattern only rejects control characters and
//! unexpected punctuation.
//!
//! Rules are a small closed set of immutable values (compiled pattern +
//! description), built once per call context and dispatched by field
//! kind - no shared mutable global state.

use regex::Regex;

use crate::error::{MutationError, Result};
use crate::model::{EntityDescriptor, PropertyMap};

/// Pattern for labels, relation types, property keys, constraint keys.
pub const GRAPH_IDENTIFIER: &str = "^[A-Za-z_][A-Za-z0-9_]*$";

/// Pattern for entity business-key names.
pub const UNICODE_NAME: &str = r"^[\p{L}\p{N}_\s\-\(\)]*$";

/// Binding names the compiler reserves for itself; a property key that
/// collides with one would silently override the business-key binding.
const RESERVED_BINDINGS: [&str; 4] = ["entity_name", "entity_name_from", "entity_name_to", "batch"];

/// Which validation rule a field is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Interpolated into statement text: the injection boundary.
    Identifier,
    /// Bound as a parameter: hygiene only.
    EntityName,
}

/// One immutable validation rule: a compiled pattern plus its source text.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pattern: Regex,
    source: &'static str,
}

impl ValidationRule {
    fn new(source: &'static str) -> Self {
        // Both patterns are compile-time constants; failure here is a
        // programming error, not an input error.
        let pattern = Regex::new(source).expect("hard-coded validation pattern compiles");
        ValidationRule { pattern, source }
    }

    /// Checks a value, returning a diagnostic naming the value and the
    /// pattern it failed.
    pub fn check(&self, value: &str) -> Result<()> {
        if self.pattern.is_match(value) {
            return Ok(());
        }
        Err(MutationError::Validation {
            value: value.to_string(),
            pattern: self.source.to_string(),
        })
    }
}

/// The closed rule set used to validate one descriptor.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    identifier: ValidationRule,
    entity_name: ValidationRule,
}

impl ValidationRules {
    pub fn new() -> Self {
        ValidationRules {
            identifier: ValidationRule::new(GRAPH_IDENTIFIER),
            entity_name: ValidationRule::new(UNICODE_NAME),
        }
    }

    /// Validates one value against the rule for its field kind.
    pub fn check(&self, kind: FieldKind, value: &str) -> Result<()> {
        match kind {
            FieldKind::Identifier => self.identifier.check(value),
            FieldKind::EntityName => self.entity_name.check(value),
        }
    }

    /// Validates every identifier-bearing field of a descriptor,
    /// short-circuiting on the first failure. Runs before any templating;
    /// a single failure aborts the whole operation.
    pub fn check_descriptor(&self, descriptor: &EntityDescriptor) -> Result<()> {
        match descriptor {
            EntityDescriptor::Vertex {
                label,
                entity_name,
                properties,
                ..
            } => {
                self.check(FieldKind::Identifier, label)?;
                self.check(FieldKind::EntityName, entity_name)?;
                self.check_property_keys(properties)
            }
            EntityDescriptor::Edge {
                relation_type,
                from,
                to,
                properties,
                unique_key,
                ..
            } => {
                self.check(FieldKind::Identifier, relation_type)?;
                self.check(FieldKind::Identifier, &from.label)?;
                self.check(FieldKind::EntityName, &from.entity_name)?;
                self.check(FieldKind::Identifier, &to.label)?;
                self.check(FieldKind::EntityName, &to.entity_name)?;
                self.check_property_keys(properties)?;
                if let Some(key) = unique_key {
                    self.check_unique_key(key, properties)?;
                }
                Ok(())
            }
            EntityDescriptor::Label {
                base_label,
                label,
                entity_name,
                ..
            } => {
                self.check(FieldKind::Identifier, base_label)?;
                self.check(FieldKind::Identifier, label)?;
                self.check(FieldKind::EntityName, entity_name)
            }
            EntityDescriptor::Constraint {
                label,
                property_key,
                ..
            } => {
                self.check(FieldKind::Identifier, label)?;
                self.check(FieldKind::Identifier, property_key)
            }
        }
    }

    /// Validates declared parameter keys for the read-query passthrough.
    pub fn check_parameter_keys(&self, parameters: &PropertyMap) -> Result<()> {
        for key in parameters.keys() {
            self.check(FieldKind::Identifier, key)?;
        }
        Ok(())
    }

    fn check_property_keys(&self, properties: &PropertyMap) -> Result<()> {
        for key in properties.keys() {
            self.check(FieldKind::Identifier, key)?;
            let lowered = key.to_lowercase();
            if RESERVED_BINDINGS.contains(&lowered.as_str()) {
                return Err(MutationError::MalformedProperty {
                    key: key.clone(),
                    reason: format!("key collides with the reserved '{lowered}' binding"),
                });
            }
        }
        Ok(())
    }

    /// The unique key's bound value is reused as-is from the property
    /// binding, so it must reference a declared property (compared
    /// trimmed and case-insensitively).
    fn check_unique_key(&self, unique_key: &str, properties: &PropertyMap) -> Result<()> {
        let wanted = unique_key.trim();
        self.check(FieldKind::Identifier, wanted)?;
        let wanted_lower = wanted.to_lowercase();
        let found = properties
            .keys()
            .any(|key| key.trim().to_lowercase() == wanted_lower);
        if !found {
            return Err(MutationError::UniqueKeyNotFound {
                key: wanted.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationRules::new()
    }
}
