//! Cypher statement builders, one per operation kind.
//!
//! Every builder emits text whose only embedded literals are
//! backtick-quoted identifiers; data values always ride named
//! placeholders. Identifiers reaching this module have already passed
//! validation, so the backtick quoting is belt only - collision with
//! reserved words, not injection, is what it guards.

/// Connectivity probe used in check mode: validates the session without
/// mutating anything.
pub(crate) const PROBE: &str = "CALL dbms.components() YIELD versions\nRETURN versions[0] AS version";

/// Whole-graph wipe.
pub(crate) const GRAPH_RESET: &str = "MATCH (n)\nDETACH DELETE n";

const VERTEX_RETURN: &str =
    "RETURN id(n) AS node_id, labels(n) AS labels, n.entity_name AS entity_name";

/// Vertex labels are capitalised: first character upper, remainder lower.
pub(crate) fn capitalise(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Deterministic constraint name, discoverable without a lookup table.
pub(crate) fn constraint_name(label: &str, property_key: &str) -> String {
    format!(
        "{}_{}_unique",
        label.to_lowercase(),
        property_key.to_lowercase()
    )
}

/// `SET <target> += { key: $key, ... }`, or `None` when there is nothing
/// to set.
fn set_clause<'a>(target: &str, keys: impl Iterator<Item = &'a String>) -> Option<String> {
    let pairs: Vec<String> = keys.map(|key| format!("{key}: ${key}")).collect();
    if pairs.is_empty() {
        return None;
    }
    Some(format!("SET {target} += {{ {} }}", pairs.join(", ")))
}

fn push_line(text: &mut String, line: &str) {
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
}

/// Match-or-create a vertex by `(label, entity_name)` and reapply the
/// declared property bag. Re-running is a creation no-op.
pub(crate) fn vertex_merge<'a>(label: &str, keys: impl Iterator<Item = &'a String>) -> String {
    vertex_present("MERGE", label, keys)
}

/// Unconditionally create a vertex; duplicates are the caller's
/// accepted responsibility.
pub(crate) fn vertex_create<'a>(label: &str, keys: impl Iterator<Item = &'a String>) -> String {
    vertex_present("CREATE", label, keys)
}

fn vertex_present<'a>(
    verb: &str,
    label: &str,
    keys: impl Iterator<Item = &'a String>,
) -> String {
    let mut text = String::new();
    push_line(
        &mut text,
        &format!("{verb} (n:`{label}` {{ entity_name: $entity_name }})"),
    );
    if let Some(clause) = set_clause("n", keys) {
        push_line(&mut text, &clause);
    }
    push_line(&mut text, VERTEX_RETURN);
    text
}

/// Idempotent delete: matches nothing when the vertex is already absent.
pub(crate) fn vertex_delete(label: &str) -> String {
    format!("MATCH (n:`{label}` {{ entity_name: $entity_name }})\nDETACH DELETE n")
}

fn endpoint_matches(from_label: &str, to_label: &str) -> String {
    format!(
        "MATCH (a:`{from_label}` {{ entity_name: $entity_name_from }})\nMATCH (b:`{to_label}` {{ entity_name: $entity_name_to }})"
    )
}

/// Relationship pattern body: type plus the optional unique-key filter
/// that lets several same-type edges coexist between one endpoint pair.
fn relation_pattern(alias: &str, relation_type: &str, unique_key: Option<&str>) -> String {
    match unique_key {
        Some(key) => format!("{alias}:`{relation_type}` {{ {key}: ${key} }}"),
        None => format!("{alias}:`{relation_type}`"),
    }
}

/// Match both endpoints, then match-or-create the relationship and
/// reapply its properties. A missing endpoint makes the statement match
/// nothing: the store reports zero rows affected, not an error.
pub(crate) fn edge_merge<'a>(
    from_label: &str,
    to_label: &str,
    relation_type: &str,
    unique_key: Option<&str>,
    keys: impl Iterator<Item = &'a String> + Clone,
    bi_directional: bool,
) -> String {
    let mut text = endpoint_matches(from_label, to_label);
    if bi_directional {
        // Two directed relationships, same type and properties: a
        // bidirectional edge is stored as A->B plus B->A.
        push_line(
            &mut text,
            &format!(
                "MERGE (a)-[{}]->(b)",
                relation_pattern("r1", relation_type, unique_key)
            ),
        );
        if let Some(clause) = set_clause("r1", keys.clone()) {
            push_line(&mut text, &clause);
        }
        push_line(
            &mut text,
            &format!(
                "MERGE (b)-[{}]->(a)",
                relation_pattern("r2", relation_type, unique_key)
            ),
        );
        if let Some(clause) = set_clause("r2", keys) {
            push_line(&mut text, &clause);
        }
        push_line(
            &mut text,
            "RETURN type(r1) AS relation_type, a.entity_name AS entity_name_from, b.entity_name AS entity_name_to",
        );
    } else {
        push_line(
            &mut text,
            &format!(
                "MERGE (a)-[{}]->(b)",
                relation_pattern("r", relation_type, unique_key)
            ),
        );
        if let Some(clause) = set_clause("r", keys) {
            push_line(&mut text, &clause);
        }
        push_line(
            &mut text,
            "RETURN type(r) AS relation_type, a.entity_name AS entity_name_from, b.entity_name AS entity_name_to",
        );
    }
    text
}

/// Delete a relationship. With `bi_directional` the match is undirected:
/// A->B and B->A are equivalent for deletion purposes, so either
/// direction satisfies the match.
pub(crate) fn edge_delete(
    from_label: &str,
    to_label: &str,
    relation_type: &str,
    unique_key: Option<&str>,
    bi_directional: bool,
) -> String {
    let mut text = endpoint_matches(from_label, to_label);
    let pattern = relation_pattern("r", relation_type, unique_key);
    let arrow = if bi_directional {
        format!("MATCH (a)-[{pattern}]-(b)")
    } else {
        format!("MATCH (a)-[{pattern}]->(b)")
    };
    push_line(&mut text, &arrow);
    push_line(&mut text, "DELETE r");
    text
}

/// Attach a secondary label to an existing vertex; other labels and
/// properties are untouched.
pub(crate) fn label_add(base_label: &str, label: &str) -> String {
    format!(
        "MATCH (n:`{base_label}` {{ entity_name: $entity_name }})\nSET n:`{label}`\n{VERTEX_RETURN}"
    )
}

/// Detach a secondary label from an existing vertex.
pub(crate) fn label_remove(base_label: &str, label: &str) -> String {
    format!(
        "MATCH (n:`{base_label}` {{ entity_name: $entity_name }})\nREMOVE n:`{label}`\n{VERTEX_RETURN}"
    )
}

/// Idempotent uniqueness-constraint creation under the deterministic name.
pub(crate) fn constraint_add(label: &str, property_key: &str) -> String {
    format!(
        "CREATE CONSTRAINT {} IF NOT EXISTS\nFOR (n:`{label}`)\nREQUIRE n.`{property_key}` IS UNIQUE",
        constraint_name(label, property_key)
    )
}

/// Idempotent uniqueness-constraint removal.
pub(crate) fn constraint_drop(label: &str, property_key: &str) -> String {
    format!(
        "DROP CONSTRAINT {} IF EXISTS",
        constraint_name(label, property_key)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalise_lowers_the_tail() {
        assert_eq!(capitalise("person"), "Person");
        assert_eq!(capitalise("BANK_ACCOUNT"), "Bank_account");
        assert_eq!(capitalise(""), "");
    }

    #[test]
    fn constraint_name_is_deterministic() {
        assert_eq!(constraint_name("Person", "Email"), "person_email_unique");
    }

    #[test]
    fn vertex_merge_places_only_placeholders() {
        let keys = vec!["age".to_string(), "city".to_string()];
        let text = vertex_merge("Person", keys.iter());
        assert!(text.starts_with("MERGE (n:`Person` { entity_name: $entity_name })"));
        assert!(text.contains("SET n += { age: $age, city: $city }"));
        assert!(text.contains("RETURN id(n) AS node_id"));
    }

    #[test]
    fn vertex_merge_without_properties_skips_set() {
        let text = vertex_merge("Person", std::iter::empty());
        assert!(!text.contains("SET"));
    }

    #[test]
    fn bidirectional_merge_creates_both_directions() {
        let keys: Vec<String> = vec!["since".into()];
        let text = edge_merge("Person", "Company", "WORKS_AT", None, keys.iter(), true);
        assert!(text.contains("MERGE (a)-[r1:`WORKS_AT`]->(b)"));
        assert!(text.contains("MERGE (b)-[r2:`WORKS_AT`]->(a)"));
        assert!(text.contains("SET r1 += { since: $since }"));
        assert!(text.contains("SET r2 += { since: $since }"));
    }

    #[test]
    fn bidirectional_delete_matches_either_direction() {
        let text = edge_delete("Person", "Company", "WORKS_AT", None, true);
        assert!(text.contains("MATCH (a)-[r:`WORKS_AT`]-(b)"));
        assert!(!text.contains("]->(b)\nDELETE"));
    }

    #[test]
    fn unique_key_becomes_a_relationship_filter() {
        let keys: Vec<String> = vec!["since".into()];
        let text = edge_merge(
            "Person",
            "Company",
            "WORKS_AT",
            Some("since"),
            keys.iter(),
            false,
        );
        assert!(text.contains("MERGE (a)-[r:`WORKS_AT` { since: $since }]->(b)"));
    }
}
