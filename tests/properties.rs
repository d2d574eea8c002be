use graphstate::{FieldKind, ValidationRules};
use proptest::prelude::*;

proptest! {
    #[test]
    fn conforming_identifiers_always_pass(value in "[A-Za-z_][A-Za-z0-9_]{0,30}") {
        let rules = ValidationRules::new();
        prop_assert!(rules.check(FieldKind::Identifier, &value).is_ok());
    }

    #[test]
    fn identifiers_with_injection_characters_always_fail(
        head in "[A-Za-z_][A-Za-z0-9_]{0,10}",
        needle in prop_oneof![Just('`'), Just(' '), Just(';')],
        tail in "[A-Za-z0-9_]{0,10}",
    ) {
        let rules = ValidationRules::new();
        let value = format!("{head}{needle}{tail}");
        prop_assert!(rules.check(FieldKind::Identifier, &value).is_err());
    }

    #[test]
    fn entity_names_never_carry_quotes_or_backticks(value in "\\PC{0,24}") {
        let rules = ValidationRules::new();
        if rules.check(FieldKind::EntityName, &value).is_ok() {
            prop_assert!(!value.contains('`'));
            prop_assert!(!value.contains('\''));
            prop_assert!(!value.contains(';'));
        }
    }

    #[test]
    fn int_cast_round_trips_through_strings(v in any::<i64>()) {
        let mut properties = graphstate::PropertyMap::new();
        properties.insert(
            "n".into(),
            serde_json::json!({ "value": v.to_string(), "type": "int" }),
        );
        let cast = graphstate::cast_properties(&properties).unwrap();
        prop_assert_eq!(cast.get("n"), Some(&graphstate::PropertyValue::Int(v)));
    }

    #[test]
    fn bool_cast_truthiness_is_the_documented_set(s in "[a-zA-Z0-9]{1,4}") {
        let mut properties = graphstate::PropertyMap::new();
        properties.insert("b".into(), serde_json::json!({ "value": s.clone(), "type": "bool" }));
        let cast = graphstate::cast_properties(&properties).unwrap();
        let expected = matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "y");
        prop_assert_eq!(cast.get("b"), Some(&graphstate::PropertyValue::Bool(expected)));
    }
}
