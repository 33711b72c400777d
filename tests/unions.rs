use std::sync::Arc;

use recast::{ConvertError, FieldDef, RecordDef, Shape, TypeScope, TypedValue, from_json};
use serde_json::json;

mod common;
use common::*;

#[test]
fn scalar_members_fast_accept() {
    let shape = Shape::union([Shape::int(), Shape::string()]);
    assert_eq!(from_json(&shape, &json!(5)).unwrap(), ival(5));
    assert_eq!(from_json(&shape, &json!("five")).unwrap(), sval("five"));
}

#[test]
fn members_are_attempted_in_declared_order() {
    let shape = Shape::union([Shape::seq(Shape::int()), Shape::seq(Shape::string())]);
    assert_eq!(
        from_json(&shape, &json!(["a"])).unwrap(),
        seq(vec![sval("a")])
    );
}

// Two record members that both accept the same document: the earlier
// declaration always wins. Ambiguity is not diagnosed, by policy.
#[test]
fn first_matching_member_wins() {
    let scope = TypeScope::new();
    let first = RecordDef::declare(&scope, "First", [], [FieldDef::new("a", Shape::int())]);
    let second = RecordDef::declare(&scope, "Second", [], [FieldDef::new("a", Shape::int())]);

    let shape = Shape::union([
        Shape::record(first.clone()),
        Shape::record(second.clone()),
    ]);
    let loaded = from_json(&shape, &json!({"a": 1})).unwrap();
    match loaded {
        TypedValue::Record { def, .. } => assert!(Arc::ptr_eq(&def, &first)),
        other => panic!("expected record, got {other:?}"),
    }

    // Reversed declaration order flips the winner.
    let shape = Shape::union([Shape::record(second.clone()), Shape::record(first)]);
    let loaded = from_json(&shape, &json!({"a": 1})).unwrap();
    match loaded {
        TypedValue::Record { def, .. } => assert!(Arc::ptr_eq(&def, &second)),
        other => panic!("expected record, got {other:?}"),
    }
}

#[test]
fn exhausted_union_aggregates_member_failures() {
    let shape = Shape::union([Shape::int(), Shape::string(), Shape::seq(Shape::int())]);
    let err = from_json(&shape, &json!({"a": 1})).unwrap_err();
    match err {
        ConvertError::UnionExhausted { actual, attempts } => {
            assert_eq!(actual, "object");
            assert_eq!(attempts.len(), 3);
        }
        other => panic!("expected exhausted union, got {other}"),
    }
}

#[test]
fn optional_accepts_null_and_the_inner_shape() {
    let shape = Shape::optional(Shape::map(Shape::int()));
    assert_eq!(from_json(&shape, &json!(null)).unwrap(), TypedValue::Null);
    assert_eq!(
        from_json(&shape, &json!({"a": 1})).unwrap(),
        map(vec![("a", ival(1))])
    );
}

#[test]
fn union_inside_collections() {
    let shape = Shape::seq(Shape::union([Shape::int(), Shape::null()]));
    let loaded = from_json(&shape, &json!([1, null, 2])).unwrap();
    assert_eq!(loaded, seq(vec![ival(1), TypedValue::Null, ival(2)]));
}
