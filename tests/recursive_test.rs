//! Self-referential validators through `Lazy` and registry references.

use std::sync::Arc;

use conform::{
    ErrKind, Field, Lazy, RecordValidator, Shape, TupleValidator, UsageError, Validator,
    ValidatorExt, ValidatorRegistry,
};
use serde_json::{json, Value};

#[derive(Debug, PartialEq)]
struct Chain {
    head: i64,
    tail: Option<Box<Chain>>,
}

impl Chain {
    fn depth(&self) -> usize {
        1 + self.tail.as_ref().map_or(0, |t| t.depth())
    }
}

fn chain() -> Arc<dyn Validator<Chain>> {
    RecordValidator::new(
        (
            Field::required("head", Shape::int()),
            Field::optional("tail", Lazy::new(chain).map(Box::new)),
        ),
        |(head, tail)| Chain { head, tail },
    )
    .unwrap()
    .named("chain")
    .shared()
}

fn chain_json(len: usize) -> Value {
    (0..len).rev().fold(Value::Null, |tail, head| {
        let mut node = json!({ "head": head });
        if !tail.is_null() {
            node["tail"] = tail;
        }
        node
    })
}

/// Replaces the head at `depth` with a string.
fn break_at(mut value: Value, depth: usize) -> Value {
    let mut node = &mut value;
    for _ in 0..depth {
        node = &mut node["tail"];
    }
    node["head"] = json!("oops");
    value
}

fn leaf_paths(value: &Value, v: &dyn Validator<Chain>) -> Vec<String> {
    let err = v.validate(value).into_result().unwrap_err();
    err.leaves().iter().map(|(path, _)| path.to_string()).collect()
}

#[test]
fn test_chain_of_any_depth() {
    let v = chain();
    for len in [1, 2, 5, 40] {
        let parsed = v.validate(&chain_json(len)).into_result().unwrap();
        assert_eq!(parsed.depth(), len);
        assert_eq!(parsed.head, 0);
    }
}

#[test]
fn test_malformed_chain_is_located() {
    let v = chain();
    assert_eq!(leaf_paths(&break_at(chain_json(4), 0), v.as_ref()), vec!["head"]);
    assert_eq!(leaf_paths(&break_at(chain_json(4), 3), v.as_ref()), vec!["tail.tail.tail.head"]);

    let err = v.validate(&break_at(chain_json(3), 2)).into_result().unwrap_err();
    let (_, leaf) = &err.leaves()[0];
    assert_eq!(leaf.value, json!("oops"));
    assert_eq!(leaf.err, ErrKind::TypeMismatch { expected: "integer".into() });
}

#[test]
fn test_recursive_tuple_shape() {
    // [value, next-or-null]
    fn node() -> Arc<dyn Validator<(i64, Option<i64>)>> {
        TupleValidator::new((
            Shape::int().shared(),
            Lazy::new(node).map(|(head, _): (i64, Option<i64>)| head).nullable().shared(),
        ))
        .shared()
    }

    let v = node();
    assert_eq!(v.validate(&json!([1, [2, [3, null]]])).into_result().ok(), Some((1, Some(2))));
    assert_eq!(v.validate(&json!([1, null])).into_result().ok(), Some((1, None)));

    let err = v.validate(&json!([1, [2, ["x", null]]])).into_result().unwrap_err();
    let paths: Vec<String> = err.leaves().iter().map(|(p, _)| p.to_string()).collect();
    assert_eq!(paths, vec!["[1]<0>", "[1]<1>[1]<0>", "[1]<1>[1]<1>[0]"]);
}

#[test]
fn test_chain_through_registry() {
    let registry = ValidatorRegistry::new();
    registry
        .register(
            "Chain",
            RecordValidator::new(
                (
                    Field::required("head", Shape::int()),
                    Field::optional("tail", registry.reference::<Chain>("Chain").map(Box::new)),
                ),
                |(head, tail)| Chain { head, tail },
            )
            .unwrap(),
        )
        .unwrap();
    assert!(registry.unresolved().is_empty());

    let parsed = registry
        .validate::<Chain>("Chain", &chain_json(6))
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(parsed.depth(), 6);

    let result = registry.validate::<Chain>("Chain", &break_at(chain_json(6), 5)).unwrap();
    assert!(result.is_failure());
}

#[test]
fn test_mutual_references() {
    #[derive(Debug)]
    struct Dept {
        staff: Vec<Person>,
    }

    #[derive(Debug)]
    struct Person {
        manages: Option<Box<Dept>>,
    }

    let registry = ValidatorRegistry::new();
    registry
        .register(
            "Dept",
            RecordValidator::new(
                (Field::required("staff", Shape::list(registry.reference::<Person>("Person"))),),
                |(staff,)| Dept { staff },
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(registry.unresolved(), vec!["Person"]);

    let err = registry.validate::<Dept>("Dept", &json!({"staff": [{}]})).err();
    assert_eq!(
        err,
        Some(conform::RegistryError::Usage(UsageError::UnresolvedReference {
            name: "Person".to_string()
        }))
    );

    registry
        .register(
            "Person",
            RecordValidator::new(
                (Field::optional("manages", registry.reference::<Dept>("Dept").map(Box::new)),),
                |(manages,)| Person { manages },
            )
            .unwrap(),
        )
        .unwrap();

    let input = json!({"staff": [{}, {"manages": {"staff": [{}]}}]});
    let dept = registry.validate::<Dept>("Dept", &input).unwrap().into_result().unwrap();
    assert_eq!(dept.staff.len(), 2);
    assert!(dept.staff[1].manages.is_some());
}

#[tokio::test]
async fn test_recursive_async_path() {
    let v = chain();
    let input = chain_json(10);
    let sync = v.validate(&input).into_result();
    let async_ = v.validate_async(&input).await.into_result();
    assert_eq!(sync, async_);
}
