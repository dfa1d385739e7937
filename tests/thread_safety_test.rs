//! Validators and registries shared across threads.

use std::sync::Arc;
use std::thread;

use conform::{
    CacheConfig, Field, RecordValidator, Shape, Validator, ValidatorExt, ValidatorRegistry,
};
use serde_json::json;

fn user() -> Arc<dyn Validator<(String, i64)>> {
    RecordValidator::new(
        (
            Field::required("name", Shape::string().min_len(1)),
            Field::required("age", Shape::int().min(0)),
        ),
        |(name, age)| (name, age),
    )
    .unwrap()
    .shared()
}

#[test]
fn test_concurrent_validation() {
    let v = user();
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let v = Arc::clone(&v);
            thread::spawn(move || {
                let input = json!({"name": format!("User{}", i), "age": 20 + i});
                let (name, age) = v.validate(&input).into_result().unwrap();
                assert_eq!(name, format!("User{}", i));
                assert_eq!(age, 20 + i);
                assert!(v.validate(&json!({"name": "", "age": -i - 1})).is_failure());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_registration_and_lookup() {
    let registry = ValidatorRegistry::new();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                registry.register(format!("Bounded{}", i), Shape::int().max(i)).unwrap();
                let result = registry.validate::<i64>(&format!("Bounded{}", i), &json!(i)).unwrap();
                assert!(result.is_success());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.names().len(), 8);
}

#[test]
fn test_references_resolve_from_many_threads() {
    let registry = ValidatorRegistry::new();
    let list = Shape::list(registry.reference::<String>("Tag")).parallel();
    registry.register("Tag", Shape::string().lower_case().not_blank()).unwrap();

    let list = Arc::new(list);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let tags = list.validate(&json!(["A", "b", "C"])).into_result().unwrap();
                assert_eq!(tags, vec!["a", "b", "c"]);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_shared_cache_under_contention() {
    let v = Arc::new(Shape::string().upper_case().cached(CacheConfig::with_capacity(4)));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let v = Arc::clone(&v);
            thread::spawn(move || {
                for n in 0..20 {
                    let word = format!("w{}", (n + i) % 6);
                    let expected = word.to_uppercase();
                    assert_eq!(v.validate(&json!(word)).into_result().ok(), Some(expected));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_parallel_list_reports_positions() {
    let v = Shape::list(Shape::int().min(0)).parallel();
    let input: Vec<i64> = (0..200).map(|n| if n % 50 == 7 { -n } else { n }).collect();
    let err = v.validate(&json!(input)).into_result().unwrap_err();
    let conform::ErrKind::ItemErrors(items) = err.err else {
        panic!("expected item errors");
    };
    assert_eq!(items.keys().copied().collect::<Vec<_>>(), vec![7, 57, 107, 157]);
}
