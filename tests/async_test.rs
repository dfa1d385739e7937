//! The async validation path: parity with the sync path, async-only
//! checks, and misuse detection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use conform::{
    CustomErr, DictValidatorAny, ErrKind, Field, RecordValidator, Shape, UsageError, Validator,
    ValidatorExt,
};
use futures::FutureExt;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
struct Order {
    sku: String,
    qty: i64,
    tags: Vec<String>,
}

fn order() -> impl Validator<Order> {
    RecordValidator::new(
        (
            Field::required("sku", Shape::string().strip().upper_case().min_len(3)),
            Field::required("qty", Shape::int().min(1).max(99)),
            Field::with_default("tags", Shape::list(Shape::string()).unique(), Vec::new()),
        ),
        |(sku, qty, tags)| Order { sku, qty, tags },
    )
    .unwrap()
    .check_with(|o| (o.qty > 10 && o.tags.is_empty()).then(|| ErrKind::Custom(CustomErr::new("bulk_needs_tag"))))
}

#[tokio::test]
async fn test_sync_and_async_agree() {
    let v = order();
    let inputs: Vec<Value> = vec![
        json!({"sku": " abc ", "qty": 2}),
        json!({"sku": "ab", "qty": 0, "tags": ["x", "x"]}),
        json!({"sku": "abcd", "qty": 50}),
        json!({"qty": "many"}),
        json!([1, 2, 3]),
        Value::Null,
    ];
    for input in &inputs {
        assert_eq!(
            v.validate(input).into_result(),
            v.validate_async(input).await.into_result(),
            "input {}",
            input
        );
    }
}

#[test]
fn test_async_only_misuse_is_reported_every_time() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&lookups);
    let username = Shape::string().check_fn_async("available", move |name: &String| {
        counter.fetch_add(1, Ordering::SeqCst);
        let free = name != "root";
        async move { free }.boxed()
    });
    let v = RecordValidator::new((Field::required("username", username),), |(u,)| u).unwrap();

    for input in [json!({"username": "ada"}), json!({}), json!(42)] {
        assert_eq!(
            v.try_validate(&input).err(),
            Some(UsageError::AsyncOnly {
                validator: "record".to_string()
            })
        );
    }
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
    assert!(v.requires_async());
}

#[tokio::test]
async fn test_async_only_validator_runs_on_async_path() {
    let username = Shape::string().min_len(2).check_fn_async("available", |name: &String| {
        let free = name != "root";
        async move {
            tokio::task::yield_now().await;
            free
        }
        .boxed()
    });

    assert!(username.validate_async(&json!("ada")).await.is_success());

    let err = username.validate_async(&json!("root")).await.into_result().unwrap_err();
    let ErrKind::PredicateFailures(failed) = err.err else {
        panic!("expected predicate failures");
    };
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].name, "available");

    // Type mismatches short-circuit before any async check runs.
    let err = username.validate_async(&json!(7)).await.into_result().unwrap_err();
    assert_eq!(err.err, ErrKind::TypeMismatch { expected: "string".into() });
}

#[tokio::test]
async fn test_async_whole_value_check() {
    let taken = Arc::new(vec!["ada@example.com".to_string()]);
    let signup = DictValidatorAny::new()
        .field("email", Shape::string().email().to_value())
        .field("age", Shape::int().min(13).to_value())
        .check_with_async(move |obj| {
            let taken = Arc::clone(&taken);
            let email = obj["email"].as_str().unwrap_or_default().to_string();
            async move { taken.contains(&email).then(|| ErrKind::Custom(CustomErr::new("email_taken"))) }.boxed()
        });

    assert!(signup.requires_async());
    assert!(signup.try_validate(&json!({})).is_err());

    let ok = signup
        .validate_async(&json!({"email": "bob@example.com", "age": 30}))
        .await
        .into_result()
        .unwrap();
    assert_eq!(ok["age"], json!(30));

    let err = signup
        .validate_async(&json!({"email": "ada@example.com", "age": 30}))
        .await
        .into_result()
        .unwrap_err();
    assert_eq!(err.err, ErrKind::Custom(CustomErr::new("email_taken")));

    // Field failures stop before the whole-value check.
    let err = signup
        .validate_async(&json!({"email": "ada@example.com", "age": 3}))
        .await
        .into_result()
        .unwrap_err();
    assert!(matches!(err.err, ErrKind::FieldErrors(_)));
}

#[tokio::test]
async fn test_async_list_items_keep_positions() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let item = Shape::int().check_fn_async("logged", move |n: &i64| {
        log.lock().push(*n);
        let ok = *n >= 0;
        async move { ok }.boxed()
    });
    let v = Shape::list(item);

    let err = v.validate_async(&json!([3, -1, 2, -5])).await.into_result().unwrap_err();
    let ErrKind::ItemErrors(items) = err.err else {
        panic!("expected item errors");
    };
    assert_eq!(items.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(*seen.lock(), vec![3, -1, 2, -5]);
}
