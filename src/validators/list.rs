//! Homogeneous sequence validation.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use stillwater::Validation;

use crate::error::{ErrKind, Invalid};
use crate::info::{PredicateInfo, ValidatorInfo, ValidatorKind};
use crate::pipeline::{Checks, Processors};
use crate::predicate::{
    AsyncFnPredicate, ExactItemCount, FnPredicate, MaxItems, MinItems, Predicate, PredicateAsync,
    UniqueItems,
};
use crate::processor::Processor;
use crate::validation::{Checked, ValidationResult};

use super::traits::{guard_sync, Validator};

/// Validates a JSON array whose items all share one validator.
///
/// The pipeline is: confirm the input is an array, run processors over the
/// raw items, validate every item, then run list-level predicates over the
/// validated `Vec<T>`. Item failures are accumulated by index; list-level
/// predicates only run once every item is valid.
///
/// Items are validated one at a time in positional order. [`parallel`]
/// opts into fan-out (rayon on the sync path, joined futures on the async
/// path); errors are still reported by position.
///
/// [`parallel`]: ListValidator::parallel
///
/// # Example
///
/// ```rust
/// use conform::{ErrKind, Shape, Validator};
/// use serde_json::json;
///
/// let tags = Shape::list(Shape::string().min_len(1)).min_items(1);
///
/// assert!(tags.validate(&json!(["a", "b"])).is_success());
///
/// let err = tags.validate(&json!(["a", "", 3])).into_result().unwrap_err();
/// match err.err {
///     ErrKind::ItemErrors(items) => assert_eq!(items.keys().copied().collect::<Vec<_>>(), vec![1, 2]),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub struct ListValidator<T> {
    item: Arc<dyn Validator<T>>,
    processors: Processors<Vec<Value>>,
    checks: Checks<Vec<T>>,
    parallel: bool,
    info: Arc<ValidatorInfo>,
}

impl<T> Clone for ListValidator<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            processors: self.processors.clone(),
            checks: self.checks.clone(),
            parallel: self.parallel,
            info: Arc::clone(&self.info),
        }
    }
}

impl<T: Send + Sync + 'static> ListValidator<T> {
    pub fn new(item: impl Validator<T> + 'static) -> Self {
        let requires_async = item.requires_async();
        Self {
            item: Arc::new(item),
            processors: Processors::new(),
            checks: Checks::new(),
            parallel: false,
            info: Arc::new(ValidatorInfo::new("list", ValidatorKind::List).requiring_async(requires_async)),
        }
    }

    /// Processes the raw items before they are validated.
    pub fn process(mut self, processor: impl Processor<Vec<Value>> + 'static) -> Self {
        Arc::make_mut(&mut self.info).processors.push(processor.name());
        self.processors.push(processor);
        self
    }

    pub fn predicate(mut self, predicate: impl Predicate<Vec<T>> + 'static) -> Self {
        self.checks.push(predicate);
        self.refresh_predicates();
        self
    }

    pub fn predicate_async(mut self, predicate: impl PredicateAsync<Vec<T>> + 'static) -> Self {
        self.checks.push_async(predicate);
        self.refresh_predicates();
        Arc::make_mut(&mut self.info).requires_async = true;
        self
    }

    pub fn check_fn(
        self,
        name: impl Into<Cow<'static, str>>,
        f: impl Fn(&Vec<T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate(FnPredicate::new(name, f))
    }

    pub fn check_fn_async<F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: for<'a> Fn(&'a Vec<T>) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        self.predicate_async(AsyncFnPredicate::new(name, f))
    }

    pub fn min_items(self, count: usize) -> Self {
        self.predicate(MinItems(count))
    }

    pub fn max_items(self, count: usize) -> Self {
        self.predicate(MaxItems(count))
    }

    pub fn exact_items(self, count: usize) -> Self {
        self.predicate(ExactItemCount(count))
    }

    pub fn unique(self) -> Self
    where
        T: PartialEq,
    {
        self.predicate(UniqueItems)
    }

    /// Validates items concurrently. Only use with item validators that are
    /// safe to run side by side.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    fn refresh_predicates(&mut self) {
        let infos = self.checks.infos();
        Arc::make_mut(&mut self.info).predicates = infos;
    }

    fn prepare(&self, value: &Value) -> Result<Vec<Value>, Invalid> {
        match value.as_array() {
            Some(items) => Ok(self.processors.run(items.clone())),
            None => Err(Invalid::type_mismatch("array", value, &self.info)),
        }
    }

    fn gather(&self, items: &[Value], results: Vec<ValidationResult<T>>) -> Result<Vec<T>, Invalid> {
        let mut valid = Vec::with_capacity(results.len());
        let mut errors = IndexMap::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Validation::Success(v) => valid.push(v),
                Validation::Failure(e) => {
                    errors.insert(index, e);
                }
            }
        }
        if errors.is_empty() {
            Ok(valid)
        } else {
            Err(Invalid::new(ErrKind::ItemErrors(errors), Value::Array(items.to_vec()), &self.info))
        }
    }

    fn conclude(&self, items: Vec<Value>, valid: Vec<T>, failed: Vec<PredicateInfo>) -> ValidationResult<Vec<T>> {
        if failed.is_empty() {
            Validation::Success(valid)
        } else {
            Validation::Failure(Invalid::new(ErrKind::PredicateFailures(failed), Value::Array(items), &self.info))
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Validator<Vec<T>> for ListValidator<T> {
    fn try_validate(&self, value: &Value) -> Checked<Vec<T>> {
        guard_sync(&self.info)?;
        let items = match self.prepare(value) {
            Ok(items) => items,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let results = if self.parallel {
            items
                .par_iter()
                .map(|item| self.item.try_validate(item))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            items
                .iter()
                .map(|item| self.item.try_validate(item))
                .collect::<Result<Vec<_>, _>>()?
        };
        let valid = match self.gather(&items, results) {
            Ok(valid) => valid,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures(&valid);
        Ok(self.conclude(items, valid, failed))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<Vec<T>> {
        let items = match self.prepare(value) {
            Ok(items) => items,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let results = if self.parallel {
            join_all(items.iter().map(|item| self.item.try_validate_async(item)))
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut results = Vec::with_capacity(items.len());
            for item in &items {
                results.push(self.item.try_validate_async(item).await?);
            }
            results
        };
        let valid = match self.gather(&items, results) {
            Ok(valid) => valid,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures_async(&valid).await;
        Ok(self.conclude(items, valid, failed))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FnProcessor;
    use crate::validators::Shape;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unwrap_failure<T: std::fmt::Debug>(v: ValidationResult<T>) -> Invalid {
        v.into_result().unwrap_err()
    }

    fn item_indices(err: &Invalid) -> Vec<usize> {
        match &err.err {
            ErrKind::ItemErrors(items) => items.keys().copied().collect(),
            other => panic!("expected item errors, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_list() {
        let v = ListValidator::new(Shape::int());
        assert_eq!(v.validate(&json!([1, 2, 3])).into_result().ok(), Some(vec![1, 2, 3]));
        assert_eq!(v.validate(&json!([])).into_result().ok(), Some(vec![]));
    }

    #[test]
    fn test_non_array_is_type_mismatch() {
        let v = ListValidator::new(Shape::int());
        let err = unwrap_failure(v.validate(&json!({"0": 1})));
        assert_eq!(err.err, ErrKind::TypeMismatch { expected: "array".into() });
    }

    #[test]
    fn test_accumulates_every_failing_index() {
        let v = ListValidator::new(Shape::int());
        let err = unwrap_failure(v.validate(&json!(["a", 2, null, 4, 5.5])));
        assert_eq!(item_indices(&err), vec![0, 2, 4]);
        assert_eq!(err.value, json!(["a", 2, null, 4, 5.5]));
    }

    #[test]
    fn test_list_predicates_wait_for_valid_items() {
        let v = ListValidator::new(Shape::int()).min_items(5);
        let err = unwrap_failure(v.validate(&json!(["a"])));
        assert_eq!(item_indices(&err), vec![0]);

        let err = unwrap_failure(v.validate(&json!([1, 2])));
        match err.err {
            ErrKind::PredicateFailures(failed) => assert_eq!(failed[0].name, "min_items"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unique_and_bounds() {
        let v = ListValidator::new(Shape::string()).unique().max_items(2);
        let err = unwrap_failure(v.validate(&json!(["a", "a", "b"])));
        match err.err {
            ErrKind::PredicateFailures(failed) => {
                let names: Vec<_> = failed.iter().map(|p| p.name.to_string()).collect();
                assert_eq!(names, vec!["unique_items", "max_items"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_processors_run_on_raw_items() {
        let drop_nulls = FnProcessor::new("drop_nulls", |items: Vec<Value>| {
            items.into_iter().filter(|v| !v.is_null()).collect()
        });
        let v = ListValidator::new(Shape::int()).process(drop_nulls).exact_items(2);
        assert_eq!(v.validate(&json!([1, null, 2])).into_result().ok(), Some(vec![1, 2]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = ListValidator::new(Shape::int().min(0));
        let parallel = ListValidator::new(Shape::int().min(0)).parallel();
        let input = json!([1, -1, "x", 3, -5]);
        assert_eq!(
            sequential.validate(&input).into_result(),
            parallel.validate(&input).into_result()
        );
    }

    #[tokio::test]
    async fn test_async_items_run_in_order() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let item = Shape::int().check_fn_async("in_order", move |n: &i64| {
            let expected = *n as usize;
            let counter = Arc::clone(&counter);
            async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst) == expected
            }
            .boxed()
        });
        let v = ListValidator::new(item);
        assert!(v.requires_async());
        assert!(v.validate_async(&json!([0, 1, 2, 3])).await.is_success());
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_async_parallel_keeps_positions() {
        let v = ListValidator::new(Shape::string().min_len(2)).parallel();
        let err = unwrap_failure(v.validate_async(&json!(["ok", "x", "fine", ""])).await);
        assert_eq!(item_indices(&err), vec![1, 3]);
    }
}
