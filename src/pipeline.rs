//! Building blocks shared by every validator's pipeline.
//!
//! [`Checks`] evaluates predicates with full accumulation, [`Processors`]
//! folds transforms left to right, and [`WholeCheck`] is the post-assembly
//! hook used by records, dicts and tuples.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::ErrKind;
use crate::info::PredicateInfo;
use crate::predicate::{Predicate, PredicateAsync};
use crate::processor::Processor;

pub(crate) struct Checks<T: ?Sized> {
    sync: Vec<Arc<dyn Predicate<T>>>,
    deferred: Vec<Arc<dyn PredicateAsync<T>>>,
}

impl<T: ?Sized> Clone for Checks<T> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            deferred: self.deferred.clone(),
        }
    }
}

impl<T: ?Sized + Sync> Checks<T> {
    pub(crate) fn new() -> Self {
        Self {
            sync: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, predicate: impl Predicate<T> + 'static) -> PredicateInfo {
        let info = predicate.info();
        self.sync.push(Arc::new(predicate));
        info
    }

    pub(crate) fn push_async(&mut self, predicate: impl PredicateAsync<T> + 'static) -> PredicateInfo {
        let info = predicate.info();
        self.deferred.push(Arc::new(predicate));
        info
    }

    pub(crate) fn is_async_only(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Declared predicates, synchronous first.
    pub(crate) fn infos(&self) -> Vec<PredicateInfo> {
        self.sync
            .iter()
            .map(|p| p.info())
            .chain(self.deferred.iter().map(|p| p.info()))
            .collect()
    }

    /// Every failing synchronous predicate, in declared order.
    pub(crate) fn failures(&self, value: &T) -> Vec<PredicateInfo> {
        self.sync
            .iter()
            .filter(|p| !p.check(value))
            .map(|p| p.info())
            .collect()
    }

    /// Synchronous failures followed by async failures. Async predicates run
    /// one at a time.
    pub(crate) async fn failures_async(&self, value: &T) -> Vec<PredicateInfo> {
        let mut failed = self.failures(value);
        for predicate in &self.deferred {
            if !predicate.check_async(value).await {
                failed.push(predicate.info());
            }
        }
        failed
    }
}

pub(crate) struct Processors<T> {
    steps: Vec<Arc<dyn Processor<T>>>,
}

impl<T> Clone for Processors<T> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<T> Processors<T> {
    pub(crate) fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn push(&mut self, processor: impl Processor<T> + 'static) {
        self.steps.push(Arc::new(processor));
    }

    pub(crate) fn names(&self) -> Vec<std::borrow::Cow<'static, str>> {
        self.steps.iter().map(|p| p.name()).collect()
    }

    pub(crate) fn run(&self, value: T) -> T {
        self.steps.iter().fold(value, |acc, step| step.apply(acc))
    }
}

type SyncCheck<T> = Arc<dyn Fn(&T) -> Option<ErrKind> + Send + Sync>;
type AsyncCheck<T> = Arc<dyn for<'a> Fn(&'a T) -> BoxFuture<'a, Option<ErrKind>> + Send + Sync>;

/// A check over a fully assembled value; `Some` is a failure.
pub(crate) enum WholeCheck<T> {
    Sync(SyncCheck<T>),
    Async(AsyncCheck<T>),
}

impl<T> Clone for WholeCheck<T> {
    fn clone(&self) -> Self {
        match self {
            WholeCheck::Sync(f) => WholeCheck::Sync(Arc::clone(f)),
            WholeCheck::Async(f) => WholeCheck::Async(Arc::clone(f)),
        }
    }
}

impl<T> WholeCheck<T> {
    pub(crate) fn is_async_only(&self) -> bool {
        matches!(self, WholeCheck::Async(_))
    }

    /// Callers guarantee an async check never reaches the sync path.
    pub(crate) fn run(&self, value: &T) -> Option<ErrKind> {
        match self {
            WholeCheck::Sync(f) => f(value),
            WholeCheck::Async(_) => None,
        }
    }

    pub(crate) async fn run_async(&self, value: &T) -> Option<ErrKind> {
        match self {
            WholeCheck::Sync(f) => f(value),
            WholeCheck::Async(f) => f(value).await,
        }
    }
}

/// Runs an optional whole-value check on the sync path.
pub(crate) fn run_whole<T>(check: &Option<WholeCheck<T>>, value: &T) -> Option<ErrKind> {
    check.as_ref().and_then(|c| c.run(value))
}

pub(crate) async fn run_whole_async<T: Sync>(check: &Option<WholeCheck<T>>, value: &T) -> Option<ErrKind> {
    match check {
        Some(c) => c.run_async(value).await,
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{AsyncFnPredicate, FnPredicate, Max, Min};
    use crate::processor::FnProcessor;
    use futures::FutureExt;

    #[test]
    fn test_failures_keep_declared_order() {
        let mut checks: Checks<i64> = Checks::new();
        checks.push(Max::new(0_i64));
        checks.push(Min::new(10_i64));
        checks.push(FnPredicate::new("odd", |n: &i64| n % 2 == 1));

        let names: Vec<_> = checks.failures(&4).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["max", "min", "odd"]);
        assert!(checks.failures(&4).len() == 3);
        assert!(!checks.is_async_only());
    }

    #[test]
    fn test_processors_fold_left_to_right() {
        let mut steps: Processors<i64> = Processors::new();
        steps.push(FnProcessor::new("add_one", |n: i64| n + 1));
        steps.push(FnProcessor::new("double", |n: i64| n * 2));
        assert_eq!(steps.run(3), 8);
        assert_eq!(steps.names(), vec!["add_one", "double"]);
    }

    #[tokio::test]
    async fn test_async_failures_follow_sync_failures() {
        let mut checks: Checks<i64> = Checks::new();
        checks.push_async(AsyncFnPredicate::new("remote_even", |n: &i64| {
            let ok = n % 2 == 0;
            async move { ok }.boxed()
        }));
        checks.push(Min::new(10_i64));

        assert!(checks.is_async_only());
        let names: Vec<_> = checks
            .failures_async(&3)
            .await
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["min", "remote_even"]);
        assert_eq!(checks.infos().len(), 2);
    }
}
