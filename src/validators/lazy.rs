//! Deferred validators for recursive and forward-declared shapes.
//!
//! A [`Lazy`] holds a thunk instead of a validator. The thunk runs at
//! validation time, never at construction, so a validator may contain a
//! reference to itself or to one defined later.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UsageError;
use crate::info::{ValidatorInfo, ValidatorKind};
use crate::validation::Checked;

use super::traits::Validator;

type Resolve<T> = Arc<dyn Fn() -> Result<Arc<dyn Validator<T>>, UsageError> + Send + Sync>;

/// A validator resolved through a thunk on every call.
///
/// [`memoize`](Lazy::memoize) keeps the first successful resolution. The
/// `recurrent` flag (default `true`) only marks the reference as
/// potentially self-referential for interpreters that traverse validator
/// graphs; it does not change validation.
///
/// A `Lazy` reports `requires_async == false` because its target is unknown
/// until resolved. An async-only target still refuses the sync path, at
/// call time.
///
/// # Example
///
/// ```rust
/// use conform::{Field, Lazy, RecordValidator, Shape, Validator, ValidatorExt};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// #[derive(Debug, PartialEq)]
/// struct Chain {
///     head: i64,
///     tail: Option<Box<Chain>>,
/// }
///
/// fn chain() -> Arc<dyn Validator<Chain>> {
///     RecordValidator::new(
///         (
///             Field::required("head", Shape::int()),
///             Field::optional("tail", Lazy::new(chain).map(Box::new)),
///         ),
///         |(head, tail)| Chain { head, tail },
///     )
///     .unwrap()
///     .shared()
/// }
///
/// let valid = chain().validate(&json!({"head": 1, "tail": {"head": 2}}));
/// assert_eq!(valid.into_result().unwrap().tail.unwrap().head, 2);
/// ```
pub struct Lazy<T> {
    resolve: Resolve<T>,
    memo: Option<Arc<OnceLock<Arc<dyn Validator<T>>>>>,
    info: Arc<ValidatorInfo>,
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            resolve: Arc::clone(&self.resolve),
            memo: self.memo.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub fn new<V, F>(thunk: F) -> Self
    where
        V: Validator<T> + 'static,
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self::from_resolver("lazy", move || Ok(Arc::new(thunk()) as Arc<dyn Validator<T>>))
    }

    /// A thunk that may fail to resolve, such as a registry lookup.
    pub(crate) fn from_resolver(
        name: impl Into<Cow<'static, str>>,
        resolve: impl Fn() -> Result<Arc<dyn Validator<T>>, UsageError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            resolve: Arc::new(resolve),
            memo: None,
            info: Arc::new(ValidatorInfo::new(name, ValidatorKind::Lazy { recurrent: true })),
        }
    }

    /// Caches the first successful resolution.
    pub fn memoize(mut self) -> Self {
        self.memo = Some(Arc::new(OnceLock::new()));
        self
    }

    pub fn recurrent(mut self, recurrent: bool) -> Self {
        Arc::make_mut(&mut self.info).kind = ValidatorKind::Lazy { recurrent };
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        Arc::make_mut(&mut self.info).name = name.into();
        self
    }

    /// Runs the thunk, or returns the memoized target.
    pub fn resolve(&self) -> Result<Arc<dyn Validator<T>>, UsageError> {
        if let Some(target) = self.memo.as_ref().and_then(|memo| memo.get()) {
            return Ok(Arc::clone(target));
        }
        tracing::trace!(validator = %self.info.name, "resolving lazy validator");
        let target = (self.resolve)()?;
        match &self.memo {
            Some(memo) => Ok(Arc::clone(memo.get_or_init(|| target))),
            None => Ok(target),
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Validator<T> for Lazy<T> {
    fn try_validate(&self, value: &Value) -> Checked<T> {
        self.resolve()?.try_validate(value)
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<T> {
        let target = self.resolve()?;
        target.try_validate_async(value).await
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::Shape;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_thunk_runs_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let v = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Shape::int()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(v.validate(&json!(1)).is_success());
        assert!(v.validate(&json!("x")).is_failure());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_memoize_resolves_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let v = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Shape::string()
        })
        .memoize();
        let copy = v.clone();
        assert!(v.validate(&json!("a")).is_success());
        assert!(copy.validate(&json!("b")).is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_come_from_target() {
        let v = Lazy::new(|| Shape::int().min(5));
        let err = v.validate(&json!(1)).into_result().unwrap_err();
        assert_eq!(err.source.name, "integer");
    }

    #[test]
    fn test_recurrent_flag_is_metadata() {
        let v = Lazy::new(Shape::boolean).recurrent(false);
        assert_eq!(v.info().kind, ValidatorKind::Lazy { recurrent: false });
        assert!(!v.requires_async());
    }

    #[test]
    fn test_resolution_errors_propagate() {
        let v: Lazy<i64> = Lazy::from_resolver("ref", || {
            Err(UsageError::UnresolvedReference { name: "Missing".to_string() })
        });
        assert_eq!(
            v.try_validate(&json!(1)).err(),
            Some(UsageError::UnresolvedReference { name: "Missing".to_string() })
        );
    }

    fn async_target() -> Lazy<i64> {
        Lazy::new(|| Shape::int().check_fn_async("known", |n: &i64| {
            let known = *n > 0;
            async move { known }.boxed()
        }))
    }

    #[test]
    fn test_async_only_target_refuses_sync_path_when_invoked() {
        let v = async_target();
        assert!(!v.requires_async());
        for input in [json!(1), json!("x")] {
            assert_eq!(
                v.try_validate(&input).err(),
                Some(UsageError::AsyncOnly {
                    validator: "integer".to_string()
                })
            );
        }
    }

    #[tokio::test]
    async fn test_async_only_target_runs_on_async_path() {
        let v = async_target();
        assert!(v.validate_async(&json!(3)).await.is_success());
        assert!(v.validate_async(&json!(-3)).await.is_failure());
    }
}
