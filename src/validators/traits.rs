//! The validator contract.
//!
//! A [`Validator<T>`] answers "is this value a valid `T`, and if not, why".
//! Every concrete validator, scalar or compound, implements this one trait,
//! so validators nest freely: a list of records of unions is just a
//! `ListValidator` holding a `RecordValidator` holding a `UnionValidator`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UsageError;
use crate::info::ValidatorInfo;
use crate::validation::{Checked, ValidationResult};

use super::cache::{CacheConfig, CacheValidator, MemoryCache};
use super::mapped::Mapped;
use super::optional::OptionalValidator;

/// Validates dynamic input into a `T`.
///
/// `try_validate` and `try_validate_async` are the primitive operations.
/// Their outer `Result` carries [`UsageError`]s only; data that fails to
/// conform is a `Validation::Failure` inside `Ok`.
///
/// A validator holding any async-only check reports
/// [`UsageError::AsyncOnly`] from the sync path on every call, before
/// looking at the input. Every validator can run on the async path.
///
/// # Example
///
/// ```rust
/// use conform::{Shape, Validator};
/// use serde_json::json;
///
/// let name = Shape::string().strip().min_len(1);
///
/// let result = name.validate(&json!("  ada "));
/// assert_eq!(result.into_result().ok(), Some("ada".to_string()));
///
/// assert!(name.validate(&json!("   ")).is_failure());
/// assert!(name.validate(&json!(42)).is_failure());
/// ```
#[async_trait]
pub trait Validator<T: Send + Sync + 'static>: Send + Sync {
    fn try_validate(&self, value: &Value) -> Checked<T>;

    async fn try_validate_async(&self, value: &Value) -> Checked<T>;

    fn info(&self) -> Arc<ValidatorInfo>;

    /// True if the sync path would report [`UsageError::AsyncOnly`].
    fn requires_async(&self) -> bool {
        self.info().requires_async
    }

    /// Validates synchronously.
    ///
    /// # Panics
    ///
    /// Panics on a [`UsageError`], e.g. when the validator holds async-only
    /// checks. Use [`try_validate`](Validator::try_validate) to handle
    /// misuse without unwinding.
    fn validate(&self, value: &Value) -> ValidationResult<T> {
        match self.try_validate(value) {
            Ok(result) => result,
            Err(err) => panic!("{}", err),
        }
    }

    /// Validates on the async path, suspending at async checks.
    ///
    /// # Panics
    ///
    /// Panics on a [`UsageError`], e.g. an unresolvable registry reference.
    async fn validate_async(&self, value: &Value) -> ValidationResult<T> {
        match self.try_validate_async(value).await {
            Ok(result) => result,
            Err(err) => panic!("{}", err),
        }
    }
}

#[async_trait]
impl<T, V> Validator<T> for Arc<V>
where
    T: Send + Sync + 'static,
    V: Validator<T> + ?Sized,
{
    fn try_validate(&self, value: &Value) -> Checked<T> {
        (**self).try_validate(value)
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<T> {
        (**self).try_validate_async(value).await
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        (**self).info()
    }

    fn requires_async(&self) -> bool {
        (**self).requires_async()
    }
}

/// Rejects the sync path for validators holding async-only checks.
pub(crate) fn guard_sync(info: &ValidatorInfo) -> Result<(), UsageError> {
    if info.requires_async {
        tracing::debug!(validator = %info.name, "async-only validator invoked synchronously");
        return Err(UsageError::AsyncOnly {
            validator: info.name.to_string(),
        });
    }
    Ok(())
}

/// Combinators available on every validator.
pub trait ValidatorExt<T: Send + Sync + 'static>: Validator<T> + Sized + 'static {
    /// Transforms a valid output. Failures pass through untouched.
    fn map<U, F>(self, f: F) -> Mapped<T, U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Mapped::new(self, f)
    }

    /// Converts the output into a `serde_json::Value`, for use as a
    /// [`DictValidatorAny`](crate::DictValidatorAny) field.
    fn to_value(self) -> Mapped<T, Value>
    where
        T: Into<Value>,
    {
        Mapped::new(self, Into::into)
    }

    /// Accepts `null` as `None`.
    fn nullable(self) -> OptionalValidator<T> {
        OptionalValidator::new(self)
    }

    /// Memoizes results in a bounded in-memory cache.
    fn cached(self, config: CacheConfig) -> CacheValidator<T>
    where
        T: Clone,
    {
        CacheValidator::new(self, MemoryCache::new(config))
    }

    /// Erases the concrete type behind a shared handle.
    fn shared(self) -> Arc<dyn Validator<T>> {
        Arc::new(self)
    }
}

impl<T, V> ValidatorExt<T> for V
where
    T: Send + Sync + 'static,
    V: Validator<T> + Sized + 'static,
{
}
