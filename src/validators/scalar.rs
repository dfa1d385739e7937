//! Scalar validators: strings, integers, floats, booleans and `null`.
//!
//! One generic [`ScalarValidator`] runs the canonical pipeline for every
//! scalar type: coerce or type-check, process, then evaluate every
//! predicate. The [`Scalar`] trait supplies the per-type pieces.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use stillwater::Validation;

use crate::coerce::Coercer;
use crate::error::{ErrKind, Invalid};
use crate::info::{ValidatorInfo, ValidatorKind};
use crate::pipeline::{Checks, Processors};
use crate::predicate::{
    AsyncFnPredicate, Choices, EmailPredicate, EndsWith, EqualTo, ExactLength, FnPredicate, Max,
    MaxLength, Min, MinLength, MultipleOf, NotBlank, Predicate, PredicateAsync, RegexPredicate,
    StartsWith,
};
use crate::processor::{LowerCase, Processor, Strip, UpperCase};
use crate::validation::Checked;

use super::traits::{guard_sync, Validator};

/// A type a [`ScalarValidator`] can produce.
pub trait Scalar: Clone + Send + Sync + 'static {
    /// Name reported in `TypeMismatch`.
    const TYPE_NAME: &'static str;

    /// Strict structural type check, no conversion.
    fn from_value(value: &Value) -> Option<Self>;

    fn to_value(&self) -> Value;
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

/// Only integral JSON numbers; `1.0` is a float.
impl Scalar for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

/// Only non-integral JSON numbers unless a coercer says otherwise.
impl Scalar for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.is_f64() => n.as_f64(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

/// Validates a JSON scalar into `T`.
///
/// # Example
///
/// ```rust
/// use conform::{ErrKind, Shape, Validator};
/// use serde_json::json;
///
/// let age = Shape::int().min(0).max(150);
///
/// assert!(age.validate(&json!(30)).is_success());
///
/// let err = age.validate(&json!(-1)).into_result().unwrap_err();
/// assert!(matches!(err.err, ErrKind::PredicateFailures(ref failed) if failed[0].name == "min"));
/// ```
pub struct ScalarValidator<T: Scalar> {
    coercer: Option<Coercer<T>>,
    processors: Processors<T>,
    checks: Checks<T>,
    info: Arc<ValidatorInfo>,
}

impl<T: Scalar> Clone for ScalarValidator<T> {
    fn clone(&self) -> Self {
        Self {
            coercer: self.coercer.clone(),
            processors: self.processors.clone(),
            checks: self.checks.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

pub type StringValidator = ScalarValidator<String>;
pub type IntValidator = ScalarValidator<i64>;
pub type FloatValidator = ScalarValidator<f64>;
pub type BoolValidator = ScalarValidator<bool>;

impl<T: Scalar> Default for ScalarValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ScalarValidator<T> {
    /// Creates a validator that accepts exactly `T`'s JSON type, with no
    /// processors or predicates.
    pub fn new() -> Self {
        Self::with_kind(ValidatorKind::Scalar)
    }

    pub(crate) fn with_kind(kind: ValidatorKind) -> Self {
        Self {
            coercer: None,
            processors: Processors::new(),
            checks: Checks::new(),
            info: Arc::new(ValidatorInfo::new(T::TYPE_NAME, kind)),
        }
    }

    /// Overrides the name reported through [`ValidatorInfo`].
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        Arc::make_mut(&mut self.info).name = name.into();
        self
    }

    /// Replaces the strict type check with a coercer.
    pub fn coerce(mut self, coercer: Coercer<T>) -> Self {
        Arc::make_mut(&mut self.info).coerces_from = Some(coercer.compatible_types().to_vec());
        self.coercer = Some(coercer);
        self
    }

    /// Appends a processor. Processors run in the order they were added,
    /// after the type check and before any predicate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{FnProcessor, Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::int()
    ///     .process(FnProcessor::new("clamp", |n: i64| n.min(10)))
    ///     .max(10);
    ///
    /// assert_eq!(v.validate(&json!(42)).into_result().ok(), Some(10));
    /// ```
    pub fn process(mut self, processor: impl Processor<T> + 'static) -> Self {
        Arc::make_mut(&mut self.info).processors.push(processor.name());
        self.processors.push(processor);
        self
    }

    /// Appends a predicate. Every predicate is evaluated, and the failure
    /// lists all of those that returned false, in the order they were added.
    pub fn predicate(mut self, predicate: impl Predicate<T> + 'static) -> Self {
        self.checks.push(predicate);
        self.refresh_predicates();
        self
    }

    /// Adds an async-only predicate. The validator then refuses the sync path.
    pub fn predicate_async(mut self, predicate: impl PredicateAsync<T> + 'static) -> Self {
        self.checks.push_async(predicate);
        self.refresh_predicates();
        Arc::make_mut(&mut self.info).requires_async = true;
        self
    }

    /// Appends a named closure predicate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{ErrKind, Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::int()
    ///     .check_fn("even", |n: &i64| n % 2 == 0)
    ///     .check_fn("positive", |n: &i64| *n > 0);
    ///
    /// let err = v.validate(&json!(-3)).into_result().unwrap_err();
    /// let ErrKind::PredicateFailures(failed) = err.err else { unreachable!() };
    /// let names: Vec<_> = failed.iter().map(|p| p.name.to_string()).collect();
    /// assert_eq!(names, vec!["even", "positive"]);
    /// ```
    pub fn check_fn(self, name: impl Into<Cow<'static, str>>, f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate(FnPredicate::new(name, f))
    }

    /// Appends a named async closure predicate; see [`Self::predicate_async`].
    pub fn check_fn_async<F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        self.predicate_async(AsyncFnPredicate::new(name, f))
    }

    /// Accepts only the listed values. Reported as `choices`, with the
    /// allowed values as a parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let level = Shape::string().lower_case().one_of(["debug".to_string(), "info".to_string()]);
    ///
    /// assert!(level.validate(&json!("INFO")).is_success());
    /// assert!(level.validate(&json!("trace")).is_failure());
    /// ```
    pub fn one_of(self, choices: impl IntoIterator<Item = T>) -> Self
    where
        T: PartialEq + Into<Value>,
    {
        self.predicate(Choices::new(choices))
    }

    /// Accepts only `expected`.
    pub fn equal_to(self, expected: T) -> Self
    where
        T: PartialEq + Into<Value>,
    {
        self.predicate(EqualTo(expected))
    }

    fn refresh_predicates(&mut self) {
        let infos = self.checks.infos();
        Arc::make_mut(&mut self.info).predicates = infos;
    }

    /// Stages 1 and 2: type confirmation, then processing.
    fn prepare(&self, value: &Value) -> Result<T, Invalid> {
        let typed = match &self.coercer {
            Some(coercer) => coercer.attempt(value),
            None => T::from_value(value),
        };
        let typed = typed.ok_or_else(|| Invalid::type_mismatch(T::TYPE_NAME, value, &self.info))?;
        Ok(self.processors.run(typed))
    }

    fn conclude(&self, value: T, failed: Vec<crate::info::PredicateInfo>) -> Validation<T, Invalid> {
        if failed.is_empty() {
            Validation::Success(value)
        } else {
            Validation::Failure(Invalid::new(
                ErrKind::PredicateFailures(failed),
                value.to_value(),
                &self.info,
            ))
        }
    }
}

impl<N> ScalarValidator<N>
where
    N: Scalar + PartialOrd + Into<Value>,
{
    /// Inclusive lower bound.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::float().min(0.5);
    ///
    /// assert!(v.validate(&json!(0.5)).is_success());
    /// assert!(v.validate(&json!(0.25)).is_failure());
    /// ```
    pub fn min(self, bound: N) -> Self {
        self.predicate(Min::new(bound))
    }

    /// Inclusive upper bound.
    pub fn max(self, bound: N) -> Self {
        self.predicate(Max::new(bound))
    }

    /// Exclusive lower bound.
    pub fn gt(self, bound: N) -> Self {
        self.predicate(Min::exclusive(bound))
    }

    /// Exclusive upper bound.
    pub fn lt(self, bound: N) -> Self {
        self.predicate(Max::exclusive(bound))
    }
}

impl IntValidator {
    /// The value must divide evenly by `factor`. A zero factor rejects
    /// every value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::int().multiple_of(5);
    ///
    /// assert!(v.validate(&json!(-15)).is_success());
    /// assert!(v.validate(&json!(12)).is_failure());
    /// ```
    pub fn multiple_of(self, factor: i64) -> Self {
        self.predicate(MultipleOf(factor))
    }
}

impl FloatValidator {
    /// The remainder of dividing by `factor` must be exactly zero, so prefer
    /// factors that are exact in binary, such as `0.5` or `0.25`.
    pub fn multiple_of(self, factor: f64) -> Self {
        self.predicate(MultipleOf(factor))
    }
}

impl StringValidator {
    /// Adds a minimum length constraint.
    ///
    /// Length counts Unicode scalar values, not bytes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::string().min_len(3);
    ///
    /// assert!(v.validate(&json!("héé")).is_success());
    /// assert!(v.validate(&json!("hé")).is_failure());
    /// ```
    pub fn min_len(self, length: usize) -> Self {
        self.predicate(MinLength(length))
    }

    /// Adds a maximum length constraint, counted in Unicode scalar values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::string().max_len(5);
    ///
    /// assert!(v.validate(&json!("hello")).is_success());
    /// assert!(v.validate(&json!("hello!")).is_failure());
    /// ```
    pub fn max_len(self, length: usize) -> Self {
        self.predicate(MaxLength(length))
    }

    /// The string must have exactly `length` characters.
    pub fn exact_len(self, length: usize) -> Self {
        self.predicate(ExactLength(length))
    }

    /// Requires a literal prefix. The check is case-sensitive; pair it with
    /// [`Self::lower_case`] for case-insensitive matching.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::string().lower_case().starts_with("https://");
    ///
    /// assert!(v.validate(&json!("HTTPS://example.com")).is_success());
    /// assert!(v.validate(&json!("ftp://example.com")).is_failure());
    /// ```
    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.predicate(StartsWith(prefix.into()))
    }

    /// Requires a literal suffix.
    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.predicate(EndsWith(suffix.into()))
    }

    /// Rejects empty and whitespace-only strings without altering the value.
    pub fn not_blank(self) -> Self {
        self.predicate(NotBlank)
    }

    /// A pragmatic address check: `local@domain.tld`, ASCII only, no
    /// whitespace. It does not attempt full RFC 5322 parsing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let v = Shape::string().strip().email();
    ///
    /// assert!(v.validate(&json!(" ada@example.com ")).is_success());
    /// assert!(v.validate(&json!("ada@localhost")).is_failure());
    /// ```
    pub fn email(self) -> Self {
        self.predicate(EmailPredicate)
    }

    /// Adds a regex constraint. The pattern matches anywhere in the string
    /// unless it is anchored with `^` and `$`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Shape, Validator};
    /// use serde_json::json;
    ///
    /// let slug = Shape::string().pattern(r"^[a-z0-9-]+$").unwrap();
    ///
    /// assert!(slug.validate(&json!("hello-world")).is_success());
    /// assert!(slug.validate(&json!("Hello World")).is_failure());
    /// assert!(Shape::string().pattern("(").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the compilation error for an invalid pattern.
    pub fn pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.predicate(RegexPredicate::new(pattern)?))
    }

    /// Trims leading and trailing whitespace before predicates run.
    pub fn strip(self) -> Self {
        self.process(Strip)
    }

    pub fn upper_case(self) -> Self {
        self.process(UpperCase)
    }

    /// Lowercases the value before predicates run.
    pub fn lower_case(self) -> Self {
        self.process(LowerCase)
    }
}

#[async_trait]
impl<T: Scalar> Validator<T> for ScalarValidator<T> {
    fn try_validate(&self, value: &Value) -> Checked<T> {
        guard_sync(&self.info)?;
        let processed = match self.prepare(value) {
            Ok(v) => v,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures(&processed);
        Ok(self.conclude(processed, failed))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<T> {
        let processed = match self.prepare(value) {
            Ok(v) => v,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures_async(&processed).await;
        Ok(self.conclude(processed, failed))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}

/// Accepts only `null`.
#[derive(Clone)]
pub struct NoneValidator {
    info: Arc<ValidatorInfo>,
}

impl Default for NoneValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl NoneValidator {
    pub fn new() -> Self {
        Self {
            info: Arc::new(ValidatorInfo::new("null", ValidatorKind::Null)),
        }
    }

    fn check(&self, value: &Value) -> Validation<(), Invalid> {
        if value.is_null() {
            Validation::Success(())
        } else {
            Validation::Failure(Invalid::type_mismatch("null", value, &self.info))
        }
    }
}

#[async_trait]
impl Validator<()> for NoneValidator {
    fn try_validate(&self, value: &Value) -> Checked<()> {
        Ok(self.check(value))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<()> {
        Ok(self.check(value))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}
