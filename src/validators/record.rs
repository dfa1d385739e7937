//! Statically typed records with named fields.
//!
//! A [`RecordValidator`] takes a tuple of [`Field`]s, validates each one in
//! declared order, and hands the tuple of validated values to an assembler
//! closure that builds the output type. Up to 16 fields are supported;
//! beyond that use [`DictValidatorAny`](crate::DictValidatorAny).

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{ErrKind, Invalid, UsageError};
use crate::info::{FieldInfo, Presence, ValidatorInfo, ValidatorKind};
use crate::pipeline::{run_whole, run_whole_async, WholeCheck};
use crate::validation::Checked;

use super::mapped::Mapped;
use super::traits::{guard_sync, Validator};

type Fill<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A named field of a record.
///
/// Presence and nullability are independent: `Field::optional` makes the
/// key optional, while a nullable value is expressed by the field's
/// validator (e.g. `Shape::int().nullable()`).
pub struct Field<T> {
    key: String,
    validator: Arc<dyn Validator<T>>,
    presence: Presence,
    fill: Option<Fill<T>>,
}

impl<T: Send + Sync + 'static> Field<T> {
    /// Absence is reported as `MissingField`.
    pub fn required(key: impl Into<String>, validator: impl Validator<T> + 'static) -> Self {
        Self {
            key: key.into(),
            validator: Arc::new(validator),
            presence: Presence::Required,
            fill: None,
        }
    }

    /// Absence produces a clone of `default`. Defaults are not validated.
    pub fn with_default(key: impl Into<String>, validator: impl Validator<T> + 'static, default: T) -> Self
    where
        T: Clone,
    {
        Self::with_default_fn(key, validator, move || default.clone())
    }

    pub fn with_default_fn(
        key: impl Into<String>,
        validator: impl Validator<T> + 'static,
        default: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            validator: Arc::new(validator),
            presence: Presence::Defaulted,
            fill: Some(Arc::new(default)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn info(&self) -> FieldInfo {
        FieldInfo {
            key: self.key.clone(),
            presence: self.presence,
        }
    }

    fn absent(&self, whole: &Value, owner: &Arc<ValidatorInfo>) -> Result<T, Invalid> {
        match &self.fill {
            Some(fill) => Ok(fill()),
            None => Err(Invalid::new(ErrKind::MissingField, whole.clone(), owner)),
        }
    }

    fn check(&self, object: &Map<String, Value>, whole: &Value, owner: &Arc<ValidatorInfo>) -> Result<Result<T, Invalid>, UsageError> {
        match object.get(&self.key) {
            Some(value) => Ok(self.validator.try_validate(value)?.into_result()),
            None => Ok(self.absent(whole, owner)),
        }
    }

    async fn check_async(
        &self,
        object: &Map<String, Value>,
        whole: &Value,
        owner: &Arc<ValidatorInfo>,
    ) -> Result<Result<T, Invalid>, UsageError> {
        match object.get(&self.key) {
            Some(value) => Ok(self.validator.try_validate_async(value).await?.into_result()),
            None => Ok(self.absent(whole, owner)),
        }
    }
}

impl<T: Send + Sync + 'static> Field<Option<T>> {
    /// Absence produces `None`. A present `null` still goes to `validator`.
    pub fn optional(key: impl Into<String>, validator: impl Validator<T> + 'static) -> Self {
        Self {
            key: key.into(),
            validator: Arc::new(Mapped::new(validator, Some)),
            presence: Presence::Optional,
            fill: Some(Arc::new(|| None)),
        }
    }
}

/// Per-field failures, keyed in declaration order.
pub type FieldFailures = IndexMap<String, Invalid>;

/// A tuple of [`Field`]s, implemented for arities 1 through 16.
#[async_trait]
pub trait FieldSet: Send + Sync + 'static {
    /// The tuple of validated field values, in declared order.
    type Values: Send + 'static;

    fn infos(&self) -> Vec<FieldInfo>;

    fn requires_async(&self) -> bool;

    fn check(
        &self,
        object: &Map<String, Value>,
        whole: &Value,
        owner: &Arc<ValidatorInfo>,
    ) -> Result<Result<Self::Values, FieldFailures>, UsageError>;

    async fn check_async(
        &self,
        object: &Map<String, Value>,
        whole: &Value,
        owner: &Arc<ValidatorInfo>,
    ) -> Result<Result<Self::Values, FieldFailures>, UsageError>;
}

macro_rules! field_set {
    ($(($idx:tt, $T:ident, $v:ident)),+) => {
        #[async_trait]
        impl<$($T: Send + Sync + 'static),+> FieldSet for ($(Field<$T>,)+) {
            type Values = ($($T,)+);

            fn infos(&self) -> Vec<FieldInfo> {
                vec![$(self.$idx.info()),+]
            }

            fn requires_async(&self) -> bool {
                false $(|| self.$idx.validator.requires_async())+
            }

            fn check(
                &self,
                object: &Map<String, Value>,
                whole: &Value,
                owner: &Arc<ValidatorInfo>,
            ) -> Result<Result<Self::Values, FieldFailures>, UsageError> {
                let mut errors = FieldFailures::new();
                $(
                    let $v = match self.$idx.check(object, whole, owner)? {
                        Ok(value) => Some(value),
                        Err(invalid) => {
                            errors.insert(self.$idx.key.clone(), invalid);
                            None
                        }
                    };
                )+
                match ($($v,)+) {
                    ($(Some($v),)+) => Ok(Ok(($($v,)+))),
                    _ => Ok(Err(errors)),
                }
            }

            async fn check_async(
                &self,
                object: &Map<String, Value>,
                whole: &Value,
                owner: &Arc<ValidatorInfo>,
            ) -> Result<Result<Self::Values, FieldFailures>, UsageError> {
                let mut errors = FieldFailures::new();
                $(
                    let $v = match self.$idx.check_async(object, whole, owner).await? {
                        Ok(value) => Some(value),
                        Err(invalid) => {
                            errors.insert(self.$idx.key.clone(), invalid);
                            None
                        }
                    };
                )+
                match ($($v,)+) {
                    ($(Some($v),)+) => Ok(Ok(($($v,)+))),
                    _ => Ok(Err(errors)),
                }
            }
        }
    };
}

field_set!((0, A, a));
field_set!((0, A, a), (1, B, b));
field_set!((0, A, a), (1, B, b), (2, C, c));
field_set!((0, A, a), (1, B, b), (2, C, c), (3, D, d));
field_set!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e));
field_set!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f));
field_set!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g));
field_set!((0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h));
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k), (11, L, l)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k), (11, L, l), (12, M, m)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k), (11, L, l), (12, M, m), (13, N, n)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k), (11, L, l), (12, M, m), (13, N, n), (14, O, o)
);
field_set!(
    (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h),
    (8, I, i), (9, J, j), (10, K, k), (11, L, l), (12, M, m), (13, N, n), (14, O, o),
    (15, P, p)
);

/// Validates a JSON object into `Out` through a fixed set of typed fields.
///
/// Fields are checked in declared order and every failure is kept: the
/// result is either the assembled value or one `FieldErrors` holding each
/// failing field. The assembler is only called when every field is valid.
/// With [`reject_unknown`](RecordValidator::reject_unknown), undeclared
/// keys are added to `FieldErrors` as `UnknownFieldsPresent`, after the
/// declared fields. An optional whole-value check runs last, on the
/// assembled value.
///
/// # Example
///
/// ```rust
/// use conform::{Field, RecordValidator, Shape, Validator};
/// use serde_json::json;
///
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     name: String,
///     age: Option<i64>,
/// }
///
/// let person = RecordValidator::new(
///     (
///         Field::required("name", Shape::string().min_len(1)),
///         Field::optional("age", Shape::int().min(0)),
///     ),
///     |(name, age)| Person { name, age },
/// )
/// .unwrap()
/// .reject_unknown();
///
/// let ada = person.validate(&json!({"name": "Ada"})).into_result().unwrap();
/// assert_eq!(ada, Person { name: "Ada".into(), age: None });
///
/// assert!(person.validate(&json!({"name": "Ada", "extra": 1})).is_failure());
/// ```
pub struct RecordValidator<Out, Fs: FieldSet> {
    fields: Arc<Fs>,
    assemble: Arc<dyn Fn(Fs::Values) -> Out + Send + Sync>,
    expected: Vec<String>,
    reject_unknown: bool,
    whole: Option<WholeCheck<Out>>,
    info: Arc<ValidatorInfo>,
}

impl<Out, Fs: FieldSet> Clone for RecordValidator<Out, Fs> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
            assemble: Arc::clone(&self.assemble),
            expected: self.expected.clone(),
            reject_unknown: self.reject_unknown,
            whole: self.whole.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl<Out, Fs> RecordValidator<Out, Fs>
where
    Out: Send + Sync + 'static,
    Fs: FieldSet,
{
    /// # Errors
    ///
    /// Returns [`UsageError::DuplicateField`] if two fields share a key.
    pub fn new(fields: Fs, assemble: impl Fn(Fs::Values) -> Out + Send + Sync + 'static) -> Result<Self, UsageError> {
        let infos = fields.infos();
        let mut expected: Vec<String> = Vec::with_capacity(infos.len());
        for field in &infos {
            if expected.contains(&field.key) {
                return Err(UsageError::DuplicateField {
                    key: field.key.clone(),
                });
            }
            expected.push(field.key.clone());
        }
        let info = ValidatorInfo::new("record", ValidatorKind::Record)
            .with_fields(infos)
            .requiring_async(fields.requires_async());
        Ok(Self {
            fields: Arc::new(fields),
            assemble: Arc::new(assemble),
            expected,
            reject_unknown: false,
            whole: None,
            info: Arc::new(info),
        })
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        Arc::make_mut(&mut self.info).name = name.into();
        self
    }

    /// Reports undeclared keys instead of ignoring them.
    pub fn reject_unknown(mut self) -> Self {
        self.reject_unknown = true;
        self
    }

    /// Adds a check over the assembled value; `Some` is a failure.
    pub fn check_with(self, check: impl Fn(&Out) -> Option<ErrKind> + Send + Sync + 'static) -> Self {
        self.with_whole(WholeCheck::Sync(Arc::new(check)))
    }

    /// Adds an async-only check over the assembled value. The validator
    /// then refuses the sync path.
    pub fn check_with_async<F>(self, check: F) -> Self
    where
        F: for<'a> Fn(&'a Out) -> BoxFuture<'a, Option<ErrKind>> + Send + Sync + 'static,
    {
        self.with_whole(WholeCheck::Async(Arc::new(check)))
    }

    /// Replaces the whole-value check; the async flag follows the new one.
    fn with_whole(mut self, whole: WholeCheck<Out>) -> Self {
        let requires_async = FieldSet::requires_async(&*self.fields) || whole.is_async_only();
        Arc::make_mut(&mut self.info).requires_async = requires_async;
        self.whole = Some(whole);
        self
    }

    fn unknown_fields(&self, object: &Map<String, Value>) -> FieldFailures {
        if !self.reject_unknown {
            return FieldFailures::new();
        }
        object
            .iter()
            .filter(|(key, _)| !self.expected.contains(key))
            .map(|(key, value)| {
                let err = ErrKind::UnknownFieldsPresent {
                    expected: self.expected.clone(),
                };
                (key.clone(), Invalid::new(err, value.clone(), &self.info))
            })
            .collect()
    }

    fn settle(
        &self,
        object: &Map<String, Value>,
        whole: &Value,
        checked: Result<Fs::Values, FieldFailures>,
    ) -> Result<Out, Invalid> {
        let unknown = self.unknown_fields(object);
        let errors = match checked {
            Ok(values) if unknown.is_empty() => return Ok((self.assemble)(values)),
            Ok(_) => unknown,
            Err(mut errors) => {
                errors.extend(unknown);
                errors
            }
        };
        Err(Invalid::new(ErrKind::FieldErrors(errors), whole.clone(), &self.info))
    }

    fn conclude(&self, out: Out, failure: Option<ErrKind>, whole: &Value) -> Validation<Out, Invalid> {
        match failure {
            None => Validation::Success(out),
            Some(err) => Validation::Failure(Invalid::new(err, whole.clone(), &self.info)),
        }
    }
}

#[async_trait]
impl<Out, Fs> Validator<Out> for RecordValidator<Out, Fs>
where
    Out: Send + Sync + 'static,
    Fs: FieldSet,
{
    fn try_validate(&self, value: &Value) -> Checked<Out> {
        guard_sync(&self.info)?;
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let checked = self.fields.check(object, value, &self.info)?;
        let out = match self.settle(object, value, checked) {
            Ok(out) => out,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failure = run_whole(&self.whole, &out);
        Ok(self.conclude(out, failure, value))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<Out> {
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let checked = self.fields.check_async(object, value, &self.info).await?;
        let out = match self.settle(object, value, checked) {
            Ok(out) => out,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failure = run_whole_async(&self.whole, &out).await;
        Ok(self.conclude(out, failure, value))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}
