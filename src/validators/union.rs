//! Unions: exactly one of several alternative shapes.
//!
//! Alternatives are tried in declaration order and the first success wins.
//! Nothing after it runs, so when two alternatives could both accept an
//! input, the earlier one decides. When every alternative fails, the
//! failure carries each alternative's `Invalid`, in declaration order.
//!
//! [`UnionValidator`] covers alternatives sharing one output type. The
//! tagged [`OneOf2Validator`], [`OneOf3Validator`] and [`OneOf4Validator`]
//! hold alternatives with distinct output types and report which one
//! matched through the [`OneOf2`], [`OneOf3`] and [`OneOf4`] enums.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stillwater::Validation;

use crate::error::{ErrKind, Invalid, UsageError};
use crate::info::{ValidatorInfo, ValidatorKind};
use crate::validation::Checked;

use super::traits::{guard_sync, Validator};

fn exhausted(failures: Vec<Invalid>, value: &Value, info: &Arc<ValidatorInfo>) -> Invalid {
    Invalid::new(ErrKind::UnionExhausted(failures), value.clone(), info)
}

/// Alternatives sharing one output type.
///
/// # Example
///
/// ```rust
/// use conform::{ErrKind, Shape, UnionValidator, Validator, ValidatorExt};
/// use serde_json::json;
///
/// let port = UnionValidator::new(vec![
///     Shape::int().min(1).max(65535).shared(),
///     Shape::string().one_of(["http".to_string()]).map(|_| 80i64).shared(),
/// ])
/// .unwrap();
///
/// assert_eq!(port.validate(&json!("http")).into_result().ok(), Some(80));
///
/// let err = port.validate(&json!(true)).into_result().unwrap_err();
/// assert!(matches!(err.err, ErrKind::UnionExhausted(ref branches) if branches.len() == 2));
/// ```
pub struct UnionValidator<T> {
    alternatives: Vec<Arc<dyn Validator<T>>>,
    info: Arc<ValidatorInfo>,
}

impl<T> Clone for UnionValidator<T> {
    fn clone(&self) -> Self {
        Self {
            alternatives: self.alternatives.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl<T: Send + Sync + 'static> UnionValidator<T> {
    /// Fails with [`UsageError::EmptyUnion`] when `alternatives` is empty.
    pub fn new(alternatives: Vec<Arc<dyn Validator<T>>>) -> Result<Self, UsageError> {
        if alternatives.is_empty() {
            return Err(UsageError::EmptyUnion);
        }
        let requires_async = alternatives.iter().any(|alt| alt.requires_async());
        Ok(Self {
            alternatives,
            info: Arc::new(ValidatorInfo::new("union", ValidatorKind::Union).requiring_async(requires_async)),
        })
    }

    /// Appends an alternative, tried after every earlier one.
    pub fn or(mut self, alternative: impl Validator<T> + 'static) -> Self {
        let requires_async = alternative.requires_async();
        self.alternatives.push(Arc::new(alternative));
        if requires_async {
            Arc::make_mut(&mut self.info).requires_async = true;
        }
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        Arc::make_mut(&mut self.info).name = name.into();
        self
    }

    pub fn alternatives(&self) -> &[Arc<dyn Validator<T>>] {
        &self.alternatives
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Validator<T> for UnionValidator<T> {
    fn try_validate(&self, value: &Value) -> Checked<T> {
        guard_sync(&self.info)?;
        let mut failures = Vec::with_capacity(self.alternatives.len());
        for alternative in &self.alternatives {
            match alternative.try_validate(value)? {
                Validation::Success(valid) => return Ok(Validation::Success(valid)),
                Validation::Failure(invalid) => failures.push(invalid),
            }
        }
        Ok(Validation::Failure(exhausted(failures, value, &self.info)))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<T> {
        let mut failures = Vec::with_capacity(self.alternatives.len());
        for alternative in &self.alternatives {
            match alternative.try_validate_async(value).await? {
                Validation::Success(valid) => return Ok(Validation::Success(valid)),
                Validation::Failure(invalid) => failures.push(invalid),
            }
        }
        Ok(Validation::Failure(exhausted(failures, value, &self.info)))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}

macro_rules! one_of {
    (
        $(#[$meta:meta])*
        $Enum:ident, $Validator:ident, $name:literal;
        $(($T:ident, $Variant:ident, $field:ident)),+
    ) => {
        /// Which alternative of a tagged union matched, with its value.
        #[derive(Debug, Clone, PartialEq)]
        pub enum $Enum<$($T),+> {
            $($Variant($T)),+
        }

        $(#[$meta])*
        pub struct $Validator<$($T),+> {
            $($field: Arc<dyn Validator<$T>>,)+
            info: Arc<ValidatorInfo>,
        }

        impl<$($T),+> Clone for $Validator<$($T),+> {
            fn clone(&self) -> Self {
                Self {
                    $($field: Arc::clone(&self.$field),)+
                    info: Arc::clone(&self.info),
                }
            }
        }

        impl<$($T: Send + Sync + 'static),+> $Validator<$($T),+> {
            pub fn new($($field: impl Validator<$T> + 'static),+) -> Self {
                let requires_async = false $(|| $field.requires_async())+;
                Self {
                    $($field: Arc::new($field),)+
                    info: Arc::new(ValidatorInfo::new($name, ValidatorKind::Union).requiring_async(requires_async)),
                }
            }

            pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
                Arc::make_mut(&mut self.info).name = name.into();
                self
            }
        }

        #[async_trait]
        impl<$($T: Send + Sync + 'static),+> Validator<$Enum<$($T),+>> for $Validator<$($T),+> {
            fn try_validate(&self, value: &Value) -> Checked<$Enum<$($T),+>> {
                guard_sync(&self.info)?;
                let mut failures = Vec::new();
                $(
                    match self.$field.try_validate(value)? {
                        Validation::Success(valid) => return Ok(Validation::Success($Enum::$Variant(valid))),
                        Validation::Failure(invalid) => failures.push(invalid),
                    }
                )+
                Ok(Validation::Failure(exhausted(failures, value, &self.info)))
            }

            async fn try_validate_async(&self, value: &Value) -> Checked<$Enum<$($T),+>> {
                let mut failures = Vec::new();
                $(
                    match self.$field.try_validate_async(value).await? {
                        Validation::Success(valid) => return Ok(Validation::Success($Enum::$Variant(valid))),
                        Validation::Failure(invalid) => failures.push(invalid),
                    }
                )+
                Ok(Validation::Failure(exhausted(failures, value, &self.info)))
            }

            fn info(&self) -> Arc<ValidatorInfo> {
                Arc::clone(&self.info)
            }
        }
    };
}

one_of!(
    /// Two alternatives with distinct output types.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{OneOf2, OneOf2Validator, Shape, Validator};
    /// use serde_json::json;
    ///
    /// let id = OneOf2Validator::new(Shape::int(), Shape::string());
    /// assert_eq!(id.validate(&json!(7)).into_result().ok(), Some(OneOf2::First(7)));
    /// assert_eq!(
    ///     id.validate(&json!("seven")).into_result().ok(),
    ///     Some(OneOf2::Second("seven".to_string()))
    /// );
    /// ```
    OneOf2, OneOf2Validator, "one_of_2";
    (A, First, first), (B, Second, second)
);

one_of!(
    /// Three alternatives with distinct output types.
    OneOf3, OneOf3Validator, "one_of_3";
    (A, First, first), (B, Second, second), (C, Third, third)
);

one_of!(
    /// Four alternatives with distinct output types.
    OneOf4, OneOf4Validator, "one_of_4";
    (A, First, first), (B, Second, second), (C, Third, third), (D, Fourth, fourth)
);
