//! Nullable values.
//!
//! [`OptionalValidator`] is the value-level half of optionality: it decides
//! what a present `null` means. Whether a key may be missing is decided by
//! the field declaration on a record or dict.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stillwater::Validation;

use crate::error::{ErrKind, Invalid};
use crate::info::{ValidatorInfo, ValidatorKind};
use crate::validation::{Checked, ValidationResult};

use super::traits::{guard_sync, Validator};

/// Accepts `null` as `None`, anything else through the inner validator.
///
/// Behaves as the union of a null check and the inner validator: when the
/// inner validator rejects a non-null input, the failure is
/// `UnionExhausted([null mismatch, inner failure])`.
///
/// Absence of a record key is a separate concern, handled by
/// [`Field::optional`](crate::Field::optional).
pub struct OptionalValidator<T> {
    inner: Arc<dyn Validator<T>>,
    info: Arc<ValidatorInfo>,
}

impl<T> Clone for OptionalValidator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            info: Arc::clone(&self.info),
        }
    }
}

impl<T: Send + Sync + 'static> OptionalValidator<T> {
    pub fn new(inner: impl Validator<T> + 'static) -> Self {
        let info = ValidatorInfo::new("optional", ValidatorKind::Optional).requiring_async(inner.requires_async());
        Self {
            inner: Arc::new(inner),
            info: Arc::new(info),
        }
    }

    fn widen(&self, result: ValidationResult<T>, value: &Value) -> ValidationResult<Option<T>> {
        match result {
            Validation::Success(valid) => Validation::Success(Some(valid)),
            Validation::Failure(inner) => {
                let null = Invalid::type_mismatch("null", value, &self.info);
                Validation::Failure(Invalid::new(
                    ErrKind::UnionExhausted(vec![null, inner]),
                    value.clone(),
                    &self.info,
                ))
            }
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Validator<Option<T>> for OptionalValidator<T> {
    fn try_validate(&self, value: &Value) -> Checked<Option<T>> {
        guard_sync(&self.info)?;
        if value.is_null() {
            return Ok(Validation::Success(None));
        }
        Ok(self.widen(self.inner.try_validate(value)?, value))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<Option<T>> {
        if value.is_null() {
            return Ok(Validation::Success(None));
        }
        let result = self.inner.try_validate_async(value).await?;
        Ok(self.widen(result, value))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}
