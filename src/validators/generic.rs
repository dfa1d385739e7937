//! Validators that do not narrow the input's type.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stillwater::Validation;

use crate::info::{ValidatorInfo, ValidatorKind};
use crate::validation::Checked;

use super::scalar::{Scalar, ScalarValidator};
use super::traits::Validator;

/// A scalar validator that accepts exactly one value.
///
/// Built by [`Shape::equals`](crate::Shape::equals). A value of the wrong
/// type is a `TypeMismatch`; a value of the right type that differs is a
/// failed `equal_to` predicate.
pub type EqualsValidator<T> = ScalarValidator<T>;

pub(crate) fn equals<T>(expected: T) -> EqualsValidator<T>
where
    T: Scalar + PartialEq + Into<Value>,
{
    ScalarValidator::with_kind(ValidatorKind::Equals).equal_to(expected)
}

/// Accepts every input unchanged.
#[derive(Clone)]
pub struct AlwaysValid {
    info: Arc<ValidatorInfo>,
}

impl Default for AlwaysValid {
    fn default() -> Self {
        Self::new()
    }
}

impl AlwaysValid {
    pub fn new() -> Self {
        Self {
            info: Arc::new(ValidatorInfo::new("any", ValidatorKind::AlwaysValid)),
        }
    }
}

#[async_trait]
impl Validator<Value> for AlwaysValid {
    fn try_validate(&self, value: &Value) -> Checked<Value> {
        Ok(Validation::Success(value.clone()))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<Value> {
        Ok(Validation::Success(value.clone()))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrKind;
    use serde_json::json;

    #[test]
    fn test_equals() {
        let v = equals("v1".to_string());
        assert!(v.validate(&json!("v1")).is_success());
        assert_eq!(v.info().kind, ValidatorKind::Equals);

        let err = v.validate(&json!("v2")).into_result().unwrap_err();
        assert!(matches!(err.err, ErrKind::PredicateFailures(ref f) if f[0].name == "equal_to"));

        let err = v.validate(&json!(1)).into_result().unwrap_err();
        assert_eq!(err.err, ErrKind::TypeMismatch { expected: "string".into() });
    }

    #[test]
    fn test_always_valid_returns_input() {
        let input = json!({"anything": [1, null]});
        assert_eq!(AlwaysValid::new().validate(&input).into_result().ok(), Some(input));
    }
}
