//! The result of running a validator.
//!
//! A validation either succeeds with the conformed value or fails with an
//! [`Invalid`]; both are ordinary return values carried by stillwater's
//! `Validation`. The outer `Result` of [`Checked`] is reserved for
//! [`UsageError`]s.

use stillwater::Validation;

use crate::error::{Invalid, UsageError};

/// `Validation::Success` is the valid outcome, `Validation::Failure` the invalid one.
pub type ValidationResult<T> = Validation<T, Invalid>;

/// A validation outcome, or a programming error that prevented validation.
pub type Checked<T> = Result<ValidationResult<T>, UsageError>;

pub(crate) fn map_valid<T, U>(result: ValidationResult<T>, f: impl FnOnce(T) -> U) -> ValidationResult<U> {
    match result {
        Validation::Success(value) => Validation::Success(f(value)),
        Validation::Failure(invalid) => Validation::Failure(invalid),
    }
}

pub(crate) fn duplicate<T: Clone>(result: &ValidationResult<T>) -> ValidationResult<T> {
    match result {
        Validation::Success(value) => Validation::Success(value.clone()),
        Validation::Failure(invalid) => Validation::Failure(invalid.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrKind;
    use crate::info::{ValidatorInfo, ValidatorKind};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_map_and_duplicate() {
        let ok: ValidationResult<i64> = Validation::Success(2);
        assert_eq!(map_valid(ok, |n| n * 10).into_result().ok(), Some(20));

        let src = Arc::new(ValidatorInfo::new("int", ValidatorKind::Scalar));
        let bad = Invalid::new(ErrKind::MissingField, json!({}), &src);
        let failed: ValidationResult<i64> = Validation::Failure(bad.clone());
        let copy = duplicate(&failed);
        assert_eq!(map_valid(copy, |n| n + 1).into_result().err(), Some(bad));
    }
}
