//! Concrete validators and the [`Shape`] factory.
//!
//! Each validator runs the same pipeline: confirm the input's type
//! (optionally through a coercer), apply processors, then evaluate every
//! predicate. Compound validators add a child stage and, where configured,
//! a whole-value check over the assembled output.

mod cache;
mod dict;
mod generic;
mod lazy;
mod list;
mod map;
mod mapped;
mod optional;
mod record;
mod scalar;
mod traits;
mod tuple;
mod union;

pub use cache::{CacheConfig, CacheStore, CacheValidator, MemoryCache};
pub use dict::DictValidatorAny;
pub use generic::{AlwaysValid, EqualsValidator};
pub use lazy::Lazy;
pub use list::ListValidator;
pub use map::MapValidator;
pub use mapped::Mapped;
pub use optional::OptionalValidator;
pub use record::{Field, FieldFailures, FieldSet, RecordValidator};
pub use scalar::{
    BoolValidator, FloatValidator, IntValidator, NoneValidator, Scalar, ScalarValidator,
    StringValidator,
};
pub use traits::{Validator, ValidatorExt};
pub use tuple::{SlotFailures, SlotSet, TupleValidator};
pub use union::{
    OneOf2, OneOf2Validator, OneOf3, OneOf3Validator, OneOf4, OneOf4Validator, UnionValidator,
};

use std::hash::Hash;
use std::sync::Arc;

use serde_json::Value;

use crate::error::UsageError;

/// Entry point for building validators.
///
/// # Example
///
/// ```rust
/// use conform::{Shape, Validator};
/// use serde_json::json;
///
/// let tags = Shape::list(Shape::string().strip().not_blank()).max_items(5).unique();
///
/// let valid = tags.validate(&json!([" rust ", "json"])).into_result().unwrap();
/// assert_eq!(valid, vec!["rust", "json"]);
///
/// assert!(tags.validate(&json!(["a", "a"])).is_failure());
/// ```
pub struct Shape;

impl Shape {
    pub fn string() -> StringValidator {
        StringValidator::new()
    }

    /// Integers only. Floats such as `1.0` are rejected unless coerced.
    pub fn int() -> IntValidator {
        IntValidator::new()
    }

    /// Floats only. Integers are rejected unless coerced with
    /// [`coerce::float_from_number`](crate::coerce::float_from_number).
    pub fn float() -> FloatValidator {
        FloatValidator::new()
    }

    pub fn boolean() -> BoolValidator {
        BoolValidator::new()
    }

    pub fn null() -> NoneValidator {
        NoneValidator::new()
    }

    /// Accepts exactly `expected`.
    pub fn equals<T>(expected: T) -> EqualsValidator<T>
    where
        T: Scalar + PartialEq + Into<Value>,
    {
        generic::equals(expected)
    }

    pub fn any() -> AlwaysValid {
        AlwaysValid::new()
    }

    pub fn list<T: Send + Sync + 'static>(item: impl Validator<T> + 'static) -> ListValidator<T> {
        ListValidator::new(item)
    }

    pub fn map<K, V>(key: impl Validator<K> + 'static, value: impl Validator<V> + 'static) -> MapValidator<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        MapValidator::new(key, value)
    }

    pub fn dict() -> DictValidatorAny {
        DictValidatorAny::new()
    }

    pub fn tuple<S: SlotSet>(slots: S) -> TupleValidator<S> {
        TupleValidator::new(slots)
    }

    /// Fails with [`UsageError::EmptyUnion`] when `alternatives` is empty.
    pub fn union<T: Send + Sync + 'static>(
        alternatives: Vec<Arc<dyn Validator<T>>>,
    ) -> Result<UnionValidator<T>, UsageError> {
        UnionValidator::new(alternatives)
    }

    pub fn optional<T: Send + Sync + 'static>(inner: impl Validator<T> + 'static) -> OptionalValidator<T> {
        OptionalValidator::new(inner)
    }

    pub fn lazy<T, V, F>(thunk: F) -> Lazy<T>
    where
        T: Send + Sync + 'static,
        V: Validator<T> + 'static,
        F: Fn() -> V + Send + Sync + 'static,
    {
        Lazy::new(thunk)
    }
}
