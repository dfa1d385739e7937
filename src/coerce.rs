//! Optional conversion of arbitrary input into a validator's target type.
//!
//! Without a coercer a validator performs a strict structural type check:
//! a JSON string is a `String`, an integral JSON number is an `i64`, and
//! nothing is converted. A [`Coercer`] replaces that check entirely, so it
//! must also accept values already of the target type if that is wanted.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type CoerceFn<T> = Arc<dyn Fn(&Value) -> Option<T> + Send + Sync>;

/// A conversion `Value -> Option<T>` with advisory source-type metadata.
///
/// `compatible_types` documents which JSON types the coercer examines; it
/// is never enforced.
///
/// # Example
///
/// ```rust
/// use conform::{coerce, Shape, Validator};
/// use serde_json::json;
///
/// let port = Shape::int().coerce(coerce::int_from_string()).min(1);
/// assert!(port.validate(&json!("8080")).is_success());
/// assert!(port.validate(&json!(8080)).is_success());
/// assert!(port.validate(&json!("http")).is_failure());
/// ```
pub struct Coercer<T> {
    f: CoerceFn<T>,
    compatible_types: Vec<Cow<'static, str>>,
}

impl<T> Clone for Coercer<T> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            compatible_types: self.compatible_types.clone(),
        }
    }
}

impl<T> fmt::Debug for Coercer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercer")
            .field("compatible_types", &self.compatible_types)
            .finish_non_exhaustive()
    }
}

impl<T> Coercer<T> {
    pub fn new<I, S>(compatible_types: I, f: impl Fn(&Value) -> Option<T> + Send + Sync + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            f: Arc::new(f),
            compatible_types: compatible_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `None` for anything the coercer does not recognize.
    pub fn attempt(&self, value: &Value) -> Option<T> {
        (self.f)(value)
    }

    pub fn compatible_types(&self) -> &[Cow<'static, str>] {
        &self.compatible_types
    }
}

/// Integers, or strings holding a base-10 integer.
pub fn int_from_string() -> Coercer<i64> {
    Coercer::new(["integer", "string"], |value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Any JSON number, integral or not.
pub fn float_from_number() -> Coercer<f64> {
    Coercer::new(["integer", "number"], Value::as_f64)
}

/// Booleans, or the strings `"true"` and `"false"` in any case.
pub fn bool_from_string() -> Coercer<bool> {
    Coercer::new(["boolean", "string"], |value| match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    })
}
