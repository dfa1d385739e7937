//! The `Invalid` outcome and its error-kind tree.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::info::{PredicateInfo, ValidatorInfo};
use crate::path::ErrorPath;

/// Caller-defined failure payload.
///
/// `code` identifies the failure for interpreters, `payload` carries
/// whatever extra data they need. The library never inspects either.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomErr {
    pub code: Cow<'static, str>,
    pub payload: Value,
}

impl CustomErr {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Failures of one key/value entry of a map. At least one side is set.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryErrors {
    pub key: Option<Invalid>,
    pub value: Option<Invalid>,
}

/// The structural shape of a failure.
///
/// The tree mirrors the input: compound variants nest further [`Invalid`]
/// values keyed by field, index, or map key. The enum is non-exhaustive, so
/// interpreters must carry a fallback arm.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrKind {
    /// The input was not of, or coercible to, the expected type.
    TypeMismatch { expected: Cow<'static, str> },
    /// Every predicate that returned false, in declaration order.
    PredicateFailures(Vec<PredicateInfo>),
    /// Failing fields of a record, in declaration order, followed by any
    /// rejected unknown keys.
    FieldErrors(IndexMap<String, Invalid>),
    /// Failing positions of a sequence, in ascending order.
    ItemErrors(IndexMap<usize, Invalid>),
    /// Failing entries of a map, in input order.
    MapEntryErrors(IndexMap<String, EntryErrors>),
    /// A required field was absent.
    MissingField,
    /// A key outside the declared set, rejected by configuration.
    UnknownFieldsPresent { expected: Vec<String> },
    /// Every union alternative failed, in declaration order.
    UnionExhausted(Vec<Invalid>),
    /// Caller-defined failure, usually from a whole-value check.
    Custom(CustomErr),
}

/// A failed validation.
///
/// `value` is the input the failing stage rejected: the raw input for type
/// mismatches, the processed value for predicate failures, the enclosing
/// object for missing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Invalid {
    pub err: ErrKind,
    pub value: Value,
    pub source: Arc<ValidatorInfo>,
}

impl Invalid {
    pub fn new(err: ErrKind, value: Value, source: &Arc<ValidatorInfo>) -> Self {
        Self {
            err,
            value,
            source: Arc::clone(source),
        }
    }

    pub(crate) fn type_mismatch(
        expected: impl Into<Cow<'static, str>>,
        value: &Value,
        source: &Arc<ValidatorInfo>,
    ) -> Self {
        Self::new(
            ErrKind::TypeMismatch {
                expected: expected.into(),
            },
            value.clone(),
            source,
        )
    }

    /// Returns true if this failure has no nested failures.
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self.err,
            ErrKind::FieldErrors(_)
                | ErrKind::ItemErrors(_)
                | ErrKind::MapEntryErrors(_)
                | ErrKind::UnionExhausted(_)
        )
    }

    /// Collects every leaf failure with its location.
    ///
    /// Map entries contribute a `MapKey` segment when the key itself failed
    /// and a `Key` segment for the value. Union branches contribute a
    /// `Variant` segment carrying the alternative's position.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform::{Field, RecordValidator, Shape, Validator};
    /// use serde_json::json;
    ///
    /// let person = RecordValidator::new(
    ///     (Field::required("name", Shape::string()), Field::required("tags", Shape::list(Shape::string()))),
    ///     |(name, tags)| (name, tags),
    /// )
    /// .unwrap();
    ///
    /// let err = person.validate(&json!({"name": 1, "tags": ["a", 2]})).into_result().unwrap_err();
    /// let paths: Vec<String> = err.leaves().iter().map(|(p, _)| p.to_string()).collect();
    /// assert_eq!(paths, vec!["name", "tags[1]"]);
    /// ```
    pub fn leaves(&self) -> Vec<(ErrorPath, &Invalid)> {
        let mut out = Vec::new();
        collect_leaves(self, ErrorPath::root(), &mut out);
        out
    }
}

fn collect_leaves<'a>(invalid: &'a Invalid, at: ErrorPath, out: &mut Vec<(ErrorPath, &'a Invalid)>) {
    match &invalid.err {
        ErrKind::FieldErrors(fields) => {
            for (key, nested) in fields {
                collect_leaves(nested, at.push_field(key), out);
            }
        }
        ErrKind::ItemErrors(items) => {
            for (index, nested) in items {
                collect_leaves(nested, at.push_index(*index), out);
            }
        }
        ErrKind::MapEntryErrors(entries) => {
            for (key, entry) in entries {
                if let Some(nested) = &entry.key {
                    collect_leaves(nested, at.push_map_key(key), out);
                }
                if let Some(nested) = &entry.value {
                    collect_leaves(nested, at.push_key(key), out);
                }
            }
        }
        ErrKind::UnionExhausted(branches) => {
            for (index, nested) in branches.iter().enumerate() {
                collect_leaves(nested, at.push_variant(index), out);
            }
        }
        _ => out.push((at, invalid)),
    }
}

// Invalid values are handed across threads by parallel list validation
// and the cache.
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Invalid>();
    assert_sync::<Invalid>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ValidatorKind;
    use serde_json::json;

    fn source() -> Arc<ValidatorInfo> {
        Arc::new(ValidatorInfo::new("test", ValidatorKind::Scalar))
    }

    #[test]
    fn test_type_mismatch_keeps_raw_value() {
        let err = Invalid::type_mismatch("integer", &json!("x"), &source());
        assert_eq!(
            err.err,
            ErrKind::TypeMismatch {
                expected: "integer".into()
            }
        );
        assert_eq!(err.value, json!("x"));
        assert!(err.is_leaf());
    }

    #[test]
    fn test_leaves_walks_nested_structures() {
        let src = source();
        let leaf = |v: Value| Invalid::type_mismatch("integer", &v, &src);

        let mut items = IndexMap::new();
        items.insert(2, leaf(json!("b")));
        let list = Invalid::new(ErrKind::ItemErrors(items), json!([1, 2, "b"]), &src);

        let mut entries = IndexMap::new();
        entries.insert(
            "k".to_string(),
            EntryErrors {
                key: Some(leaf(json!("k"))),
                value: Some(leaf(json!(null))),
            },
        );
        let map = Invalid::new(ErrKind::MapEntryErrors(entries), json!({"k": null}), &src);

        let union = Invalid::new(
            ErrKind::UnionExhausted(vec![leaf(json!(true)), leaf(json!(true))]),
            json!(true),
            &src,
        );

        let mut fields = IndexMap::new();
        fields.insert("xs".to_string(), list);
        fields.insert("m".to_string(), map);
        fields.insert("u".to_string(), union);
        let root = Invalid::new(ErrKind::FieldErrors(fields), json!({}), &src);

        let paths: Vec<String> = root.leaves().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["xs[2]", "m{k}", "m[\"k\"]", "u<0>", "u<1>"]);
        assert!(!root.is_leaf());
    }

    #[test]
    fn test_leaf_of_leaf_is_itself() {
        let err = Invalid::new(ErrKind::MissingField, json!({}), &source());
        let leaves = err.leaves();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].0.is_root());
        assert_eq!(leaves[0].1, &err);
    }

    #[test]
    fn test_custom_err_payload() {
        let custom = CustomErr::new("total_mismatch").with_payload(json!({"expected": 50}));
        assert_eq!(custom.code, "total_mismatch");
        assert_eq!(custom.payload["expected"], json!(50));
    }
}
