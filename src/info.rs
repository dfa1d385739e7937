//! Introspection metadata attached to validators and predicates.
//!
//! Every validator carries an immutable [`ValidatorInfo`] snapshot. Failures
//! point back at it through [`Invalid::source`](crate::Invalid), so external
//! interpreters can ask "which validator rejected this, and with which
//! parameters" without calling back into the validator itself.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::Value;

/// Whether a check can run on the synchronous path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckMode {
    Sync,
    Async,
}

/// Name and parameters of a predicate.
///
/// This is the record reported inside
/// [`ErrKind::PredicateFailures`](crate::ErrKind::PredicateFailures).
///
/// # Example
///
/// ```rust
/// use conform::PredicateInfo;
/// use serde_json::json;
///
/// let info = PredicateInfo::new("min").with_param("bound", 5);
/// assert_eq!(info.params["bound"], json!(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateInfo {
    pub name: Cow<'static, str>,
    pub params: IndexMap<String, Value>,
    pub mode: CheckMode,
}

impl PredicateInfo {
    /// Creates metadata for a synchronous predicate with no parameters.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
            mode: CheckMode::Sync,
        }
    }

    /// Records a parameter and returns self for chaining.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Marks the predicate as async-only.
    pub fn asynchronous(mut self) -> Self {
        self.mode = CheckMode::Async;
        self
    }
}

/// How a declared record field behaves when its key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Absence is reported as `MissingField`.
    Required,
    /// Absence produces `None`.
    Optional,
    /// Absence produces a configured default value.
    Defaulted,
}

/// A declared field of a record-like validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub key: String,
    pub presence: Presence,
}

/// The family a validator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    Scalar,
    Equals,
    Null,
    AlwaysValid,
    List,
    Map,
    Record,
    Dict,
    Tuple,
    Union,
    Optional,
    Lazy { recurrent: bool },
    Cached,
}

/// Immutable description of a configured validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorInfo {
    pub name: Cow<'static, str>,
    pub kind: ValidatorKind,
    /// Predicates in evaluation order: synchronous ones first, then async.
    pub predicates: Vec<PredicateInfo>,
    pub processors: Vec<Cow<'static, str>>,
    /// Source types the configured coercer claims to handle, if any.
    pub coerces_from: Option<Vec<Cow<'static, str>>>,
    pub fields: Vec<FieldInfo>,
    /// True when the validator, or a non-lazy child, holds an async-only check.
    pub requires_async: bool,
}

impl ValidatorInfo {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ValidatorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            predicates: Vec::new(),
            processors: Vec::new(),
            coerces_from: None,
            fields: Vec::new(),
            requires_async: false,
        }
    }

    pub(crate) fn requiring_async(mut self, requires_async: bool) -> Self {
        self.requires_async = requires_async;
        self
    }

    pub(crate) fn with_fields(mut self, fields: Vec<FieldInfo>) -> Self {
        self.fields = fields;
        self
    }
}
