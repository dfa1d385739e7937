//! Objects with fields declared at runtime.
//!
//! [`DictValidatorAny`] is the unbounded counterpart of
//! [`RecordValidator`](crate::RecordValidator): any number of fields, each a
//! `Validator<Value>`, with the output kept as a JSON object instead of
//! being narrowed to a Rust type.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{ErrKind, Invalid};
use crate::info::{FieldInfo, Presence, ValidatorInfo, ValidatorKind};
use crate::pipeline::{run_whole, run_whole_async, WholeCheck};
use crate::validation::{Checked, ValidationResult};

use super::traits::{guard_sync, Validator};

#[derive(Clone)]
struct DictField {
    validator: Arc<dyn Validator<Value>>,
    presence: Presence,
    default: Option<Value>,
}

/// Validates a JSON object against fields supplied at runtime.
///
/// Declared fields are validated in declaration order and their validated
/// values replace the input values; undeclared keys pass through unchanged
/// unless [`reject_unknown`](DictValidatorAny::reject_unknown) is set.
/// Redeclaring a key replaces its earlier declaration in place.
///
/// # Example
///
/// ```rust
/// use conform::{DictValidatorAny, Shape, Validator, ValidatorExt};
/// use serde_json::json;
///
/// let config = DictValidatorAny::new()
///     .field("host", Shape::string().min_len(1).to_value())
///     .default_field("port", Shape::int().to_value(), json!(80))
///     .optional("tls", Shape::boolean().to_value());
///
/// let out = config.validate(&json!({"host": "example.com"})).into_result().unwrap();
/// assert_eq!(out["port"], json!(80));
/// assert!(out.get("tls").is_none());
/// ```
#[derive(Clone)]
pub struct DictValidatorAny {
    fields: IndexMap<String, DictField>,
    reject_unknown: bool,
    whole: Option<WholeCheck<Map<String, Value>>>,
    info: Arc<ValidatorInfo>,
}

impl Default for DictValidatorAny {
    fn default() -> Self {
        Self::new()
    }
}

impl DictValidatorAny {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            reject_unknown: false,
            whole: None,
            info: Arc::new(ValidatorInfo::new("dict", ValidatorKind::Dict)),
        }
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        Arc::make_mut(&mut self.info).name = name.into();
        self
    }

    fn declare(mut self, key: String, field: DictField) -> Self {
        self.fields.insert(key, field);
        let infos = self
            .fields
            .iter()
            .map(|(key, f)| FieldInfo {
                key: key.clone(),
                presence: f.presence,
            })
            .collect();
        Arc::make_mut(&mut self.info).fields = infos;
        self.refresh_async()
    }

    fn refresh_async(mut self) -> Self {
        let requires_async = self.fields.values().any(|f| f.validator.requires_async())
            || self.whole.as_ref().is_some_and(WholeCheck::is_async_only);
        Arc::make_mut(&mut self.info).requires_async = requires_async;
        self
    }

    /// Declares a required field.
    pub fn field(self, key: impl Into<String>, validator: impl Validator<Value> + 'static) -> Self {
        self.declare(
            key.into(),
            DictField {
                validator: Arc::new(validator),
                presence: Presence::Required,
                default: None,
            },
        )
    }

    /// Declares a field that may be absent; absent keys stay absent.
    pub fn optional(self, key: impl Into<String>, validator: impl Validator<Value> + 'static) -> Self {
        self.declare(
            key.into(),
            DictField {
                validator: Arc::new(validator),
                presence: Presence::Optional,
                default: None,
            },
        )
    }

    /// Declares a field filled with `default` when absent.
    pub fn default_field(
        self,
        key: impl Into<String>,
        validator: impl Validator<Value> + 'static,
        default: Value,
    ) -> Self {
        self.declare(
            key.into(),
            DictField {
                validator: Arc::new(validator),
                presence: Presence::Defaulted,
                default: Some(default),
            },
        )
    }

    pub fn reject_unknown(mut self) -> Self {
        self.reject_unknown = true;
        self
    }

    pub fn check_with(
        mut self,
        check: impl Fn(&Map<String, Value>) -> Option<ErrKind> + Send + Sync + 'static,
    ) -> Self {
        self.whole = Some(WholeCheck::Sync(Arc::new(check)));
        self.refresh_async()
    }

    pub fn check_with_async<F>(mut self, check: F) -> Self
    where
        F: for<'a> Fn(&'a Map<String, Value>) -> BoxFuture<'a, Option<ErrKind>> + Send + Sync + 'static,
    {
        self.whole = Some(WholeCheck::Async(Arc::new(check)));
        self.refresh_async()
    }

    fn record(
        &self,
        key: &str,
        field: &DictField,
        result: Option<ValidationResult<Value>>,
        whole: &Value,
        out: &mut Map<String, Value>,
        errors: &mut IndexMap<String, Invalid>,
    ) {
        match result {
            Some(Validation::Success(v)) => {
                out.insert(key.to_string(), v);
            }
            Some(Validation::Failure(e)) => {
                errors.insert(key.to_string(), e);
            }
            None => match (&field.presence, &field.default) {
                (Presence::Required, _) => {
                    errors.insert(
                        key.to_string(),
                        Invalid::new(ErrKind::MissingField, whole.clone(), &self.info),
                    );
                }
                (_, Some(default)) => {
                    out.insert(key.to_string(), default.clone());
                }
                (_, None) => {}
            },
        }
    }

    fn extras(&self, object: &Map<String, Value>, out: &mut Map<String, Value>, errors: &mut IndexMap<String, Invalid>) {
        let expected: Vec<String> = self.fields.keys().cloned().collect();
        for (key, value) in object.iter().filter(|(k, _)| !self.fields.contains_key(*k)) {
            if self.reject_unknown {
                let err = ErrKind::UnknownFieldsPresent {
                    expected: expected.clone(),
                };
                errors.insert(key.clone(), Invalid::new(err, value.clone(), &self.info));
            } else {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    fn settle(&self, out: Map<String, Value>, errors: IndexMap<String, Invalid>, whole: &Value) -> Result<Map<String, Value>, Invalid> {
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(Invalid::new(ErrKind::FieldErrors(errors), whole.clone(), &self.info))
        }
    }

    fn conclude(&self, out: Map<String, Value>, failure: Option<ErrKind>, whole: &Value) -> ValidationResult<Map<String, Value>> {
        match failure {
            None => Validation::Success(out),
            Some(err) => Validation::Failure(Invalid::new(err, whole.clone(), &self.info)),
        }
    }
}

#[async_trait]
impl Validator<Map<String, Value>> for DictValidatorAny {
    fn try_validate(&self, value: &Value) -> Checked<Map<String, Value>> {
        guard_sync(&self.info)?;
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let mut out = Map::new();
        let mut errors = IndexMap::new();
        for (key, field) in &self.fields {
            let result = match object.get(key) {
                Some(v) => Some(field.validator.try_validate(v)?),
                None => None,
            };
            self.record(key, field, result, value, &mut out, &mut errors);
        }
        self.extras(object, &mut out, &mut errors);
        let out = match self.settle(out, errors, value) {
            Ok(out) => out,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failure = run_whole(&self.whole, &out);
        Ok(self.conclude(out, failure, value))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<Map<String, Value>> {
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let mut out = Map::new();
        let mut errors = IndexMap::new();
        for (key, field) in &self.fields {
            let result = match object.get(key) {
                Some(v) => Some(field.validator.try_validate_async(v).await?),
                None => None,
            };
            self.record(key, field, result, value, &mut out, &mut errors);
        }
        self.extras(object, &mut out, &mut errors);
        let out = match self.settle(out, errors, value) {
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
