//! Homogeneous key/value validation over JSON objects.

use std::borrow::Cow;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{EntryErrors, ErrKind, Invalid};
use crate::info::{PredicateInfo, ValidatorInfo, ValidatorKind};
use crate::pipeline::Checks;
use crate::predicate::{FnPredicate, MaxKeys, MinKeys, Predicate};
use crate::validation::{Checked, ValidationResult};

use super::traits::{guard_sync, Validator};

/// Validates every entry of a JSON object with one key validator and one
/// value validator.
///
/// Keys reach the key validator as JSON strings. An entry fails on its
/// key, its value, or both; every failing entry is reported under its
/// original key. If two keys validate to the same `K`, the later entry
/// wins.
///
/// # Example
///
/// ```rust
/// use conform::{Shape, Validator};
/// use serde_json::json;
///
/// let scores = Shape::map(Shape::string().lower_case(), Shape::int().min(0));
/// let valid = scores.validate(&json!({"Ada": 3, "bob": 5})).into_result().unwrap();
/// assert_eq!(valid["ada"], 3);
/// ```
pub struct MapValidator<K, V> {
    key: Arc<dyn Validator<K>>,
    value: Arc<dyn Validator<V>>,
    checks: Checks<IndexMap<K, V>>,
    info: Arc<ValidatorInfo>,
}

impl<K, V> Clone for MapValidator<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            value: Arc::clone(&self.value),
            checks: self.checks.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl<K, V> MapValidator<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(key: impl Validator<K> + 'static, value: impl Validator<V> + 'static) -> Self {
        let requires_async = key.requires_async() || value.requires_async();
        Self {
            key: Arc::new(key),
            value: Arc::new(value),
            checks: Checks::new(),
            info: Arc::new(ValidatorInfo::new("map", ValidatorKind::Map).requiring_async(requires_async)),
        }
    }

    pub fn predicate(mut self, predicate: impl Predicate<IndexMap<K, V>> + 'static) -> Self {
        self.checks.push(predicate);
        let infos = self.checks.infos();
        Arc::make_mut(&mut self.info).predicates = infos;
        self
    }

    pub fn check_fn(
        self,
        name: impl Into<Cow<'static, str>>,
        f: impl Fn(&IndexMap<K, V>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate(FnPredicate::new(name, f))
    }

    pub fn min_keys(self, count: usize) -> Self {
        self.predicate(MinKeys(count))
    }

    pub fn max_keys(self, count: usize) -> Self {
        self.predicate(MaxKeys(count))
    }

    fn entry(key_result: ValidationResult<K>, value_result: ValidationResult<V>) -> Result<(K, V), EntryErrors> {
        match (key_result, value_result) {
            (Validation::Success(k), Validation::Success(v)) => Ok((k, v)),
            (k, v) => Err(EntryErrors {
                key: k.into_result().err(),
                value: v.into_result().err(),
            }),
        }
    }

    fn assemble(&self, object: &Map<String, Value>, entries: Vec<Result<(K, V), EntryErrors>>) -> Result<IndexMap<K, V>, Invalid> {
        let mut valid = IndexMap::with_capacity(entries.len());
        let mut errors = IndexMap::new();
        for (key, entry) in object.keys().zip(entries) {
            match entry {
                Ok((k, v)) => {
                    valid.insert(k, v);
                }
                Err(e) => {
                    errors.insert(key.clone(), e);
                }
            }
        }
        if errors.is_empty() {
            Ok(valid)
        } else {
            Err(Invalid::new(ErrKind::MapEntryErrors(errors), Value::Object(object.clone()), &self.info))
        }
    }

    fn conclude(&self, object: &Map<String, Value>, valid: IndexMap<K, V>, failed: Vec<PredicateInfo>) -> ValidationResult<IndexMap<K, V>> {
        if failed.is_empty() {
            Validation::Success(valid)
        } else {
            Validation::Failure(Invalid::new(
                ErrKind::PredicateFailures(failed),
                Value::Object(object.clone()),
                &self.info,
            ))
        }
    }
}

#[async_trait]
impl<K, V> Validator<IndexMap<K, V>> for MapValidator<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn try_validate(&self, value: &Value) -> Checked<IndexMap<K, V>> {
        guard_sync(&self.info)?;
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let mut entries = Vec::with_capacity(object.len());
        for (key, item) in object {
            let key_result = self.key.try_validate(&Value::String(key.clone()))?;
            let value_result = self.value.try_validate(item)?;
            entries.push(Self::entry(key_result, value_result));
        }
        let valid = match self.assemble(object, entries) {
            Ok(valid) => valid,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures(&valid);
        Ok(self.conclude(object, valid, failed))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<IndexMap<K, V>> {
        let Some(object) = value.as_object() else {
            return Ok(Validation::Failure(Invalid::type_mismatch("object", value, &self.info)));
        };
        let mut entries = Vec::with_capacity(object.len());
        for (key, item) in object {
            let key_result = self.key.try_validate_async(&Value::String(key.clone())).await?;
            let value_result = self.value.try_validate_async(item).await?;
            entries.push(Self::entry(key_result, value_result));
        }
        let valid = match self.assemble(object, entries) {
            Ok(valid) => valid,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failed = self.checks.failures_async(&valid).await;
        Ok(self.conclude(object, valid, failed))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}
