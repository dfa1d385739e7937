//! Result caching for validators.
//!
//! [`CacheValidator`] memoizes outcomes keyed by the input value. Stores
//! implement the two-operation [`CacheStore`] contract, so any backend can
//! stand behind it; [`MemoryCache`] is the bundled in-process store.
//!
//! Concurrent misses on the same input both run the inner validator and
//! the last writer wins. Since validation is deterministic both writers
//! store equal results, so a cached result never differs from a fresh one.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::info::{ValidatorInfo, ValidatorKind};
use crate::validation::{duplicate, Checked, ValidationResult};

use super::traits::{guard_sync, Validator};

/// Storage behind a [`CacheValidator`].
///
/// The async methods default to the sync ones; remote stores override them.
#[async_trait]
pub trait CacheStore<T: Send + Sync + 'static>: Send + Sync {
    fn get(&self, key: &Value) -> Option<ValidationResult<T>>;

    fn set(&self, key: &Value, result: ValidationResult<T>);

    async fn get_async(&self, key: &Value) -> Option<ValidationResult<T>> {
        self.get(key)
    }

    async fn set_async(&self, key: &Value, result: ValidationResult<T>) {
        self.set(key, result)
    }
}

/// Configuration for [`MemoryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached inputs. The oldest entry is evicted first.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl CacheConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}

/// A bounded in-memory store keyed by the serialized JSON text of the input.
///
/// Object keys serialize in input order, so the same object with its keys
/// reordered is a separate entry. Map outputs keep that order too.
///
/// # Example
///
/// ```rust
/// use conform::{CacheConfig, Shape, Validator, ValidatorExt};
/// use serde_json::json;
///
/// let slug = Shape::string().lower_case().cached(CacheConfig::with_capacity(128));
///
/// let first = slug.validate(&json!("Hello")).into_result();
/// let again = slug.validate(&json!("Hello")).into_result();
/// assert_eq!(first, again);
/// ```
pub struct MemoryCache<T> {
    entries: RwLock<IndexMap<String, ValidationResult<T>>>,
    config: CacheConfig,
}

impl<T> MemoryCache<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn key(value: &Value) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<T: Clone + Send + Sync + 'static> CacheStore<T> for MemoryCache<T> {
    fn get(&self, key: &Value) -> Option<ValidationResult<T>> {
        self.entries.read().get(&Self::key(key)).map(duplicate)
    }

    fn set(&self, key: &Value, result: ValidationResult<T>) {
        if self.config.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write();
        let key = Self::key(key);
        if !entries.contains_key(&key) && entries.len() >= self.config.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(key, result);
    }
}

/// Decorates a validator with a [`CacheStore`].
///
/// Usage errors are never cached: they are raised again on every call.
pub struct CacheValidator<T> {
    inner: Arc<dyn Validator<T>>,
    store: Arc<dyn CacheStore<T>>,
    info: Arc<ValidatorInfo>,
}

impl<T> Clone for CacheValidator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            store: Arc::clone(&self.store),
            info: Arc::clone(&self.info),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> CacheValidator<T> {
    pub fn new(inner: impl Validator<T> + 'static, store: impl CacheStore<T> + 'static) -> Self {
        let info = ValidatorInfo::new("cached", ValidatorKind::Cached).requiring_async(inner.requires_async());
        Self {
            inner: Arc::new(inner),
            store: Arc::new(store),
            info: Arc::new(info),
        }
    }

    /// Shares one store between several validators.
    pub fn with_store(inner: impl Validator<T> + 'static, store: Arc<dyn CacheStore<T>>) -> Self {
        let info = ValidatorInfo::new("cached", ValidatorKind::Cached).requiring_async(inner.requires_async());
        Self {
            inner: Arc::new(inner),
            store,
            info: Arc::new(info),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Validator<T>> {
        &self.inner
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Validator<T> for CacheValidator<T> {
    fn try_validate(&self, value: &Value) -> Checked<T> {
        guard_sync(&self.info)?;
        if let Some(hit) = self.store.get(value) {
            tracing::trace!(validator = %self.inner.info().name, "cache hit");
            return Ok(hit);
        }
        tracing::trace!(validator = %self.inner.info().name, "cache miss");
        let result = self.inner.try_validate(value)?;
        self.store.set(value, duplicate(&result));
        Ok(result)
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<T> {
        if let Some(hit) = self.store.get_async(value).await {
            tracing::trace!(validator = %self.inner.info().name, "cache hit");
            return Ok(hit);
        }
        tracing::trace!(validator = %self.inner.info().name, "cache miss");
        let result = self.inner.try_validate_async(value).await?;
        self.store.set_async(value, duplicate(&result)).await;
        Ok(result)
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        Arc::clone(&self.info)
    }
}
