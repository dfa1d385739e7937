//! Named validator storage and by-name references.
//!
//! A [`ValidatorRegistry`] maps names to typed validators. References
//! obtained through [`ValidatorRegistry::reference`] resolve at validation
//! time, so validators can refer to names registered later, to each other,
//! or to themselves.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::UsageError;
use crate::validation::ValidationResult;
use crate::validators::{Lazy, Validator};

/// Each entry holds an `Arc<dyn Validator<T>>` behind `Any`, so lookups can
/// check the output type.
type Entries = RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>;

/// A thread-safe store of named validators.
///
/// Cloning shares the underlying store. References hold the store weakly,
/// so a validator registered in the registry may reference the registry
/// without keeping it alive.
///
/// # Example
///
/// ```rust
/// use conform::{Field, RecordValidator, Shape, ValidatorExt, ValidatorRegistry};
/// use serde_json::json;
///
/// let registry = ValidatorRegistry::new();
///
/// registry
///     .register(
///         "User",
///         RecordValidator::new(
///             (
///                 Field::required("id", registry.reference::<i64>("UserId")),
///                 Field::required("email", Shape::string().email()),
///             ),
///             |(id, email)| (id, email),
///         )
///         .unwrap(),
///     )
///     .unwrap();
/// assert_eq!(registry.unresolved(), vec!["UserId"]);
///
/// registry.register("UserId", Shape::int().min(1)).unwrap();
/// assert!(registry.unresolved().is_empty());
///
/// let result = registry
///     .validate::<(i64, String)>("User", &json!({"id": 7, "email": "a@b.io"}))
///     .unwrap();
/// assert!(result.is_success());
/// ```
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    entries: Arc<Entries>,
    referenced: Arc<RwLock<BTreeSet<String>>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validator under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register<T, V>(&self, name: impl Into<String>, validator: V) -> Result<(), RegistryError>
    where
        T: Send + Sync + 'static,
        V: Validator<T> + 'static,
    {
        let name = name.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        tracing::debug!(name = %name, "registering validator");
        let shared: Arc<dyn Validator<T>> = Arc::new(validator);
        entries.insert(name, Arc::new(shared));
        Ok(())
    }

    /// Looks up a validator by name and output type.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<dyn Validator<T>>, RegistryError> {
        lookup(&self.entries, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Validates `value` against the validator registered as `name`.
    ///
    /// # Errors
    ///
    /// Lookup failures and usage errors raised during validation, such as
    /// a reference to an unregistered name, are returned as
    /// [`RegistryError`]s. Invalid data is a `Validation::Failure` inside `Ok`.
    pub fn validate<T: Send + Sync + 'static>(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<ValidationResult<T>, RegistryError> {
        let validator = self.get::<T>(name)?;
        tracing::trace!(name = %name, "validating through registry");
        Ok(validator.try_validate(value)?)
    }

    pub async fn validate_async<T: Send + Sync + 'static>(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<ValidationResult<T>, RegistryError> {
        let validator = self.get::<T>(name)?;
        tracing::trace!(name = %name, "validating through registry");
        Ok(validator.try_validate_async(value).await?)
    }

    /// A validator that resolves `name` on every call.
    ///
    /// Resolution fails with [`UsageError::UnresolvedReference`] while the
    /// name is unregistered, [`UsageError::ReferenceTypeMismatch`] if it is
    /// registered with another output type, and
    /// [`UsageError::RegistryDropped`] once every handle to the registry is
    /// gone.
    pub fn reference<T: Send + Sync + 'static>(&self, name: impl Into<String>) -> Lazy<T> {
        let name = name.into();
        self.referenced.write().insert(name.clone());
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        Lazy::from_resolver(name.clone(), move || {
            let entries = entries.upgrade().ok_or_else(|| UsageError::RegistryDropped { name: name.clone() })?;
            lookup(&entries, &name).map_err(|err| match err {
                RegistryError::TypeMismatch(name) => UsageError::ReferenceTypeMismatch { name },
                _ => UsageError::UnresolvedReference { name: name.clone() },
            })
        })
    }

    /// Names passed to [`reference`](Self::reference) that are not
    /// registered, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        let entries = self.entries.read();
        self.referenced
            .read()
            .iter()
            .filter(|name| !entries.contains_key(*name))
            .cloned()
            .collect()
    }
}

fn lookup<T: Send + Sync + 'static>(entries: &Entries, name: &str) -> Result<Arc<dyn Validator<T>>, RegistryError> {
    let entries = entries.read();
    let entry = entries
        .get(name)
        .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
    entry
        .downcast_ref::<Arc<dyn Validator<T>>>()
        .cloned()
        .ok_or_else(|| RegistryError::TypeMismatch(name.to_string()))
}

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("validator '{0}' already registered")]
    DuplicateName(String),

    #[error("validator '{0}' not found")]
    NotFound(String),

    /// The name is registered with a different output type.
    #[error("validator '{0}' produces a different output type")]
    TypeMismatch(String),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::Shape;
    use serde_json::json;

    #[test]
    fn test_duplicate_name() {
        let registry = ValidatorRegistry::new();
        registry.register("Email", Shape::string().email()).unwrap();
        assert_eq!(
            registry.register("Email", Shape::string()),
            Err(RegistryError::DuplicateName("Email".to_string()))
        );
    }

    #[test]
    fn test_typed_lookup() {
        let registry = ValidatorRegistry::new();
        registry.register("Age", Shape::int().min(0)).unwrap();
        assert!(registry.get::<i64>("Age").is_ok());
        assert_eq!(
            registry.get::<String>("Age").err(),
            Some(RegistryError::TypeMismatch("Age".to_string()))
        );
        assert_eq!(
            registry.get::<i64>("Height").err(),
            Some(RegistryError::NotFound("Height".to_string()))
        );
    }

    #[test]
    fn test_reference_resolves_late() {
        let registry = ValidatorRegistry::new();
        let id = registry.reference::<i64>("Id");
        assert_eq!(
            id.try_validate(&json!(1)).err(),
            Some(UsageError::UnresolvedReference { name: "Id".to_string() })
        );
        registry.register("Id", Shape::int().min(1)).unwrap();
        assert!(id.validate(&json!(1)).is_success());
        assert!(id.validate(&json!(0)).is_failure());
    }

    #[test]
    fn test_reference_type_mismatch() {
        let registry = ValidatorRegistry::new();
        registry.register("Id", Shape::string()).unwrap();
        let id = registry.reference::<i64>("Id");
        assert_eq!(
            id.try_validate(&json!(1)).err(),
            Some(UsageError::ReferenceTypeMismatch { name: "Id".to_string() })
        );
    }

    #[test]
    fn test_reference_outliving_registry() {
        let id = {
            let registry = ValidatorRegistry::new();
            registry.register("Id", Shape::int()).unwrap();
            registry.reference::<i64>("Id")
        };
        assert_eq!(
            id.try_validate(&json!(1)).err(),
            Some(UsageError::RegistryDropped { name: "Id".to_string() })
        );
    }

    #[test]
    fn test_validate_surfaces_usage_errors() {
        let registry = ValidatorRegistry::new();
        registry.register("Alias", registry.reference::<bool>("Target")).unwrap();
        assert_eq!(
            registry.validate::<bool>("Alias", &json!(true)).err(),
            Some(RegistryError::Usage(UsageError::UnresolvedReference {
                name: "Target".to_string()
            }))
        );
        assert_eq!(registry.unresolved(), vec!["Target"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = ValidatorRegistry::new();
        let other = registry.clone();
        other.register("Flag", Shape::boolean()).unwrap();
        assert_eq!(registry.names(), vec!["Flag"]);
        assert!(registry.contains("Flag"));
    }
}
