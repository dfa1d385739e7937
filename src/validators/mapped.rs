//! Output conversion after successful validation, built by
//! [`ValidatorExt::map`](crate::ValidatorExt::map).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::info::ValidatorInfo;
use crate::validation::{map_valid, Checked};

use super::traits::Validator;

/// Applies a function to a child's valid output.
///
/// Transparent for introspection: `info` and every failure belong to the
/// child.
pub struct Mapped<T, U> {
    inner: Arc<dyn Validator<T>>,
    f: Arc<dyn Fn(T) -> U + Send + Sync>,
}

impl<T, U> Clone for Mapped<T, U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            f: Arc::clone(&self.f),
        }
    }
}

impl<T: Send + Sync + 'static, U> Mapped<T, U> {
    pub fn new(inner: impl Validator<T> + 'static, f: impl Fn(T) -> U + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            f: Arc::new(f),
        }
    }
}

#[async_trait]
impl<T, U> Validator<U> for Mapped<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    fn try_validate(&self, value: &Value) -> Checked<U> {
        Ok(map_valid(self.inner.try_validate(value)?, |v| (self.f)(v)))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<U> {
        let result = self.inner.try_validate_async(value).await?;
        Ok(map_valid(result, |v| (self.f)(v)))
    }

    fn info(&self) -> Arc<ValidatorInfo> {
        self.inner.info()
    }
}

#[cfg(test)]
mod tests {
    use crate::validators::{Shape, Validator, ValidatorExt};
    use serde_json::json;

    #[test]
    fn test_map_transforms_success_only() {
        let len = Shape::string().map(|s: String| s.len());
        assert_eq!(len.validate(&json!("four")).into_result().ok(), Some(4));

        let err = len.validate(&json!(4)).into_result().unwrap_err();
        assert_eq!(err.source.name, "string");
    }

    #[tokio::test]
    async fn test_map_async_path() {
        let doubled = Shape::int().map(|n: i64| n * 2);
        let result = doubled.validate_async(&json!(21)).await;
        assert_eq!(result.into_result().ok(), Some(42));
    }
}
