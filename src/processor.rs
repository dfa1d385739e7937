//! Type-preserving transforms applied between the type check and predicates.

use std::borrow::Cow;

/// A named `T -> T` transform.
///
/// Processors run left to right, each receiving the previous output, so
/// predicates always see the fully processed value.
pub trait Processor<T>: Send + Sync {
    fn apply(&self, value: T) -> T;

    fn name(&self) -> Cow<'static, str>;
}

/// Trims leading and trailing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip;

impl Processor<String> for Strip {
    fn apply(&self, value: String) -> String {
        value.trim().to_string()
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("strip")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpperCase;

impl Processor<String> for UpperCase {
    fn apply(&self, value: String) -> String {
        value.to_uppercase()
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("upper_case")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerCase;

impl Processor<String> for LowerCase {
    fn apply(&self, value: String) -> String {
        value.to_lowercase()
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("lower_case")
    }
}

/// A named processor backed by a closure.
pub struct FnProcessor<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FnProcessor<F> {
    pub fn new<T>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<T, F> Processor<T> for FnProcessor<F>
where
    F: Fn(T) -> T + Send + Sync,
{
    fn apply(&self, value: T) -> T {
        (self.f)(value)
    }

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_processors() {
        assert_eq!(Strip.apply("  hi \n".to_string()), "hi");
        assert_eq!(Strip.apply("hi".to_string()), "hi");
        assert_eq!(UpperCase.apply("abc".to_string()), "ABC");
        assert_eq!(LowerCase.apply("AbC".to_string()), "abc");
    }

    #[test]
    fn test_fn_processor() {
        let double = FnProcessor::new("double", |n: i64| n * 2);
        assert_eq!(double.apply(21), 42);
        assert_eq!(Processor::<i64>::name(&double), "double");
    }
}
