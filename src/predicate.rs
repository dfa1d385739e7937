//! Value-level checks run after the type check succeeds.
//!
//! A [`Predicate`] is a pure boolean test over an already-typed value. It
//! never alters the value, which is what lets a validator run all of its
//! predicates against the same value and report every failure at once.
//! [`PredicateAsync`] is the suspendable counterpart, kept in a separate
//! list so a validator knows at construction whether it can run
//! synchronously.

use std::borrow::Cow;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::info::PredicateInfo;

/// A synchronous, side-effect-free check over a value.
///
/// Returning `false` is the only failure signal.
pub trait Predicate<T: ?Sized>: Send + Sync {
    fn check(&self, value: &T) -> bool;

    fn info(&self) -> PredicateInfo;
}

/// A check that may suspend, e.g. to query a database.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use conform::{PredicateAsync, PredicateInfo};
///
/// struct NotTaken;
///
/// #[async_trait]
/// impl PredicateAsync<String> for NotTaken {
///     async fn check_async(&self, value: &String) -> bool {
///         value != "admin"
///     }
///
///     fn info(&self) -> PredicateInfo {
///         PredicateInfo::new("not_taken").asynchronous()
///     }
/// }
/// ```
#[async_trait]
pub trait PredicateAsync<T: ?Sized + Sync>: Send + Sync {
    async fn check_async(&self, value: &T) -> bool;

    fn info(&self) -> PredicateInfo;
}

/// Lower bound, inclusive unless built with [`Min::exclusive`].
#[derive(Debug, Clone, PartialEq)]
pub struct Min<N> {
    bound: N,
    exclusive: bool,
}

impl<N> Min<N> {
    pub fn new(bound: N) -> Self {
        Self {
            bound,
            exclusive: false,
        }
    }

    pub fn exclusive(bound: N) -> Self {
        Self {
            bound,
            exclusive: true,
        }
    }
}

impl<N> Predicate<N> for Min<N>
where
    N: PartialOrd + Clone + Into<Value> + Send + Sync,
{
    fn check(&self, value: &N) -> bool {
        if self.exclusive {
            *value > self.bound
        } else {
            *value >= self.bound
        }
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("min")
            .with_param("bound", self.bound.clone())
            .with_param("exclusive", self.exclusive)
    }
}

/// Upper bound, inclusive unless built with [`Max::exclusive`].
#[derive(Debug, Clone, PartialEq)]
pub struct Max<N> {
    bound: N,
    exclusive: bool,
}

impl<N> Max<N> {
    pub fn new(bound: N) -> Self {
        Self {
            bound,
            exclusive: false,
        }
    }

    pub fn exclusive(bound: N) -> Self {
        Self {
            bound,
            exclusive: true,
        }
    }
}

impl<N> Predicate<N> for Max<N>
where
    N: PartialOrd + Clone + Into<Value> + Send + Sync,
{
    fn check(&self, value: &N) -> bool {
        if self.exclusive {
            *value < self.bound
        } else {
            *value <= self.bound
        }
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("max")
            .with_param("bound", self.bound.clone())
            .with_param("exclusive", self.exclusive)
    }
}

/// The value is an exact multiple of `factor`. A zero factor never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleOf<N>(pub N);

impl Predicate<i64> for MultipleOf<i64> {
    fn check(&self, value: &i64) -> bool {
        self.0 != 0 && value.checked_rem(self.0) == Some(0)
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("multiple_of").with_param("factor", self.0)
    }
}

impl Predicate<f64> for MultipleOf<f64> {
    fn check(&self, value: &f64) -> bool {
        self.0 != 0.0 && value % self.0 == 0.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("multiple_of").with_param("factor", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualTo<T>(pub T);

impl<T> Predicate<T> for EqualTo<T>
where
    T: PartialEq + Clone + Into<Value> + Send + Sync,
{
    fn check(&self, value: &T) -> bool {
        *value == self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("equal_to").with_param("expected", self.0.clone())
    }
}

/// The value is one of a fixed set of choices.
#[derive(Debug, Clone, PartialEq)]
pub struct Choices<T> {
    choices: Vec<T>,
}

impl<T> Choices<T> {
    pub fn new(choices: impl IntoIterator<Item = T>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }
}

impl<T> Predicate<T> for Choices<T>
where
    T: PartialEq + Clone + Into<Value> + Send + Sync,
{
    fn check(&self, value: &T) -> bool {
        self.choices.contains(value)
    }

    fn info(&self) -> PredicateInfo {
        let choices: Vec<Value> = self.choices.iter().cloned().map(Into::into).collect();
        PredicateInfo::new("choices").with_param("choices", choices)
    }
}

/// Lengths count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinLength(pub usize);

impl Predicate<String> for MinLength {
    fn check(&self, value: &String) -> bool {
        value.chars().count() >= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("min_length").with_param("length", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLength(pub usize);

impl Predicate<String> for MaxLength {
    fn check(&self, value: &String) -> bool {
        value.chars().count() <= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("max_length").with_param("length", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactLength(pub usize);

impl Predicate<String> for ExactLength {
    fn check(&self, value: &String) -> bool {
        value.chars().count() == self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("exact_length").with_param("length", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartsWith(pub String);

impl Predicate<String> for StartsWith {
    fn check(&self, value: &String) -> bool {
        value.starts_with(&self.0)
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("starts_with").with_param("prefix", self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndsWith(pub String);

impl Predicate<String> for EndsWith {
    fn check(&self, value: &String) -> bool {
        value.ends_with(&self.0)
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("ends_with").with_param("suffix", self.0.clone())
    }
}

/// Rejects strings that are empty after trimming whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotBlank;

impl Predicate<String> for NotBlank {
    fn check(&self, value: &String) -> bool {
        !value.trim().is_empty()
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("not_blank")
    }
}

/// Matches anywhere in the string unless the pattern is anchored.
#[derive(Debug, Clone)]
pub struct RegexPredicate {
    regex: Regex,
}

impl RegexPredicate {
    /// # Errors
    ///
    /// Returns the regex compilation error for an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl From<Regex> for RegexPredicate {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

impl Predicate<String> for RegexPredicate {
    fn check(&self, value: &String) -> bool {
        self.regex.is_match(value)
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("pattern").with_param("pattern", self.regex.as_str())
    }
}

/// A pragmatic address check: `local@domain.tld` with no whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailPredicate;

impl Predicate<String> for EmailPredicate {
    fn check(&self, value: &String) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        let local_ok = !local.is_empty()
            && local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "_.+-".contains(c));
        let labels: Vec<&str> = domain.split('.').collect();
        let domain_ok = labels.len() >= 2
            && labels.iter().all(|label| {
                !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        local_ok && domain_ok
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("email")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinItems(pub usize);

impl<T> Predicate<Vec<T>> for MinItems {
    fn check(&self, value: &Vec<T>) -> bool {
        value.len() >= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("min_items").with_param("count", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxItems(pub usize);

impl<T> Predicate<Vec<T>> for MaxItems {
    fn check(&self, value: &Vec<T>) -> bool {
        value.len() <= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("max_items").with_param("count", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactItemCount(pub usize);

impl<T> Predicate<Vec<T>> for ExactItemCount {
    fn check(&self, value: &Vec<T>) -> bool {
        value.len() == self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("exact_item_count").with_param("count", self.0)
    }
}

/// No two items compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueItems;

impl<T: PartialEq> Predicate<Vec<T>> for UniqueItems {
    fn check(&self, value: &Vec<T>) -> bool {
        value
            .iter()
            .enumerate()
            .all(|(i, item)| !value[i + 1..].contains(item))
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("unique_items")
    }
}

/// Entry-count bounds for the map shapes this crate produces.
pub trait KeyCount {
    fn key_count(&self) -> usize;
}

impl<K, V> KeyCount for IndexMap<K, V> {
    fn key_count(&self) -> usize {
        self.len()
    }
}

impl KeyCount for Map<String, Value> {
    fn key_count(&self) -> usize {
        self.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinKeys(pub usize);

impl<M: KeyCount> Predicate<M> for MinKeys {
    fn check(&self, value: &M) -> bool {
        value.key_count() >= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("min_keys").with_param("count", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxKeys(pub usize);

impl<M: KeyCount> Predicate<M> for MaxKeys {
    fn check(&self, value: &M) -> bool {
        value.key_count() <= self.0
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new("max_keys").with_param("count", self.0)
    }
}

/// A named predicate backed by a closure.
///
/// # Example
///
/// ```rust
/// use conform::{FnPredicate, Predicate};
///
/// let even = FnPredicate::new("even", |n: &i64| n % 2 == 0);
/// assert!(even.check(&4));
/// assert_eq!(even.info().name, "even");
/// ```
pub struct FnPredicate<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FnPredicate<F> {
    pub fn new<T: ?Sized>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<T: ?Sized, F> Predicate<T> for FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn check(&self, value: &T) -> bool {
        (self.f)(value)
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new(self.name.clone())
    }
}

/// A named async predicate backed by a closure returning a boxed future.
///
/// # Example
///
/// ```rust
/// use conform::AsyncFnPredicate;
/// use futures::FutureExt;
///
/// let known = AsyncFnPredicate::new("known_user", |name: &String| {
///     let found = name == "alice";
///     async move { found }.boxed()
/// });
/// ```
pub struct AsyncFnPredicate<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> AsyncFnPredicate<F> {
    pub fn new<T: ?Sized>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> BoxFuture<'a, bool> + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<T, F> PredicateAsync<T> for AsyncFnPredicate<F>
where
    T: ?Sized + Sync,
    F: for<'a> Fn(&'a T) -> BoxFuture<'a, bool> + Send + Sync,
{
    async fn check_async(&self, value: &T) -> bool {
        (self.f)(value).await
    }

    fn info(&self) -> PredicateInfo {
        PredicateInfo::new(self.name.clone()).asynchronous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_min_max_bounds() {
        assert!(Min::new(5).check(&5));
        assert!(!Min::exclusive(5).check(&5));
        assert!(Max::new(2.5).check(&2.5));
        assert!(!Max::exclusive(2.5).check(&2.5));
        assert_eq!(Min::new(5).info().params["bound"], json!(5));
        assert_eq!(Max::exclusive(1).info().params["exclusive"], json!(true));
    }

    #[test]
    fn test_predicates_are_referentially_transparent() {
        let min = Min::new(5_i64);
        let first: Vec<bool> = (0..3).map(|_| min.check(&4)).collect();
        assert_eq!(first, vec![false, false, false]);
    }

    #[test]
    fn test_multiple_of() {
        assert!(MultipleOf(3_i64).check(&9));
        assert!(!MultipleOf(3_i64).check(&10));
        assert!(!MultipleOf(0_i64).check(&0));
        assert!(MultipleOf(0.5_f64).check(&2.0));
    }

    #[test]
    fn test_multiple_of_extreme_integers() {
        assert!(MultipleOf(-1_i64).check(&i64::MIN));
        assert!(MultipleOf(i64::MIN).check(&i64::MIN));
        assert!(MultipleOf(-1_i64).check(&i64::MAX));
        assert!(!MultipleOf(2_i64).check(&i64::MAX));
    }

    #[test]
    fn test_choices_and_equal_to() {
        let choices = Choices::new(vec!["a".to_string(), "b".to_string()]);
        assert!(choices.check(&"b".to_string()));
        assert!(!choices.check(&"c".to_string()));
        assert_eq!(choices.info().params["choices"], json!(["a", "b"]));
        assert!(EqualTo(true).check(&true));
    }

    #[test]
    fn test_length_counts_chars() {
        let s = "héllo".to_string();
        assert!(ExactLength(5).check(&s));
        assert!(MinLength(5).check(&s));
        assert!(!MaxLength(4).check(&s));
    }

    #[test]
    fn test_string_shape_predicates() {
        assert!(StartsWith("ab".into()).check(&"abc".to_string()));
        assert!(EndsWith("bc".into()).check(&"abc".to_string()));
        assert!(!NotBlank.check(&"  \t".to_string()));

        let digits = RegexPredicate::new(r"^\d+$").unwrap();
        assert!(digits.check(&"123".to_string()));
        assert!(!digits.check(&"12a".to_string()));
        assert!(RegexPredicate::new("(").is_err());
    }

    #[test]
    fn test_email() {
        assert!(EmailPredicate.check(&"a.b+c@example.co.uk".to_string()));
        assert!(!EmailPredicate.check(&"nope".to_string()));
        assert!(!EmailPredicate.check(&"a@b".to_string()));
        assert!(!EmailPredicate.check(&"a@@b.com".to_string()));
        assert!(!EmailPredicate.check(&"a b@c.com".to_string()));
    }

    #[test]
    fn test_collection_predicates() {
        let items = vec![1, 2, 2];
        assert!(MinItems(3).check(&items));
        assert!(!MaxItems(2).check(&items));
        assert!(ExactItemCount(3).check(&items));
        assert!(!UniqueItems.check(&items));
        assert!(UniqueItems.check(&vec![1, 2, 3]));

        let mut map = Map::new();
        map.insert("a".into(), json!(1));
        assert!(MinKeys(1).check(&map));
        assert!(!MaxKeys(0).check(&map));
    }

    #[tokio::test]
    async fn test_async_fn_predicate() {
        use futures::FutureExt;

        let pred = AsyncFnPredicate::new("positive", |n: &i64| {
            let ok = *n > 0;
            async move { ok }.boxed()
        });
        assert!(pred.check_async(&1).await);
        assert!(!pred.check_async(&-1).await);
        assert_eq!(pred.info().mode, crate::info::CheckMode::Async);
    }
}
