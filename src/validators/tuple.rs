//! Fixed-length heterogeneous arrays.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use stillwater::Validation;

use crate::error::{ErrKind, Invalid, UsageError};
use crate::info::{ValidatorInfo, ValidatorKind};
use crate::pipeline::{run_whole, run_whole_async, WholeCheck};
use crate::predicate::{ExactItemCount, Predicate};
use crate::validation::Checked;

use super::traits::{guard_sync, Validator};

/// Per-position failures.
pub type SlotFailures = IndexMap<usize, Invalid>;

/// A tuple of shared validators, one per position. Implemented for 2 to 8
/// slots.
#[async_trait]
pub trait SlotSet: Send + Sync + 'static {
    type Values: Send + Sync + 'static;

    const LEN: usize;

    fn requires_async(&self) -> bool;

    /// `items` always holds exactly `LEN` values.
    fn check(&self, items: &[Value]) -> Result<Result<Self::Values, SlotFailures>, UsageError>;

    async fn check_async(&self, items: &[Value]) -> Result<Result<Self::Values, SlotFailures>, UsageError>;
}

macro_rules! slot_set {
    ($len:expr; $(($idx:tt, $T:ident, $v:ident)),+) => {
        #[async_trait]
        impl<$($T: Send + Sync + 'static),+> SlotSet for ($(Arc<dyn Validator<$T>>,)+) {
            type Values = ($($T,)+);

            const LEN: usize = $len;

            fn requires_async(&self) -> bool {
                false $(|| self.$idx.requires_async())+
            }

            fn check(&self, items: &[Value]) -> Result<Result<Self::Values, SlotFailures>, UsageError> {
                let mut errors = SlotFailures::new();
                $(
                    let $v = match self.$idx.try_validate(&items[$idx])? {
                        Validation::Success(value) => Some(value),
                        Validation::Failure(invalid) => {
                            errors.insert($idx, invalid);
                            None
                        }
                    };
                )+
                match ($($v,)+) {
                    ($(Some($v),)+) => Ok(Ok(($($v,)+))),
                    _ => Ok(Err(errors)),
                }
            }

            async fn check_async(&self, items: &[Value]) -> Result<Result<Self::Values, SlotFailures>, UsageError> {
                let mut errors = SlotFailures::new();
                $(
                    let $v = match self.$idx.try_validate_async(&items[$idx]).await? {
                        Validation::Success(value) => Some(value),
                        Validation::Failure(invalid) => {
                            errors.insert($idx, invalid);
                            None
                        }
                    };
                )+
                match ($($v,)+) {
                    ($(Some($v),)+) => Ok(Ok(($($v,)+))),
                    _ => Ok(Err(errors)),
                }
            }
        }
    };
}

slot_set!(2; (0, A, a), (1, B, b));
slot_set!(3; (0, A, a), (1, B, b), (2, C, c));
slot_set!(4; (0, A, a), (1, B, b), (2, C, c), (3, D, d));
slot_set!(5; (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e));
slot_set!(6; (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f));
slot_set!(7; (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g));
slot_set!(8; (0, A, a), (1, B, b), (2, C, c), (3, D, d), (4, E, e), (5, F, f), (6, G, g), (7, H, h));

/// Validates a JSON array of exactly `S::LEN` items, each with its own
/// validator, into a Rust tuple.
///
/// A wrong length fails with `PredicateFailures([exact_item_count])`
/// before any slot is checked. Slot failures accumulate as `ItemErrors`.
///
/// # Example
///
/// ```rust
/// use conform::{Shape, TupleValidator, Validator, ValidatorExt};
/// use serde_json::json;
///
/// let point = TupleValidator::new((Shape::string().shared(), Shape::float().shared()));
/// let (label, x) = point.validate(&json!(["x", 1.5])).into_result().unwrap();
/// assert_eq!((label.as_str(), x), ("x", 1.5));
///
/// assert!(point.validate(&json!(["x"])).is_failure());
/// ```
pub struct TupleValidator<S: SlotSet> {
    slots: Arc<S>,
    whole: Option<WholeCheck<S::Values>>,
    info: Arc<ValidatorInfo>,
}

impl<S: SlotSet> Clone for TupleValidator<S> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            whole: self.whole.clone(),
            info: Arc::clone(&self.info),
        }
    }
}

impl<S: SlotSet> TupleValidator<S> {
    pub fn new(slots: S) -> Self {
        let mut info = ValidatorInfo::new("tuple", ValidatorKind::Tuple).requiring_async(slots.requires_async());
        info.predicates
            .push(Predicate::<Vec<Value>>::info(&ExactItemCount(S::LEN)));
        Self {
            slots: Arc::new(slots),
            whole: None,
            info: Arc::new(info),
        }
    }

    pub fn check_with(self, check: impl Fn(&S::Values) -> Option<ErrKind> + Send + Sync + 'static) -> Self {
        self.with_whole(WholeCheck::Sync(Arc::new(check)))
    }

    pub fn check_with_async<F>(self, check: F) -> Self
    where
        F: for<'a> Fn(&'a S::Values) -> BoxFuture<'a, Option<ErrKind>> + Send + Sync + 'static,
    {
        self.with_whole(WholeCheck::Async(Arc::new(check)))
    }

    fn with_whole(mut self, whole: WholeCheck<S::Values>) -> Self {
        let requires_async = SlotSet::requires_async(&*self.slots) || whole.is_async_only();
        Arc::make_mut(&mut self.info).requires_async = requires_async;
        self.whole = Some(whole);
        self
    }

    fn items<'v>(&self, value: &'v Value) -> Result<&'v [Value], Invalid> {
        let Some(items) = value.as_array() else {
            return Err(Invalid::type_mismatch("array", value, &self.info));
        };
        if items.len() != S::LEN {
            let failed = vec![Predicate::<Vec<Value>>::info(&ExactItemCount(S::LEN))];
            return Err(Invalid::new(ErrKind::PredicateFailures(failed), value.clone(), &self.info));
        }
        Ok(items)
    }

    fn settle(&self, checked: Result<S::Values, SlotFailures>, value: &Value) -> Result<S::Values, Invalid> {
        checked.map_err(|errors| Invalid::new(ErrKind::ItemErrors(errors), value.clone(), &self.info))
    }

    fn conclude(&self, out: S::Values, failure: Option<ErrKind>, value: &Value) -> Validation<S::Values, Invalid> {
        match failure {
            None => Validation::Success(out),
            Some(err) => Validation::Failure(Invalid::new(err, value.clone(), &self.info)),
        }
    }
}

#[async_trait]
impl<S: SlotSet> Validator<S::Values> for TupleValidator<S> {
    fn try_validate(&self, value: &Value) -> Checked<S::Values> {
        guard_sync(&self.info)?;
        let items = match self.items(value) {
            Ok(items) => items,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let out = match self.settle(self.slots.check(items)?, value) {
            Ok(out) => out,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let failure = run_whole(&self.whole, &out);
        Ok(self.conclude(out, failure, value))
    }

    async fn try_validate_async(&self, value: &Value) -> Checked<S::Values> {
        let items = match self.items(value) {
            Ok(items) => items,
            Err(invalid) => return Ok(Validation::Failure(invalid)),
        };
        let checked = self.slots.check_async(items).await?;
        let out = match self.settle(checked, value) {
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
