//! # Conform
//!
//! Composable validators that turn dynamic data into typed values or into
//! a structured tree of everything that was wrong with it.
//!
//! ## Overview
//!
//! A [`Validator<T>`] takes a `serde_json::Value` and returns either the
//! conformed `T` or an [`Invalid`] describing the failure. Failures are
//! values, never panics: sibling fields, sibling items and sibling
//! predicates are all checked, and every failure is kept in an
//! [`ErrKind`] tree that mirrors the input. Rendering messages from that
//! tree is left to the caller.
//!
//! Every validator runs the same pipeline:
//!
//! 1. confirm the type, or convert the input with a [`Coercer`]
//! 2. apply [`Processor`]s in order
//! 3. evaluate every [`Predicate`], reporting all failures together
//! 4. for compound validators, run an optional whole-value check
//!
//! Each validator can also run asynchronously. Validators holding
//! async-only predicates refuse the synchronous path with a [`UsageError`].
//!
//! ## Example
//!
//! ```rust
//! use conform::{ErrKind, Field, RecordValidator, Shape, Validator};
//! use serde_json::json;
//!
//! #[derive(Debug)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let person = RecordValidator::new(
//!     (
//!         Field::required("name", Shape::string().strip().min_len(1)),
//!         Field::required("age", Shape::int().min(0)),
//!     ),
//!     |(name, age)| Person { name, age },
//! )
//! .unwrap();
//!
//! let ok = person.validate(&json!({"name": " Ada ", "age": 36})).into_result().unwrap();
//! assert_eq!(ok.name, "Ada");
//!
//! let err = person.validate(&json!({"name": "", "age": "x"})).into_result().unwrap_err();
//! match err.err {
//!     ErrKind::FieldErrors(fields) => assert_eq!(fields.len(), 2),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod coerce;
pub mod error;
pub mod info;
pub mod path;
mod pipeline;
pub mod predicate;
pub mod processor;
pub mod registry;
pub mod validation;
pub mod validators;

pub use coerce::Coercer;
pub use error::{CustomErr, EntryErrors, ErrKind, Invalid, UsageError};
pub use info::{CheckMode, FieldInfo, PredicateInfo, Presence, ValidatorInfo, ValidatorKind};
pub use path::{ErrorPath, PathSegment};
pub use predicate::{AsyncFnPredicate, FnPredicate, Predicate, PredicateAsync};
pub use processor::{FnProcessor, Processor};
pub use registry::{RegistryError, ValidatorRegistry};
pub use validation::{Checked, ValidationResult};
pub use validators::{
    AlwaysValid, BoolValidator, CacheConfig, CacheStore, CacheValidator, DictValidatorAny,
    EqualsValidator, Field, FieldFailures, FieldSet, FloatValidator, IntValidator, Lazy,
    ListValidator, MapValidator, Mapped, MemoryCache, NoneValidator, OneOf2, OneOf2Validator,
    OneOf3, OneOf3Validator, OneOf4, OneOf4Validator, OptionalValidator, RecordValidator, Scalar,
    ScalarValidator, Shape, SlotFailures, SlotSet, StringValidator, TupleValidator, UnionValidator,
    Validator, ValidatorExt,
};
