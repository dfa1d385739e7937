//! Error types.
//!
//! Invalid data is described by [`Invalid`] and its [`ErrKind`] tree.
//! Misuse of the library is described by [`UsageError`]. The two never mix:
//! compound validators wrap child `Invalid`s and propagate `UsageError`s.

mod kind;
mod usage;

pub use kind::{CustomErr, EntryErrors, ErrKind, Invalid};
pub use usage::UsageError;
