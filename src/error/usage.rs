//! Programming errors raised while building or invoking validators.

/// A misuse of the library, as opposed to invalid data.
///
/// Data that fails to conform is always reported as an
/// [`Invalid`](crate::Invalid) value. `UsageError` is reserved for code that
/// uses validators incorrectly: running async-only checks synchronously,
/// referencing validators that were never registered, or declaring a
/// malformed compound validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// An async-only predicate or whole-value check was reached through the
    /// synchronous path.
    #[error("validator '{validator}' holds async-only checks; use validate_async")]
    AsyncOnly { validator: String },

    /// A registry reference was resolved before its target was registered.
    #[error("reference '{name}' does not resolve to a registered validator")]
    UnresolvedReference { name: String },

    /// A registry reference named a validator with a different output type.
    #[error("reference '{name}' resolves to a validator of another output type")]
    ReferenceTypeMismatch { name: String },

    /// The registry behind a reference no longer exists.
    #[error("registry backing reference '{name}' was dropped")]
    RegistryDropped { name: String },

    /// A record declared the same key twice.
    #[error("field '{key}' is declared more than once")]
    DuplicateField { key: String },

    /// A union was declared with no alternatives.
    #[error("union declared without alternatives")]
    EmptyUnion,
}
