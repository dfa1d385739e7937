//! Locations inside an error tree.
//!
//! [`ErrorPath`] is produced by [`Invalid::leaves`](crate::Invalid::leaves)
//! and names where in the input a leaf failure sits, e.g. `users[0].email`.

use std::fmt::{self, Display};

/// One step from a compound failure to a nested one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A record field, displayed as `.name`.
    Field(String),
    /// A sequence or tuple position, displayed as `[0]`.
    Index(usize),
    /// The value stored under a map key, displayed as `["key"]`.
    Key(String),
    /// A map key that was itself rejected, displayed as `{key}`.
    MapKey(String),
    /// A union alternative by declaration position, displayed as `<0>`.
    Variant(usize),
}

/// A path from the validated root to a nested value.
///
/// Paths are immutable; every `push_*` returns a new path.
///
/// # Example
///
/// ```rust
/// use conform::ErrorPath;
///
/// let path = ErrorPath::root()
///     .push_field("users")
///     .push_index(0)
///     .push_field("email");
///
/// assert_eq!(path.to_string(), "users[0].email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorPath {
    segments: Vec<PathSegment>,
}

impl ErrorPath {
    pub fn root() -> Self {
        Self::default()
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn push_field(&self, name: impl Into<String>) -> Self {
        self.push(PathSegment::Field(name.into()))
    }

    pub fn push_index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    pub fn push_key(&self, key: impl Into<String>) -> Self {
        self.push(PathSegment::Key(key.into()))
    }

    pub fn push_map_key(&self, key: impl Into<String>) -> Self {
        self.push(PathSegment::MapKey(key.into()))
    }

    pub fn push_variant(&self, index: usize) -> Self {
        self.push(PathSegment::Variant(index))
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the path without its last segment, or None at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
                PathSegment::Key(key) => write!(f, "[{:?}]", key)?,
                PathSegment::MapKey(key) => write!(f, "{{{}}}", key)?,
                PathSegment::Variant(idx) => write!(f, "<{}>", idx)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_is_empty() {
        let path = ErrorPath::root();
        assert!(path.is_root());
        assert_eq!(path.len(), 0);
        assert_eq!(path.to_string(), "");
        assert!(path.parent().is_none());
    }

    #[test]
    fn test_fields_and_indices() {
        let path = ErrorPath::root()
            .push_field("body")
            .push_index(42)
            .push_field("name");
        assert_eq!(path.to_string(), "body[42].name");
    }

    #[test]
    fn test_map_segments() {
        let value = ErrorPath::root().push_field("scores").push_key("alice");
        assert_eq!(value.to_string(), "scores[\"alice\"]");

        let key = ErrorPath::root().push_field("scores").push_map_key("al ice");
        assert_eq!(key.to_string(), "scores{al ice}");
    }

    #[test]
    fn test_variant_then_field() {
        let path = ErrorPath::root().push_variant(1).push_field("kind");
        assert_eq!(path.to_string(), "<1>.kind");
    }

    #[test]
    fn test_push_does_not_mutate() {
        let base = ErrorPath::root().push_field("users");
        let a = base.push_index(0);
        let b = base.push_index(1);

        assert_eq!(base.to_string(), "users");
        assert_eq!(a.to_string(), "users[0]");
        assert_eq!(b.to_string(), "users[1]");
        assert_eq!(a.parent(), Some(base));
        assert_eq!(b.last(), Some(&PathSegment::Index(1)));
    }
}
