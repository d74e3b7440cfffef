//! Key paths for addressing within value trees
//!
//! Provides [`Key`] and [`KeyPath`] for hierarchical addressing of slots in
//! keyed and ordered containers.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A single slot address inside a container
///
/// Keyed containers are addressed by [`Key::Field`], ordered containers by
/// [`Key::Index`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Named field of a keyed container
    Field(String),
    /// Position in an ordered container
    Index(usize),
}

impl Key {
    /// Field name, if this is a field key
    #[inline]
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Position, if this is an index key
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Field(_) => None,
            Self::Index(index) => Some(*index),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path from the root of a value tree to one of its slots
///
/// Rendered with a leading `$`, dotted fields and bracketed indices.
///
/// # Examples
/// - `[Field("items"), Index(0), Field("foo")]` → `$.items[0].foo`
/// - `[]` → `$`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath(Vec<Key>);

impl KeyPath {
    /// Create new path from keys
    #[inline]
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self(keys)
    }

    /// Create path from a single key
    #[inline]
    #[must_use]
    pub fn single(key: impl Into<Key>) -> Self {
        Self(vec![key.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path keys
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Get number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut new = self.clone();
        new.push(key);
        new
    }

    /// Append a key in place
    #[inline]
    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    /// Iterator over keys from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for key in &self.0 {
            match key {
                Key::Field(name) => write!(f, ".{name}")?,
                Key::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    /// Parse `$.items[0].foo` or `items[0].foo`
    ///
    /// Dotted segments are always fields, so `$.dict.1` names the field `"1"`.
    /// Only bracketed segments are indices. Field names containing `.`, `[`
    /// or `]` cannot be expressed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('$').unwrap_or(s);
        let s = s.strip_prefix('.').unwrap_or(s);
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut keys = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after.find(']').ok_or(PathError::UnclosedBracket)?;
                let raw = &after[..end];
                let index = raw
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidIndex(raw.to_string()))?;
                keys.push(Key::Index(index));
                rest = &after[end + 1..];
                if let Some(next) = rest.strip_prefix('.') {
                    if next.is_empty() {
                        return Err(PathError::EmptySegment);
                    }
                    rest = next;
                }
                continue;
            }

            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            let segment = &rest[..end];
            if segment.is_empty() {
                return Err(PathError::EmptySegment);
            }
            if segment.contains(']') {
                return Err(PathError::InvalidIndex(segment.to_string()));
            }
            keys.push(Key::Field(segment.to_string()));

            rest = &rest[end..];
            if let Some(next) = rest.strip_prefix('.') {
                if next.is_empty() {
                    return Err(PathError::EmptySegment);
                }
                rest = next;
            }
        }

        Ok(Self(keys))
    }
}

impl From<Vec<Key>> for KeyPath {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl FromIterator<Key> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Errors related to key paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Bracketed segment is not a non-negative integer
    #[error("invalid index segment: {0}")]
    InvalidIndex(String),

    /// `[` without a matching `]`
    #[error("unclosed '[' in path")]
    UnclosedBracket,
}
