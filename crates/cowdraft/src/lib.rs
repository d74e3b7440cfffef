//! cowdraft
//!
//! Copy-on-write updates of immutable value trees through mutable drafts.
//!
//! A recipe receives a [`Draft`] of the base value and edits it with ordinary
//! reads and writes. When the recipe returns, the draft tree is finalized into
//! a new value that shares every untouched subtree with the base; the base
//! itself is never changed.
//!
//! # Core Concepts
//!
//! - [`produce`]: run a recipe against a base value
//! - [`Draft`]: the recipe's view of one container; children are drafted
//!   lazily on first read and copied shallowly on first write
//! - [`Outcome`]: keep the draft tree or replace it with another value
//! - [`Producer`]: a producer bound to a [`ProduceConfig`]
//! - [`freeze`]: deep-freeze a value outside a produce call
//!
//! # Example
//!
//! ```rust
//! use cowdraft::{produce, Map, Value};
//!
//! let item: Map = [("id", "i1"), ("foo", "foo")].into_iter().collect();
//! let base: Value = [("items", Value::from(vec![Value::from(item)]
//!     .into_iter()
//!     .collect::<cowdraft::List>()))]
//!     .into_iter()
//!     .collect::<Map>()
//!     .into();
//!
//! let next = produce(&base, |draft| {
//!     draft.draft("items")?.draft(0usize)?.set("foo", "new foo")
//! })
//! .unwrap();
//!
//! assert_eq!(next.get_path(&"items[0].foo".parse().unwrap()), Some(&Value::from("new foo")));
//! assert_eq!(base.get_path(&"items[0].foo".parse().unwrap()), Some(&Value::from("foo")));
//! assert!(next.is_frozen());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod draft;
pub mod error;
mod finalize;
mod node;
mod scope;

pub use config::{ProduceConfig, UnsupportedPolicy};
pub use draft::{Draft, Slot};
pub use error::{DraftError, DraftResult};
pub use scope::active_scopes;

pub use cowdraft_value::{Key, KeyPath, List, Map, Opaque, Value, ValueError, ValueKind};

use scope::Scope;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a recipe hands back
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outcome {
    /// Finalize the draft tree
    #[default]
    Keep,
    /// Discard the draft tree and produce this value instead
    Replace(Value),
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Keep
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Replace(value)
    }
}

impl From<Option<Value>> for Outcome {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Keep, Self::Replace)
    }
}

/// Producer bound to a configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Producer {
    config: ProduceConfig,
}

impl Producer {
    /// Producer with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer with the given configuration
    #[inline]
    #[must_use]
    pub fn with_config(config: ProduceConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProduceConfig {
        &self.config
    }

    /// Run `recipe` against a draft of `base`
    ///
    /// # Errors
    /// Returns the recipe's error unchanged, [`DraftError::NotAContainer`] if
    /// `base` is not a map or list, [`DraftError::CyclicStructure`] if the
    /// draft tree refers to itself, and [`DraftError::ReplacedModifiedDraft`]
    /// if the recipe both edited the draft and returned a replacement
    pub fn produce<T, F>(&self, base: &Value, recipe: F) -> DraftResult<Value>
    where
        F: FnOnce(Draft<'_>) -> DraftResult<T>,
        T: Into<Outcome>,
    {
        self.try_produce(base, recipe)
    }

    /// [`Producer::produce`] with a recipe error type of the caller's choosing
    ///
    /// # Errors
    /// Same as [`Producer::produce`]; draft errors are converted into `E`
    pub fn try_produce<T, E, F>(&self, base: &Value, recipe: F) -> Result<Value, E>
    where
        F: FnOnce(Draft<'_>) -> Result<T, E>,
        T: Into<Outcome>,
        E: From<DraftError>,
    {
        let scope = Scope::open(self.config);
        let root = scope.root(base)?;

        let outcome = match recipe(Draft::new(&scope, root)) {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                tracing::debug!(scope = %scope.id(), depth = scope.depth(), "recipe failed, drafts discarded");
                return Err(err);
            }
        };

        let (result, replaced) = match outcome {
            Outcome::Keep => (scope.finalize(root)?, false),
            Outcome::Replace(_) if scope.is_modified(root) => {
                return Err(DraftError::ReplacedModifiedDraft.into());
            }
            Outcome::Replace(value) => (value, true),
        };

        if self.config.auto_freeze {
            result.freeze();
        }
        tracing::debug!(
            scope = %scope.id(),
            depth = scope.depth(),
            shared = result.ptr_eq(base),
            replaced,
            "produced value"
        );
        Ok(result)
    }

    /// Curried producer taking the base and one argument per call
    ///
    /// This is the shape of a reducer: `(state, action) -> state`.
    pub fn curry<A, T, F>(self, recipe: F) -> impl Fn(&Value, A) -> DraftResult<Value>
    where
        F: Fn(Draft<'_>, A) -> DraftResult<T>,
        T: Into<Outcome>,
    {
        move |base: &Value, arg: A| self.produce(base, |draft| recipe(draft, arg))
    }
}

/// Run `recipe` against a draft of `base` with default configuration
///
/// # Errors
/// See [`Producer::produce`]
pub fn produce<T, F>(base: &Value, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(Draft<'_>) -> DraftResult<T>,
    T: Into<Outcome>,
{
    Producer::new().produce(base, recipe)
}

/// [`produce`] with a recipe error type of the caller's choosing
///
/// # Errors
/// See [`Producer::try_produce`]
pub fn try_produce<T, E, F>(base: &Value, recipe: F) -> Result<Value, E>
where
    F: FnOnce(Draft<'_>) -> Result<T, E>,
    T: Into<Outcome>,
    E: From<DraftError>,
{
    Producer::new().try_produce(base, recipe)
}

/// Deep-freeze `value` and return it
pub fn freeze(value: &Value) -> Value {
    value.freeze();
    value.clone()
}
