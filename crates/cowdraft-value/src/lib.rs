//! cowdraft value model
//!
//! Immutable value trees with identity-based structural sharing.
//!
//! # Core Concepts
//!
//! - [`Value`]: closed tagged variant of primitives, containers and opaque leaves
//! - [`Map`] / [`List`]: reference-counted keyed and ordered containers whose
//!   allocation is their identity
//! - [`Opaque`]: leaf of arbitrary Rust type, never introspected
//! - [`KeyPath`]: hierarchical addressing within a tree
//!
//! Cloning any value is shallow. Containers can be frozen; a frozen container
//! rejects every write with [`ValueError::ImmutableViolation`].
//!
//! # Example
//!
//! ```rust
//! use cowdraft_value::{Map, Value};
//!
//! let mut record: Map = [("id", "i1"), ("foo", "foo")].into_iter().collect();
//! record.insert("foo", "new foo").unwrap();
//!
//! record.freeze();
//! assert!(record.insert("foo", "again").is_err());
//! assert_eq!(record.get("foo"), Some(&Value::from("new foo")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod container;
mod json;
mod opaque;
mod path;
mod value;

pub use container::{List, Map};
pub use json::{from_value, to_value};
pub use opaque::Opaque;
pub use path::{Key, KeyPath, PathError};
pub use value::{Value, ValueError, ValueKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
