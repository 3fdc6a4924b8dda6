//! Filesystem-backed storage for originals and derivatives.
//!
//! This module owns the three storage roots and everything that touches
//! them safely:
//! - [`StorageLayout`] holds the canonical root directories
//! - [`PathResolver`] maps untrusted request paths into a root, rejecting
//!   traversal escapes
//! - [`CacheStore`] is the persistence port for derivative files, with
//!   [`FsCacheStore`] as the filesystem implementation

pub mod error;
pub mod resolver;
pub mod roots;
pub mod store;

pub use error::StorageError;
pub use resolver::PathResolver;
pub use roots::{StorageLayout, StorageRoot};
pub use store::{CacheStore, FsCacheStore};
