//! Common types used across the application.

pub mod media;
pub mod pagination;

pub use media::MediaKind;
pub use pagination::{PageRequest, PageResponse};
