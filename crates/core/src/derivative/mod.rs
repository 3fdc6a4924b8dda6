//! The derivative-cache subsystem.
//!
//! Derivatives (resizes, thumbnails, video frames, PDF page renders) are
//! computed on demand from uploaded originals and cached on disk. Pieces:
//! - [`TransformSpec`] describes how a derivative is produced
//! - [`CacheKey`] deterministically locates it under a storage root
//! - [`DerivativeService`] runs the resolve, check, serve-or-generate
//!   protocol against a [`DerivativeRenderer`]
//! - [`InvalidationSweeper`] cascades an original's deletion to every
//!   derivative that could have come from it

pub mod error;
pub mod key;
pub mod orchestrator;
pub mod sweep;
pub mod types;

pub use error::DerivativeError;
pub use key::{video_stem, CacheKey, ThumbnailKey};
pub use orchestrator::{Derivative, DerivativeRenderer, DerivativeService};
pub use sweep::InvalidationSweeper;
pub use types::{FrameTimestamp, InvalidTimestamp, OutputFormat, TransformSpec, DEFAULT_QUALITY};
