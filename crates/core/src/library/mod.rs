//! Uploaded-originals management.
//!
//! The library owns everything about originals that is not derivative
//! computation: storing uploads under section directories, reporting file
//! metadata, and browsing sections. All paths stay inside the originals
//! storage root.

pub mod error;
pub mod service;
pub mod types;

pub use error::LibraryError;
pub use service::LibraryService;
pub use types::{FileEntry, FileInfo, ImageDimensions, SectionSummary, StoredUpload};
