//! Core derivative-cache logic for Darkroom.
//!
//! This crate contains the media derivative subsystem with ZERO web dependencies:
//! - Storage roots, traversal-safe path resolution, and the cache store port
//! - Cache key derivation and the serve-or-generate orchestration
//! - Cascading invalidation when an original is deleted
//! - Renderer collaborators (image, video frame, PDF page) behind narrow traits
//! - Library services for uploads, file info, and section listings

pub mod derivative;
pub mod library;
pub mod render;
pub mod storage;
