//! clef-core - Core library for Clef
//!
//! This crate contains the session handling, media normalization, upload,
//! and gallery logic shared by all Clef interfaces.

mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gallery;
pub mod media;
pub mod nav;
pub mod upload;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use media::{MediaDescriptor, MediaKind};
