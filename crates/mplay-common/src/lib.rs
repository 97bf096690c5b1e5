//! mplay-common: Shared types and the unified error type.
//!
//! This crate provides functionality used across all mplay crates:
//!
//! - **Typed IDs**: [`MediaId`] and [`ObjectRef`] keep catalog identifiers and
//!   backing-store object references from being mixed up
//! - **Core Types**: [`MediaReference`] and [`Variant`]
//! - **Path Utilities**: MIME type guessing by file extension
//! - **Error Handling**: [`Error`] with HTTP status mapping, and [`Result`]
//!
//! # Examples
//!
//! ```
//! use mplay_common::{Error, MediaId, Result};
//! use mplay_common::paths::guess_mime;
//!
//! let id = MediaId::new("song-1");
//! assert_eq!(guess_mime("song-1.mp3"), "audio/mpeg");
//!
//! fn example(id: &MediaId) -> Result<()> {
//!     Err(Error::not_found("media", id))
//! }
//! assert_eq!(example(&id).unwrap_err().http_status(), 404);
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
