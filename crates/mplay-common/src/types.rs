//! Core type definitions shared by the engine, stores, and server.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ObjectRef;

/// Which rendition of a media item a client asked for.
///
/// Selected with the `type` query parameter on stream routes. Unknown values
/// fall back to [`Variant::Default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// The object the media item was registered with.
    #[default]
    Default,
    /// Extracted audio-only rendition.
    Audio,
    /// Original video rendition.
    Video,
}

impl Variant {
    /// Lenient parse of a `type=` query value.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("audio") => Self::Audio,
            Some("video") => Self::Video,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// A resolved, immutable pointer to media bytes in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Backing-store object identifier.
    pub object: ObjectRef,
    /// Total size of the object in bytes.
    pub size: u64,
    /// Declared MIME type.
    pub mime: String,
    /// Display file name, used by the info route.
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_query() {
        assert_eq!(Variant::from_query(None), Variant::Default);
        assert_eq!(Variant::from_query(Some("audio")), Variant::Audio);
        assert_eq!(Variant::from_query(Some("VIDEO")), Variant::Video);
        assert_eq!(Variant::from_query(Some("hd")), Variant::Default);
    }

    #[test]
    fn test_variant_serde_lowercase() {
        let json = serde_json::to_string(&Variant::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        assert_eq!(Variant::Video.to_string(), "video");
    }
}
