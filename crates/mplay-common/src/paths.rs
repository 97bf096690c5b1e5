//! Path utilities for guessing MIME types by extension.

use std::path::Path;

/// Extension to MIME type table for the containers players commonly request.
const MIME_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/ogg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
];

/// Guess the MIME type of a file name or object key from its extension.
///
/// # Examples
///
/// ```
/// use mplay_common::paths::guess_mime;
///
/// assert_eq!(guess_mime("songs/track.MP3"), "audio/mpeg");
/// assert_eq!(guess_mime("video.webm"), "video/webm");
/// assert_eq!(guess_mime("blob"), "application/octet-stream");
/// ```
pub fn guess_mime(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    ext.and_then(|ext| {
        MIME_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, mime)| *mime)
    })
    .unwrap_or("application/octet-stream")
}

/// Final path component of an object key, used as a display name.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
