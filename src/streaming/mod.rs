//! Media streaming routes.
//!
//! - `GET /stream/{media_id}[?type=audio|video]` - Range-addressable media bytes
//! - `HEAD /stream/{media_id}[?type=audio|video]` - The same headers, no fetch
//! - `GET /stream/{media_id}/info[?type=audio|video]` - File name, MIME type and size

mod chunked;

pub use chunked::{media_info, stream_media, stream_media_head, MediaInfo, StreamQuery};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the stream router, nested under `/stream`.
pub fn stream_router() -> Router<AppContext> {
    Router::new()
        .route("/:media_id", get(stream_media).head(stream_media_head))
        .route("/:media_id/info", get(media_info))
}
