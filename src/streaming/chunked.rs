//! Range-addressable streaming from the chunked backing store.
//!
//! Resolves the media id, parses the `Range` header and hands the interval to
//! the stream engine. The first block is fetched before the response head is
//! committed, so a backing store that fails outright still produces a proper
//! error status. `HEAD` answers from the catalog alone.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::{stream, StreamExt};
use mplay_common::{Error, MediaId, MediaReference, Variant};
use mplay_stream::{RangeRequest, StreamInterval};
use serde::{Deserialize, Serialize};

use crate::server::{AppContext, AppError};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Query parameters shared by the stream routes.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// `audio` or `video`; anything else selects the default object.
    #[serde(rename = "type")]
    pub variant: Option<String>,
}

impl StreamQuery {
    fn variant(&self) -> Variant {
        Variant::from_query(self.variant.as_deref())
    }
}

/// Media metadata returned by the info route.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaInfo {
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
}

impl From<MediaReference> for MediaInfo {
    fn from(media: MediaReference) -> Self {
        Self {
            file_name: media.file_name,
            mime_type: media.mime,
            file_size: media.size,
        }
    }
}

/// Stream a media object, honouring `Range`.
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Path(media_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = MediaId::new(media_id);
    let media = ctx.resolver.resolve(&id, query.variant()).await?;
    let Some(range) = requested_range(&headers, &media) else {
        return empty_object(&media);
    };
    let interval = range.interval;

    tracing::debug!(
        media_id = %id,
        object = %media.object,
        start = interval.start,
        end = interval.end,
        partial = range.partial,
        "Opening stream"
    );

    let mut blocks = ctx.engine.open(&media, interval, &ctx.shutdown)?;
    let interval = blocks.interval();

    let first = match blocks.next().await {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => return Err(e.into()),
        None => return Err(Error::Internal("stream ended before its first block".into()).into()),
    };

    let body = Body::from_stream(stream::once(async move { Ok::<_, Error>(first) }).chain(blocks));

    response_head(range.partial, &media, interval)
        .body(body)
        .map_err(|e| Error::Internal(e.to_string()).into())
}

/// Headers of [`stream_media`] without fetching anything.
pub async fn stream_media_head(
    State(ctx): State<AppContext>,
    Path(media_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let media = ctx
        .resolver
        .resolve(&MediaId::new(media_id), query.variant())
        .await?;
    let Some(range) = requested_range(&headers, &media) else {
        return empty_object(&media);
    };

    response_head(range.partial, &media, range.interval)
        .body(Body::empty())
        .map_err(|e| Error::Internal(e.to_string()).into())
}

/// Describe a media object without touching the backing store.
pub async fn media_info(
    State(ctx): State<AppContext>,
    Path(media_id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let media = ctx
        .resolver
        .resolve(&MediaId::new(media_id), query.variant())
        .await?;
    Ok(Json(MediaInfo::from(media)))
}

fn requested_range(headers: &HeaderMap, media: &MediaReference) -> Option<RangeRequest> {
    // A header we cannot even decode still counts as a range request.
    let range_header = headers
        .get(header::RANGE)
        .map(|h| h.to_str().unwrap_or_default());
    RangeRequest::parse(range_header, media.size)
}

fn response_head(
    partial: bool,
    media: &MediaReference,
    interval: StreamInterval,
) -> axum::http::response::Builder {
    let status = if partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, &media.mime)
        .header(header::CONTENT_LENGTH, interval.len().to_string())
        .header(header::CONTENT_RANGE, interval.content_range(media.size))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(X_ACCEL_BUFFERING, "no")
}

/// Zero-byte objects have no satisfiable interval; answer with an empty 200.
fn empty_object(media: &MediaReference) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &media.mime)
        .header(header::CONTENT_LENGTH, "0")
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(Bytes::new()))
        .map_err(|e| Error::Internal(e.to_string()).into())
}
