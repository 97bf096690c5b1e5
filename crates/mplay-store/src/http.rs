//! HTTP object-server store.
//!
//! Objects live at `{base_url}/{object}` on any server that honours byte
//! ranges (MinIO, S3 public buckets, nginx). Each fetch is a single `GET`
//! covering exactly the requested chunks.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use mplay_stream::ChunkStore;
use reqwest::header::{HeaderMap, RANGE, RETRY_AFTER};
use reqwest::StatusCode;

use crate::chunk_span;

/// Back-off used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    chunk_size: u64,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, chunk_size: u64) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, chunk_size)
    }

    /// Share an existing client (and its connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, chunk_size: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            chunk_size,
        }
    }

    pub fn object_url(&self, object: &ObjectRef) -> String {
        format!("{}/{}", self.base_url, object.as_str().trim_start_matches('/'))
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[async_trait]
impl ChunkStore for HttpStore {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        let (start, end) = chunk_span(chunk_index, chunk_count, self.chunk_size);
        let url = self.object_url(object);

        let response = self
            .client
            .get(&url)
            .header(RANGE, format!("bytes={}-{}", start, end - 1))
            .send()
            .await
            .map_err(|e| Error::fetch(chunk_index, e))?;

        let status = response.status();
        match status {
            StatusCode::PARTIAL_CONTENT => response
                .bytes()
                .await
                .map_err(|e| Error::fetch(chunk_index, e)),
            // Server ignored the Range header and sent the whole object.
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| Error::fetch(chunk_index, e))?;
                let size = body.len() as u64;
                if start >= size {
                    return Err(Error::fetch(chunk_index, "chunk past end of object"));
                }
                tracing::debug!(url = %url, "Object server ignored Range; slicing locally");
                Ok(body.slice(start as usize..end.min(size) as usize))
            }
            StatusCode::NOT_FOUND => Err(Error::not_found("object", object)),
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited {
                retry_after: retry_after(response.headers()),
            }),
            _ => Err(Error::fetch(
                chunk_index,
                format!("GET {url} returned {status}"),
            )),
        }
    }

    fn chunk_size(&self) -> Option<u64> {
        Some(self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_joins_cleanly() {
        let store = HttpStore::new("http://minio:9000/music-library/", 1024);
        assert_eq!(
            store.object_url(&"/songs/a.mp3".into()),
            "http://minio:9000/music-library/songs/a.mp3"
        );
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after(&headers), Duration::from_secs(7));
        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }
}
