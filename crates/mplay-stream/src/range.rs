//! HTTP `Range` header parsing.
//!
//! The policy is lenient: anything we cannot honour exactly falls back to the
//! whole object. This module never produces a 416.

/// Inclusive byte interval within an object.
///
/// Always satisfies `start <= end < size` for the object it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInterval {
    pub start: u64,
    pub end: u64,
}

impl StreamInterval {
    /// Build an interval, returning `None` unless `start <= end < size`.
    pub fn new(start: u64, end: u64, size: u64) -> Option<Self> {
        (start <= end && end < size).then_some(Self { start, end })
    }

    /// The whole object, or `None` for an empty one.
    pub fn full(size: u64) -> Option<Self> {
        size.checked_sub(1).map(|end| Self { start: 0, end })
    }

    /// Number of bytes covered; never zero.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for an object of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// A parsed `Range` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// Bytes to serve.
    pub interval: StreamInterval,
    /// True when the client sent a `Range` header at all; decides 206 vs 200.
    pub partial: bool,
}

impl RangeRequest {
    /// Resolve an optional `Range` header against an object of `size` bytes.
    ///
    /// Supports `bytes=A-B`, `bytes=A-` and `bytes=-N`. An end past the object
    /// is clamped. Missing, malformed, multi-range or unsatisfiable headers
    /// select the whole object. Returns `None` only when `size == 0`.
    pub fn parse(header: Option<&str>, size: u64) -> Option<Self> {
        let full = StreamInterval::full(size)?;
        let interval = header
            .and_then(|value| parse_byte_range(value, size))
            .unwrap_or(full);

        Some(Self {
            interval,
            partial: header.is_some(),
        })
    }
}

fn parse_byte_range(value: &str, size: u64) -> Option<StreamInterval> {
    let ranges = value.trim().strip_prefix("bytes=")?;
    if ranges.contains(',') {
        return None;
    }

    let (start, end) = ranges.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    let last = size.checked_sub(1)?;

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix: u64 = end.parse().ok()?;
            if suffix == 0 {
                return None;
            }
            StreamInterval::new(size.saturating_sub(suffix), last, size)
        }
        // bytes=500-
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            StreamInterval::new(start, last, size)
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            StreamInterval::new(start, end.min(last), size)
        }
        (true, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(header: Option<&str>, size: u64) -> (u64, u64) {
        let req = RangeRequest::parse(header, size).unwrap();
        (req.interval.start, req.interval.end)
    }

    #[test]
    fn test_no_header_is_full_and_not_partial() {
        let req = RangeRequest::parse(None, 1000).unwrap();
        assert_eq!((req.interval.start, req.interval.end), (0, 999));
        assert!(!req.partial);
    }

    #[test]
    fn test_closed_range() {
        assert_eq!(interval(Some("bytes=0-499"), 1000), (0, 499));
        assert_eq!(interval(Some("bytes=100-100"), 1000), (100, 100));
    }

    #[test]
    fn test_open_end() {
        assert_eq!(interval(Some("bytes=500-"), 1000), (500, 999));
    }

    #[test]
    fn test_end_is_clamped() {
        assert_eq!(interval(Some("bytes=0-2000"), 1000), (0, 999));
    }

    #[test]
    fn test_suffix() {
        assert_eq!(interval(Some("bytes=-200"), 1000), (800, 999));
        assert_eq!(interval(Some("bytes=-5000"), 1000), (0, 999));
    }

    #[test]
    fn test_malformed_falls_back_to_full() {
        for header in [
            "bytes=-",
            "bytes=abc-def",
            "items=0-10",
            "0-10",
            "bytes=10",
            "bytes=-0",
            "bytes=0-1,5-6",
        ] {
            let req = RangeRequest::parse(Some(header), 1000).unwrap();
            assert_eq!(
                (req.interval.start, req.interval.end),
                (0, 999),
                "header {header:?}"
            );
            assert!(req.partial);
        }
    }

    #[test]
    fn test_unsatisfiable_falls_back_to_full() {
        assert_eq!(interval(Some("bytes=1500-"), 1000), (0, 999));
        assert_eq!(interval(Some("bytes=1000-1001"), 1000), (0, 999));
        assert_eq!(interval(Some("bytes=600-500"), 1000), (0, 999));
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(interval(Some(" bytes= 10 - 20 "), 1000), (10, 20));
    }

    #[test]
    fn test_last_byte() {
        let req = RangeRequest::parse(Some("bytes=9999999-"), 10_000_000).unwrap();
        assert_eq!(req.interval.len(), 1);
        assert_eq!(
            req.interval.content_range(10_000_000),
            "bytes 9999999-9999999/10000000"
        );
    }

    #[test]
    fn test_empty_object_has_no_interval() {
        assert!(RangeRequest::parse(None, 0).is_none());
        assert!(RangeRequest::parse(Some("bytes=0-10"), 0).is_none());
    }

    #[test]
    fn test_interval_invariant() {
        assert!(StreamInterval::new(5, 4, 10).is_none());
        assert!(StreamInterval::new(0, 10, 10).is_none());
        assert_eq!(StreamInterval::new(2, 9, 10).unwrap().len(), 8);
    }
}
