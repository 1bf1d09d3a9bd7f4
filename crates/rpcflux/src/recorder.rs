// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request-to-point translation.
//!
//! Every inbound request yields exactly one `request` point, even when its
//! body does not decode; a decode failure is an observable measurement, not
//! a dropped one. Each JSON-RPC call found in the body additionally yields
//! one `call:<method>` point sharing the request's tags and timestamp.

use crate::jsonrpc;
use crate::point::{FieldValue, MetricPoint, SharedTags};
use crate::writer::PointWriter;
use std::sync::Arc;

/// Measurement name for the per-request point.
pub const REQUEST_MEASUREMENT: &str = "request";

/// Measurement prefix for per-call points; the method name is appended.
pub const CALL_MEASUREMENT_PREFIX: &str = "call:";

/// Tags derived once per request from upstream proxy headers.
///
/// Either value may be empty when the corresponding header is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTags {
    pub origin_url: String,
    pub country: String,
}

impl RequestTags {
    /// Materialize the tag set shared by all points of one request.
    fn to_shared(&self) -> SharedTags {
        Arc::new(vec![
            ("origin_url".to_string(), self.origin_url.clone()),
            ("country".to_string(), self.country.clone()),
        ])
    }
}

/// Build the request point plus one call point per parsed call.
///
/// `timestamp_ns` is captured once at request entry; all points of the
/// request carry it.
pub fn build_points(
    tags: &RequestTags,
    cache_hits: Option<i64>,
    body: &[u8],
    timestamp_ns: u64,
) -> Vec<MetricPoint> {
    let shared = tags.to_shared();

    let mut request_point = MetricPoint::new(REQUEST_MEASUREMENT, shared.clone(), timestamp_ns);
    request_point.add_field("value", FieldValue::Integer(1));
    if let Some(hits) = cache_hits {
        request_point.add_field("cache_hits", FieldValue::Integer(hits));
    }

    match jsonrpc::parse_body(body) {
        Err(_) => {
            request_point.add_field("invalid_json", FieldValue::Boolean(true));
            request_point.add_field("size", FieldValue::Integer(body.len() as i64));
            vec![request_point]
        }
        Ok(parsed) => {
            request_point.add_field("batch", FieldValue::Boolean(parsed.is_batch));
            if parsed.is_batch {
                request_point.add_field(
                    "batch_size",
                    FieldValue::Integer(parsed.calls.len() as i64),
                );
            }

            let mut points = Vec::with_capacity(1 + parsed.calls.len());
            points.push(request_point);
            for call in parsed.calls {
                let mut call_point = MetricPoint::new(
                    format!("{}{}", CALL_MEASUREMENT_PREFIX, call.method),
                    shared.clone(),
                    timestamp_ns,
                );
                call_point.add_field("value", FieldValue::Integer(1));
                points.push(call_point);
            }
            points
        }
    }
}

/// Builds and submits the points for one observed request.
#[derive(Clone)]
pub struct RequestRecorder {
    writer: PointWriter,
}

impl RequestRecorder {
    pub fn new(writer: PointWriter) -> Self {
        Self { writer }
    }

    /// Translate one request into points and hand them to the writer.
    ///
    /// Never blocks and never fails: a malformed body is recorded on the
    /// request point, and delivery errors surface later on the writer's
    /// failure stream.
    pub fn record(
        &self,
        tags: &RequestTags,
        cache_hits: Option<i64>,
        body: &[u8],
        timestamp_ns: u64,
    ) {
        for point in build_points(tags, cache_hits, body, timestamp_ns) {
            self.writer.submit(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> RequestTags {
        RequestTags {
            origin_url: "https://rpc.example".to_string(),
            country: "DE".to_string(),
        }
    }

    #[test]
    fn test_single_call_body() {
        let points = build_points(&tags(), None, br#"{"method":"foo"}"#, 42);

        assert_eq!(points.len(), 2);

        let request = &points[0];
        assert_eq!(request.measurement(), "request");
        assert_eq!(request.field("value"), Some(&FieldValue::Integer(1)));
        assert_eq!(request.field("batch"), Some(&FieldValue::Boolean(false)));
        assert_eq!(request.field("batch_size"), None);
        assert_eq!(request.field("invalid_json"), None);

        let call = &points[1];
        assert_eq!(call.measurement(), "call:foo");
        assert_eq!(call.field("value"), Some(&FieldValue::Integer(1)));
        assert_eq!(call.field("batch"), None);
        assert_eq!(call.field("cache_hits"), None);
    }

    #[test]
    fn test_batch_body() {
        let points = build_points(&tags(), None, br#"[{"method":"a"},{"method":"b"}]"#, 42);

        assert_eq!(points.len(), 3);

        let request = &points[0];
        assert_eq!(request.field("batch"), Some(&FieldValue::Boolean(true)));
        assert_eq!(request.field("batch_size"), Some(&FieldValue::Integer(2)));

        assert_eq!(points[1].measurement(), "call:a");
        assert_eq!(points[2].measurement(), "call:b");
    }

    #[test]
    fn test_invalid_body() {
        let body = b"not json";
        let points = build_points(&tags(), None, body, 42);

        assert_eq!(points.len(), 1, "no call points for an invalid body");

        let request = &points[0];
        assert_eq!(request.measurement(), "request");
        assert_eq!(request.field("value"), Some(&FieldValue::Integer(1)));
        assert_eq!(
            request.field("invalid_json"),
            Some(&FieldValue::Boolean(true))
        );
        assert_eq!(request.field("size"), Some(&FieldValue::Integer(8)));
        assert_eq!(request.field("batch"), None);
    }

    #[test]
    fn test_cache_hits_field_only_when_present() {
        let with = build_points(&tags(), Some(3), br#"{"method":"foo"}"#, 42);
        assert_eq!(with[0].field("cache_hits"), Some(&FieldValue::Integer(3)));

        let without = build_points(&tags(), None, br#"{"method":"foo"}"#, 42);
        assert_eq!(without[0].field("cache_hits"), None);
    }

    #[test]
    fn test_cache_hits_recorded_even_for_invalid_body() {
        let points = build_points(&tags(), Some(7), b"{", 42);
        assert_eq!(points[0].field("cache_hits"), Some(&FieldValue::Integer(7)));
    }

    #[test]
    fn test_all_points_share_tags_and_timestamp() {
        let points = build_points(&tags(), None, br#"[{"method":"a"},{"method":"b"}]"#, 99);

        for point in &points {
            assert_eq!(point.timestamp_ns(), 99);
            assert_eq!(
                point.tags(),
                &[
                    ("origin_url".to_string(), "https://rpc.example".to_string()),
                    ("country".to_string(), "DE".to_string()),
                ]
            );
        }
    }

    #[test]
    fn test_malformed_batch_elements_do_not_produce_call_points() {
        let points = build_points(&tags(), None, br#"[{"method":"a"},42]"#, 42);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].field("batch_size"), Some(&FieldValue::Integer(1)));
        assert_eq!(points[1].measurement(), "call:a");
    }

    #[test]
    fn test_zero_call_valid_body_is_not_invalid() {
        let points = build_points(&tags(), None, b"42", 42);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].field("invalid_json"), None);
        assert_eq!(points[0].field("batch"), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn test_empty_tags_are_still_emitted() {
        let points = build_points(&RequestTags::default(), None, br#"{"method":"m"}"#, 1);

        assert_eq!(
            points[0].tags(),
            &[
                ("origin_url".to_string(), String::new()),
                ("country".to_string(), String::new()),
            ]
        );
    }
}
