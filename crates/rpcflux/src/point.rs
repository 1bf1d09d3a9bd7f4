// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric point model and InfluxDB v2 Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use std::fmt::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl FieldValue {
    /// Append this value to `line` in Line Protocol form.
    ///
    /// - Float: written as-is (e.g., `3.14`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted with double quotes, inner quotes escaped (e.g., `"hello"`)
    /// - Boolean: `true` or `false`
    fn write_line_protocol(&self, line: &mut String) {
        match self {
            FieldValue::Float(v) => {
                let _ = write!(line, "{}", v);
            }
            FieldValue::Integer(v) => {
                let _ = write!(line, "{}i", v);
            }
            FieldValue::String(v) => {
                line.push('"');
                line.push_str(&v.replace('\\', "\\\\").replace('"', "\\\""));
                line.push('"');
            }
            FieldValue::Boolean(v) => {
                line.push_str(if *v { "true" } else { "false" });
            }
        }
    }
}

/// Tag set shared by every point derived from one request.
///
/// Tags are cheap to share and never change after extraction, so points
/// hold them behind an `Arc` instead of cloning the strings per point.
pub type SharedTags = Arc<Vec<(String, String)>>;

/// A single timestamped measurement bound for the time-series store.
///
/// A point is built up by its producer (measurement, tags, fields) and is
/// immutable once handed to the writer: submission takes ownership.
#[derive(Debug, Clone)]
pub struct MetricPoint {
    measurement: String,
    tags: SharedTags,
    fields: Vec<(String, FieldValue)>,
    timestamp_ns: u64,
}

impl MetricPoint {
    /// Create a point with no fields yet.
    pub fn new(measurement: impl Into<String>, tags: SharedTags, timestamp_ns: u64) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            fields: Vec::new(),
            timestamp_ns,
        }
    }

    /// Add a field, replacing any previous value under the same key.
    pub fn add_field(&mut self, key: &str, value: FieldValue) {
        if let Some(existing) = self.fields.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Encode this point as one Line Protocol line.
    ///
    /// Tags are emitted sorted by key for canonical form; a tag with an
    /// empty value is skipped (Line Protocol has no empty tag values).
    /// Fields keep their insertion order.
    ///
    /// # Panics
    /// Panics if the point has no fields (InfluxDB requires at least one).
    pub fn to_line_protocol(&self) -> String {
        assert!(!self.fields.is_empty(), "InfluxDB requires at least one field");

        let mut line = escape_measurement(&self.measurement);

        let mut sorted_tags: Vec<_> = self.tags.iter().filter(|(_, v)| !v.is_empty()).collect();
        sorted_tags.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in sorted_tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            value.write_line_protocol(&mut line);
        }

        line.push(' ');
        let _ = write!(line, "{}", self.timestamp_ns);

        line
    }
}

/// Nanoseconds since the Unix epoch, the precision the store expects.
pub fn unix_timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Escape a measurement name per Line Protocol.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape a tag key, tag value, or field key per Line Protocol.
/// Commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> SharedTags {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_simple_point() {
        let mut point = MetricPoint::new("request", tags(&[]), 1_000_000_000);
        point.add_field("value", FieldValue::Integer(1));

        assert_eq!(point.to_line_protocol(), "request value=1i 1000000000");
    }

    #[test]
    fn test_point_with_tags_sorted() {
        let mut point = MetricPoint::new(
            "request",
            tags(&[("origin_url", "https://a.example"), ("country", "DE")]),
            1_000_000_000,
        );
        point.add_field("value", FieldValue::Integer(1));

        // Tags are sorted alphabetically by key
        assert_eq!(
            point.to_line_protocol(),
            "request,country=DE,origin_url=https://a.example value=1i 1000000000"
        );
    }

    #[test]
    fn test_field_types() {
        let mut point = MetricPoint::new("m", tags(&[]), 7);
        point.add_field("count", FieldValue::Integer(42));
        point.add_field("ratio", FieldValue::Float(3.15));
        point.add_field("ok", FieldValue::Boolean(true));
        point.add_field("note", FieldValue::String("say \"hi\"".to_string()));

        assert_eq!(
            point.to_line_protocol(),
            "m count=42i,ratio=3.15,ok=true,note=\"say \\\"hi\\\"\" 7"
        );
    }

    #[test]
    fn test_add_field_replaces_existing_key() {
        let mut point = MetricPoint::new("m", tags(&[]), 1);
        point.add_field("value", FieldValue::Integer(1));
        point.add_field("value", FieldValue::Integer(2));

        assert_eq!(point.fields().len(), 1);
        assert_eq!(point.field("value"), Some(&FieldValue::Integer(2)));
        assert_eq!(point.to_line_protocol(), "m value=2i 1");
    }

    #[test]
    fn test_escape_special_chars() {
        let mut point = MetricPoint::new(
            "my measurement",
            tags(&[("tag key", "tag,value")]),
            3_000_000_000,
        );
        point.add_field("field=key", FieldValue::Integer(1));

        assert_eq!(
            point.to_line_protocol(),
            "my\\ measurement,tag\\ key=tag\\,value field\\=key=1i 3000000000"
        );
    }

    #[test]
    fn test_empty_tag_values_are_skipped() {
        let mut point = MetricPoint::new(
            "request",
            tags(&[("origin_url", ""), ("country", "SE")]),
            9,
        );
        point.add_field("value", FieldValue::Integer(1));

        assert_eq!(point.to_line_protocol(), "request,country=SE value=1i 9");
    }

    #[test]
    fn test_call_measurement_is_not_escaped_away() {
        let mut point = MetricPoint::new("call:eth_getBalance", tags(&[]), 5);
        point.add_field("value", FieldValue::Integer(1));

        assert_eq!(
            point.to_line_protocol(),
            "call:eth_getBalance value=1i 5"
        );
    }

    #[test]
    #[should_panic(expected = "at least one field")]
    fn test_point_without_fields_panics() {
        let point = MetricPoint::new("m", tags(&[]), 1);
        let _ = point.to_line_protocol();
    }

    #[test]
    fn test_unix_timestamp_ns_is_plausible() {
        let ts = unix_timestamp_ns();
        // 2020-01-01 in nanoseconds; anything earlier means a broken clock
        assert!(ts > 1_577_836_800_000_000_000);
    }
}
