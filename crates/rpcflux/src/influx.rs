// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB v2 write client.
//!
//! Speaks the v2 HTTP write API: `POST /api/v2/write?org=..&bucket=..`
//! with a newline-separated Line Protocol body and token authentication.
//! Retry is not this layer's job; a failed write is reported once to the
//! caller and the batch is gone.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::InfluxConfig;
use crate::point::MetricPoint;

/// Write-path errors surfaced by a point store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never completed (connect, TLS, timeout, ...).
    #[error("influx transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("influx write rejected ({status}): {body}")]
    Rejected {
        status: StatusCode,
        body: String,
    },
}

/// Destination for flushed point batches.
///
/// The buffered writer flushes through this seam; tests swap in a mock
/// store, production wires up [`InfluxClient`].
#[async_trait]
pub trait PointStore: Send + Sync + 'static {
    /// Transmit one batch. All-or-nothing per batch: an error means the
    /// whole batch was not accepted.
    async fn write_batch(&self, points: &[MetricPoint]) -> Result<(), StoreError>;
}

/// InfluxDB v2 HTTP client.
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    write_url: String,
    org: String,
    bucket: String,
    auth_header: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            write_url: format!("{}/api/v2/write", config.url.trim_end_matches('/')),
            org: config.org.clone(),
            bucket: config.bucket.clone(),
            auth_header: format!("Token {}", config.token),
        }
    }

    /// The write endpoint this client posts to, without query parameters.
    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    /// Join a batch into one Line Protocol request body.
    fn encode_batch(points: &[MetricPoint]) -> String {
        let lines: Vec<String> = points.iter().map(MetricPoint::to_line_protocol).collect();
        lines.join("\n")
    }
}

#[async_trait]
impl PointStore for InfluxClient {
    async fn write_batch(&self, points: &[MetricPoint]) -> Result<(), StoreError> {
        let response = self
            .http
            .post(&self.write_url)
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Self::encode_batch(points))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }

        Ok(())
    }
}
