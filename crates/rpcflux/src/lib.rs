// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rpcflux core: JSON-RPC traffic observation for InfluxDB.
//!
//! This crate turns observed JSON-RPC requests into InfluxDB v2 points and
//! delivers them through a buffered asynchronous writer:
//!
//! ```text
//! request headers+body --> RequestRecorder --> PointWriter --> InfluxClient
//!                                                  |
//!                                                  +--> FailureStream --> drain_failures
//! ```
//!
//! - One `request` point per inbound request, always, even when the body
//!   does not decode.
//! - One `call:<method>` point per JSON-RPC call found in the body.
//! - Submission never blocks the request path; batches go out on flush and
//!   failed batches are reported once on the failure stream, never retried
//!   here.
//!
//! The HTTP surface lives in the `rpcflux-gateway` binary crate.

pub mod config;
pub mod influx;
pub mod jsonrpc;
pub mod point;
pub mod recorder;
pub mod writer;

pub use config::{ConfigError, InfluxConfig};
pub use influx::{InfluxClient, PointStore, StoreError};
pub use point::{FieldValue, MetricPoint};
pub use recorder::{RequestRecorder, RequestTags};
pub use writer::{FailureStream, PointWriter, WriteFailure, WriterHandle};
