// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON-RPC request body decoding.
//!
//! The gateway does not serve JSON-RPC; it only needs to know which calls a
//! body carries. A body is either a single call object or a batch (top-level
//! array of call objects). Only the method name is extracted per call.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// One JSON-RPC call found in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    /// The call's method name.
    pub method: String,
}

/// Outcome of decoding a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBody {
    /// Calls found in the body, in order of appearance.
    pub calls: Vec<RpcCall>,
    /// True iff the top-level JSON value was an array.
    pub is_batch: bool,
}

/// The body was not valid JSON at all.
///
/// Distinct from a valid body that happens to contain zero calls.
#[derive(Debug, Error)]
#[error("body is not valid JSON: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// The subset of a JSON-RPC message the gateway cares about.
#[derive(Debug, Deserialize)]
struct RawCall {
    method: String,
}

/// Decode a raw request body into its JSON-RPC calls.
///
/// A top-level array is a batch; every element that is an object with a
/// string `method` yields one [`RpcCall`]. Malformed batch elements are
/// skipped, never duplicated and never fatal for the rest of the batch. A
/// top-level non-array value yields at most one call, and zero when it is
/// not a well-formed call object.
pub fn parse_body(body: &[u8]) -> Result<ParsedBody, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;

    match value {
        serde_json::Value::Array(entries) => {
            let total = entries.len();
            let calls: Vec<RpcCall> = entries.into_iter().filter_map(call_from_value).collect();
            if calls.len() < total {
                debug!(
                    skipped = total - calls.len(),
                    "batch contained malformed call entries"
                );
            }
            Ok(ParsedBody {
                calls,
                is_batch: true,
            })
        }
        single => Ok(ParsedBody {
            calls: call_from_value(single).into_iter().collect(),
            is_batch: false,
        }),
    }
}

fn call_from_value(value: serde_json::Value) -> Option<RpcCall> {
    let raw: RawCall = serde_json::from_value(value).ok()?;
    Some(RpcCall { method: raw.method })
}
