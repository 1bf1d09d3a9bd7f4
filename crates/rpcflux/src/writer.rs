// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered asynchronous point writer.
//!
//! Request handlers submit points through a cheap cloneable [`PointWriter`]
//! handle; a single spawned task owns the buffer and transmits it to the
//! store when a flush is triggered. Submitting never touches the network
//! and never blocks the request path.
//!
//! Failed batches are reported exactly once on the [`FailureStream`] and
//! are not retried. The stream is the only place write failures surface,
//! so something must drain it for the life of the process (see
//! [`drain_failures`]).

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::influx::{PointStore, StoreError};
use crate::point::MetricPoint;

/// A batch the store did not accept.
///
/// Carries every point of the failed batch so consumers can account for
/// exactly which points were lost.
#[derive(Debug)]
pub struct WriteFailure {
    pub points: Vec<MetricPoint>,
    pub error: StoreError,
}

/// Stream of write failures, one entry per failed batch.
///
/// Unbounded: reporting a failure never blocks the writer task.
pub type FailureStream = mpsc::UnboundedReceiver<WriteFailure>;

enum Command {
    Submit(MetricPoint),
    Flush,
    Shutdown,
}

/// Submit/flush handle to the writer task. Clone one per task that needs it.
#[derive(Clone)]
pub struct PointWriter {
    tx: mpsc::UnboundedSender<Command>,
}

/// Owns the writer task's lifecycle. Exactly one per writer.
pub struct WriterHandle {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PointWriter {
    /// Spawn the writer task for `store`.
    ///
    /// Returns the submit handle, the lifecycle handle, and the failure
    /// stream. The caller must keep draining the stream; nothing else
    /// surfaces write errors.
    pub fn spawn<S: PointStore>(store: S) -> (PointWriter, WriterHandle, FailureStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, rx, failure_tx));

        (
            PointWriter { tx: tx.clone() },
            WriterHandle { tx, task },
            failure_rx,
        )
    }

    /// Queue a point for the next flush. Never blocks, never fails.
    ///
    /// After shutdown the point is not accepted; that is logged rather than
    /// silently ignored.
    pub fn submit(&self, point: MetricPoint) {
        if let Err(rejected) = self.tx.send(Command::Submit(point)) {
            if let Command::Submit(point) = rejected.0 {
                debug!(
                    measurement = point.measurement(),
                    "writer is closed, point not accepted"
                );
            }
        }
    }

    /// Trigger transmission of everything currently buffered.
    ///
    /// Fire-and-forget: returns as soon as the flush is queued, without
    /// waiting for network completion.
    pub fn flush(&self) {
        let _ = self.tx.send(Command::Flush);
    }
}

impl WriterHandle {
    /// Stop the writer: drain queued commands, run a final flush, join.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Command::Shutdown);
        if self.task.await.is_err() {
            warn!("writer task panicked during shutdown");
        }
    }
}

async fn run<S: PointStore>(
    store: S,
    mut rx: mpsc::UnboundedReceiver<Command>,
    failures: mpsc::UnboundedSender<WriteFailure>,
) {
    let mut buffer: Vec<MetricPoint> = Vec::new();

    loop {
        match rx.recv().await {
            Some(Command::Submit(point)) => buffer.push(point),
            Some(Command::Flush) => transmit(&store, &mut buffer, &failures).await,
            Some(Command::Shutdown) | None => break,
        }
    }

    // Salvage submissions that raced the shutdown signal, then flush a
    // final time so nothing buffered is lost.
    rx.close();
    while let Ok(command) = rx.try_recv() {
        if let Command::Submit(point) = command {
            buffer.push(point);
        }
    }
    transmit(&store, &mut buffer, &failures).await;
}

/// Send the current buffer as one batch; report the batch on failure.
async fn transmit<S: PointStore>(
    store: &S,
    buffer: &mut Vec<MetricPoint>,
    failures: &mpsc::UnboundedSender<WriteFailure>,
) {
    if buffer.is_empty() {
        return;
    }

    let batch = std::mem::take(buffer);
    debug!(points = batch.len(), "flushing batch to store");

    if let Err(error) = store.write_batch(&batch).await {
        let _ = failures.send(WriteFailure {
            points: batch,
            error,
        });
    }
}

/// Drain a writer's failure stream, logging every failed batch.
///
/// Runs until the writer shuts down and the stream closes. Keeping up with
/// the stream is what keeps the writer's failure channel from backing up.
pub async fn drain_failures(mut failures: FailureStream) {
    while let Some(failure) = failures.recv().await {
        warn!(
            points = failure.points.len(),
            error = %failure.error,
            "influx write failed, batch dropped"
        );
    }
}
