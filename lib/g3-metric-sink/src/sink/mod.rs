/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ahash::AHashSet;
use async_trait::async_trait;
use log::{debug, info};

use crate::dispatch::{DispatchError, DispatchSummary, FlushContext};
use crate::route::accepts_record;
use crate::transform::{DropRules, ExcludedTagKeys};
use crate::types::{EventSample, MetricRecord};

pub mod datadog;
pub mod signalfx;

mod format;
pub use format::{Formatted, RejectReason, trim_event_message};

/// Counters of one flush call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Matched a drop rule.
    pub dropped: usize,
    /// Pinned to other sinks by route hints.
    pub skipped: usize,
    /// Not representable by the vendor.
    pub rejected: usize,
    pub dispatched: DispatchSummary,
}

/// A vendor backend, driven by the flush loop of the aggregator.
///
/// Flush calls may overlap, each one works on its own snapshot of the
/// excluded tag keys.
#[async_trait]
pub trait MetricSink: Send + Sync {
    fn name(&self) -> &str;

    /// Mark the sink started. Does no I/O and may be called more than once.
    fn start(&self);

    async fn flush(
        &self,
        ctx: &FlushContext,
        records: &[MetricRecord],
    ) -> Result<FlushStats, DispatchError>;

    /// Deliver the events and service checks collected since the last flush.
    async fn flush_other_samples(
        &self,
        ctx: &FlushContext,
        samples: &[EventSample],
    ) -> Result<FlushStats, DispatchError>;

    fn set_excluded_tags(&self, keys: &[String]);
}

pub type ArcMetricSink = Arc<dyn MetricSink>;

/// State every sink shares, whatever the vendor.
pub(crate) struct SinkCommon {
    name: String,
    started: AtomicBool,
    drop_rules: DropRules,
    excluded: ExcludedTagKeys,
    flush_timeout: Option<Duration>,
}

impl SinkCommon {
    pub(crate) fn new(name: &str, drop_rules: DropRules) -> Self {
        SinkCommon {
            name: name.to_string(),
            started: AtomicBool::new(false),
            drop_rules,
            excluded: ExcludedTagKeys::default(),
            flush_timeout: None,
        }
    }

    pub(crate) fn set_flush_timeout(&mut self, timeout: Duration) {
        self.flush_timeout = Some(timeout);
    }

    /// The caller's context, cut short by the configured flush timeout.
    pub(crate) fn flush_context(&self, ctx: &FlushContext) -> FlushContext {
        match self.flush_timeout {
            Some(timeout) => match tokio::time::Instant::now().checked_add(timeout) {
                Some(deadline) => ctx.clone().deadline_at(deadline),
                None => ctx.clone(),
            },
            None => ctx.clone(),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn start(&self) {
        if !self.started.swap(true, Ordering::AcqRel) {
            info!("sink {}: started", self.name);
        }
    }

    pub(crate) fn set_excluded_tags(&self, keys: &[String]) {
        debug!("sink {}: excluded tag keys set to {keys:?}", self.name);
        self.excluded.set(keys.iter().map(String::as_str));
    }

    pub(crate) fn excluded_snapshot(&self) -> Arc<AHashSet<String>> {
        self.excluded.snapshot()
    }

    /// Apply drop rules and route hints, in that order.
    pub(crate) fn accepted_records<'a>(
        &self,
        records: &'a [MetricRecord],
        stats: &mut FlushStats,
    ) -> Vec<&'a MetricRecord> {
        let mut accepted = Vec::with_capacity(records.len());
        for record in records {
            if self.drop_rules.should_drop(record) {
                stats.dropped += 1;
                continue;
            }
            if !accepts_record(record, &self.name) {
                stats.skipped += 1;
                continue;
            }
            accepted.push(record);
        }
        if stats.dropped > 0 || stats.skipped > 0 {
            debug!(
                "sink {}: {} records dropped, {} pinned to other sinks",
                self.name, stats.dropped, stats.skipped
            );
        }
        accepted
    }
}
