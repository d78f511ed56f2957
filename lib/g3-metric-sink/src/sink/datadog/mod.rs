/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};

use super::{FlushStats, Formatted, MetricSink, SinkCommon};
use crate::client::ArcDestinationClient;
use crate::dispatch::{
    BatchDispatcher, BatchStrategy, DispatchError, DispatchGroup, FlushContext,
};
use crate::route::FALLBACK_DESTINATION;
use crate::transform::{DropRules, TagTransform};
use crate::types::{Dimensions, EventSample, MetricRecord};

mod client;
pub use client::DatadogHttpClient;

mod format;
pub use format::{DatadogEvent, DatadogMetric, DatadogSample, DatadogServiceCheck};

pub const DATADOG_SINK_NAME: &str = "datadog";

pub type ArcDatadogClient = ArcDestinationClient<DatadogMetric, DatadogSample>;

/// Rate based backend. Counters are divided by the flush interval.
pub struct DatadogSink {
    common: SinkCommon,
    transform: TagTransform,
    common_tags: Vec<String>,
    interval: Duration,
    client: ArcDatadogClient,
    metric_dispatcher: BatchDispatcher,
    sample_dispatcher: BatchDispatcher,
}

impl DatadogSink {
    pub fn new(
        name: &str,
        hostname: String,
        common_tags: Vec<String>,
        interval: Duration,
        flush_max_per_body: NonZeroUsize,
        drop_rules: DropRules,
        client: ArcDatadogClient,
    ) -> Self {
        DatadogSink {
            common: SinkCommon::new(name, drop_rules),
            // host and device travel in their own fields, not as tags
            transform: TagTransform::new(Dimensions::default(), None, hostname),
            common_tags,
            interval,
            client,
            metric_dispatcher: BatchDispatcher::new(
                name,
                BatchStrategy::WorkerCount(flush_max_per_body),
            ),
            sample_dispatcher: BatchDispatcher::new(name, BatchStrategy::Unbounded),
        }
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.common.set_flush_timeout(timeout);
        self
    }

    fn single_group<T>(&self, records: Vec<T>) -> Vec<DispatchGroup<ArcDatadogClient, T>> {
        vec![DispatchGroup {
            destination: FALLBACK_DESTINATION.to_string(),
            client: self.client.clone(),
            records,
        }]
    }
}

#[async_trait]
impl MetricSink for DatadogSink {
    fn name(&self) -> &str {
        self.common.name()
    }

    fn start(&self) {
        self.common.start();
    }

    async fn flush(
        &self,
        ctx: &FlushContext,
        records: &[MetricRecord],
    ) -> Result<FlushStats, DispatchError> {
        let ctx = &self.common.flush_context(ctx);
        let mut stats = FlushStats::default();
        let excluded = self.common.excluded_snapshot();

        let mut metrics = Vec::with_capacity(records.len());
        for record in self.common.accepted_records(records, &mut stats) {
            let tags = self.transform.transform(record.parsed_tags(), &excluded);
            match format::format_metric(record, tags, &self.common_tags, self.interval) {
                Formatted::Accepted(m) => metrics.push(m),
                Formatted::Rejected(reason) => {
                    debug!("sink {}: skip metric {}: {reason}", self.name(), record.name);
                    stats.rejected += 1;
                }
            }
        }

        stats.dispatched = self
            .metric_dispatcher
            .dispatch(ctx, self.single_group(metrics), |client, ctx, metrics| async move {
                client.submit_metrics(&ctx, &metrics).await
            })
            .await?;
        info!(
            "sink {}: flushed {} metrics in {} bodies",
            self.name(),
            stats.dispatched.records,
            stats.dispatched.submissions
        );
        Ok(stats)
    }

    async fn flush_other_samples(
        &self,
        ctx: &FlushContext,
        samples: &[EventSample],
    ) -> Result<FlushStats, DispatchError> {
        let ctx = &self.common.flush_context(ctx);
        let mut stats = FlushStats::default();
        let excluded = self.common.excluded_snapshot();

        let mut formatted = Vec::with_capacity(samples.len());
        for sample in samples {
            let tags = self.transform.transform(sample.parsed_tags(), &excluded);
            match format::format_sample(sample, tags, &self.common_tags) {
                Formatted::Accepted(s) => formatted.push(s),
                Formatted::Rejected(reason) => {
                    debug!("sink {}: skip sample {}: {reason}", self.name(), sample.name);
                    stats.rejected += 1;
                }
            }
        }

        stats.dispatched = self
            .sample_dispatcher
            .dispatch(ctx, self.single_group(formatted), |client, ctx, samples| async move {
                client.submit_events(&ctx, &samples).await
            })
            .await?;
        if stats.dispatched.records > 0 {
            info!(
                "sink {}: flushed {} events and service checks",
                self.name(),
                stats.dispatched.records
            );
        }
        Ok(stats)
    }

    fn set_excluded_tags(&self, keys: &[String]) {
        self.common.set_excluded_tags(keys);
    }
}
