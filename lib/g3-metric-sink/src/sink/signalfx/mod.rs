/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use ahash::AHashMap;
use async_trait::async_trait;
use log::{debug, info};

use super::{FlushStats, Formatted, MetricSink, SinkCommon};
use crate::client::ArcDestinationClient;
use crate::dispatch::{
    BatchDispatcher, BatchStrategy, DispatchError, DispatchGroup, FlushContext,
};
use crate::route::{Destination, RouteSelector};
use crate::transform::{DropRules, TagTransform};
use crate::types::{EventSample, MetricRecord};

mod client;
pub use client::SignalfxHttpClient;

mod format;
pub use format::{
    Datapoint, DatapointKind, DatapointValue, SignalfxEvent, SignalfxEventProperties,
};

pub const SIGNALFX_SINK_NAME: &str = "signalfx";

pub type ArcSignalfxClient = ArcDestinationClient<Datapoint, SignalfxEvent>;

/// Native counter backend. Records are routed to per-tag-value clients.
pub struct SignalfxSink {
    common: SinkCommon,
    transform: TagTransform,
    routes: RouteSelector<ArcSignalfxClient>,
    dispatcher: BatchDispatcher,
}

impl SignalfxSink {
    /// `max_points_in_batch` of 0 sends all points of a destination at once.
    pub fn new(
        name: &str,
        transform: TagTransform,
        drop_rules: DropRules,
        routes: RouteSelector<ArcSignalfxClient>,
        max_points_in_batch: usize,
    ) -> Self {
        SignalfxSink {
            common: SinkCommon::new(name, drop_rules),
            transform,
            routes,
            dispatcher: BatchDispatcher::new(name, BatchStrategy::fixed_count(max_points_in_batch)),
        }
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.common.set_flush_timeout(timeout);
        self
    }

    fn into_groups<T>(
        &self,
        grouped: AHashMap<Destination<'_>, Vec<T>>,
    ) -> Vec<DispatchGroup<ArcSignalfxClient, T>> {
        grouped
            .into_iter()
            .map(|(destination, records)| DispatchGroup {
                destination: destination.to_string(),
                client: self.routes.client(destination).clone(),
                records,
            })
            .collect()
    }
}

#[async_trait]
impl MetricSink for SignalfxSink {
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

        let mut grouped: AHashMap<Destination<'_>, Vec<Datapoint>> = AHashMap::new();
        for record in self.common.accepted_records(records, &mut stats) {
            let destination = self.routes.select(record.parsed_tags());
            let tags = self.transform.transform(record.parsed_tags(), &excluded);
            match format::format_metric(record, tags.dimensions) {
                Formatted::Accepted(point) => grouped.entry(destination).or_default().push(point),
                Formatted::Rejected(reason) => {
                    debug!("sink {}: skip metric {}: {reason}", self.name(), record.name);
                    stats.rejected += 1;
                }
            }
        }

        stats.dispatched = self
            .dispatcher
            .dispatch(ctx, self.into_groups(grouped), |client, ctx, points| async move {
                client.submit_metrics(&ctx, &points).await
            })
            .await?;
        info!(
            "sink {}: flushed {} points in {} submissions",
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

        let mut grouped: AHashMap<Destination<'_>, Vec<SignalfxEvent>> = AHashMap::new();
        for sample in samples {
            let destination = self.routes.select(sample.parsed_tags());
            let tags = self.transform.transform(sample.parsed_tags(), &excluded);
            match format::format_event(sample, tags.dimensions) {
                Formatted::Accepted(event) => grouped.entry(destination).or_default().push(event),
                Formatted::Rejected(reason) => {
                    debug!("sink {}: skip sample {}: {reason}", self.name(), sample.name);
                    stats.rejected += 1;
                }
            }
        }

        stats.dispatched = self
            .dispatcher
            .dispatch(ctx, self.into_groups(grouped), |client, ctx, events| async move {
                client.submit_events(&ctx, &events).await
            })
            .await?;
        if stats.dispatched.records > 0 {
            info!(
                "sink {}: flushed {} events",
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::client::{DestinationClient, MemoryClient};
    use crate::dispatch::ContextError;
    use crate::types::{Dimensions, MetricType, SampleStatus};

    type Memory = MemoryClient<Datapoint, SignalfxEvent>;

    struct HangingClient;

    #[async_trait]
    impl DestinationClient for HangingClient {
        type Metric = Datapoint;
        type Event = SignalfxEvent;

        async fn submit_metrics(
            &self,
            _ctx: &FlushContext,
            _m: &[Datapoint],
        ) -> anyhow::Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn submit_events(
            &self,
            _ctx: &FlushContext,
            _e: &[SignalfxEvent],
        ) -> anyhow::Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn transform(common: &[(&str, &str)]) -> TagTransform {
        let common: Dimensions = common.iter().copied().collect();
        TagTransform::new(common, Some("host".to_string()), "glooblestoots".to_string())
    }

    fn sink_with(
        client: ArcSignalfxClient,
        drop_rules: DropRules,
        max_points_in_batch: usize,
    ) -> SignalfxSink {
        SignalfxSink::new(
            SIGNALFX_SINK_NAME,
            transform(&[("yay", "pie")]),
            drop_rules,
            RouteSelector::single(client),
            max_points_in_batch,
        )
    }

    fn memory_sink() -> (SignalfxSink, Arc<Memory>) {
        let memory = Arc::new(Memory::default());
        let sink = sink_with(memory.clone(), DropRules::default(), 0);
        (sink, memory)
    }

    #[tokio::test]
    async fn flush_routing() {
        let (sink, memory) = memory_sink();
        let records = vec![
            MetricRecord::new("any", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz"]),
            MetricRecord::new("sfx", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz", "veneursinkonly:signalfx"])
                .with_sink("signalfx"),
            MetricRecord::new("not_our_thing", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz"])
                .with_sink("anyone_else"),
        ];
        let stats = sink.flush(&FlushContext::new(), &records).await.unwrap();
        assert_eq!(stats.skipped, 1);

        let points = memory.metrics();
        assert_eq!(points.len(), 2);
        let mut names: Vec<_> = points.iter().map(|p| p.metric.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["any", "sfx"]);
        for p in &points {
            assert!(!p.dimensions.contains_key("veneursinkonly"));
        }
    }

    #[tokio::test]
    async fn flush_gauge() {
        let (sink, memory) = memory_sink();
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz"]),
        ];
        sink.flush(&FlushContext::new(), &records).await.unwrap();

        let points = memory.metrics();
        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.metric, "a.b.c");
        assert_eq!(p.kind, DatapointKind::Gauge);
        assert_eq!(p.value, DatapointValue::Float(100.0));
        assert_eq!(p.timestamp, 1476119058000);
        assert_eq!(p.dimensions.len(), 4);
        assert_eq!(p.dimensions.get("foo"), Some("bar"));
        assert_eq!(p.dimensions.get("baz"), Some("quz"));
        assert_eq!(p.dimensions.get("yay"), Some("pie"));
        assert_eq!(p.dimensions.get("host"), Some("glooblestoots"));
    }

    #[tokio::test]
    async fn flush_counter() {
        let (sink, memory) = memory_sink();
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 10.0, MetricType::Counter)
                .with_tags(["foo:bar", "baz:quz", "novalue"]),
        ];
        sink.flush(&FlushContext::new(), &records).await.unwrap();

        let points = memory.metrics();
        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.kind, DatapointKind::Counter);
        assert_eq!(p.value, DatapointValue::Int(10));
        assert_eq!(p.dimensions.len(), 5);
        assert_eq!(p.dimensions.get("novalue"), Some(""));
        assert_eq!(p.dimensions.get("host"), Some("glooblestoots"));
    }

    #[tokio::test]
    async fn flush_with_drops() {
        let memory = Arc::new(Memory::default());
        let sink = sink_with(
            memory.clone(),
            DropRules::new(vec!["foo.bar".to_string()], vec!["baz:gorch".to_string()]),
            0,
        );
        let records = vec![
            MetricRecord::new("foo.bar.baz", 1476119058, 10.0, MetricType::Counter)
                .with_tags(["foo:bar", "baz:quz"]),
            MetricRecord::new("fart.farts", 1476119058, 10.0, MetricType::Counter)
                .with_tags(["foo:bar", "baz:quz"]),
            MetricRecord::new("fart.farts2", 1476119058, 10.0, MetricType::Counter)
                .with_tags(["foo:bar", "baz:gorch"]),
        ];
        let stats = sink.flush(&FlushContext::new(), &records).await.unwrap();
        assert_eq!(stats.dropped, 2);

        let points = memory.metrics();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].metric, "fart.farts");
    }

    #[tokio::test]
    async fn flush_status() {
        let (sink, memory) = memory_sink();
        let status = SampleStatus::Unknown.code() as f64;
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, status, MetricType::Status)
                .with_tags(["foo:bar", "baz:quz", "novalue"]),
        ];
        sink.flush(&FlushContext::new(), &records).await.unwrap();

        let points = memory.metrics();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].kind, DatapointKind::Gauge);
        assert_eq!(points[0].value, DatapointValue::Int(3));
        assert_eq!(points[0].dimensions.len(), 5);
    }

    #[tokio::test]
    async fn flush_rejects_unreduced() {
        let (sink, memory) = memory_sink();
        let records = vec![
            MetricRecord::new("h", 1, 1.0, MetricType::Histogram),
            MetricRecord::new("s", 1, 1.0, MetricType::Set),
            MetricRecord::new("g", 1, 1.0, MetricType::Gauge),
        ];
        let stats = sink.flush(&FlushContext::new(), &records).await.unwrap();
        assert_eq!(stats.rejected, 2);
        assert_eq!(memory.metrics().len(), 1);
    }

    #[tokio::test]
    async fn service_check_discarded() {
        let (sink, memory) = memory_sink();
        let samples = vec![
            EventSample::new("Farts farts farts", "", 1476119058)
                .with_tag("foo", "bar")
                .with_tag("baz", "gorch")
                .with_tag("novalue", "")
                .with_status(SampleStatus::Ok),
        ];
        let stats = sink
            .flush_other_samples(&FlushContext::new(), &samples)
            .await
            .unwrap();
        assert_eq!(stats.rejected, 1);
        assert!(memory.events().is_empty());
        assert_eq!(memory.event_submissions(), 0);
    }

    #[tokio::test]
    async fn event_flush() {
        let (sink, memory) = memory_sink();
        let samples = vec![
            EventSample::new("Farts farts farts", "%%% \n This is a farts event \n %%%", 1476119058)
                .with_tag("foo", "bar")
                .with_tag("baz", "gorch")
                .with_tag("novalue", "")
                .event_marker(),
        ];
        sink.flush_other_samples(&FlushContext::new(), &samples)
            .await
            .unwrap();

        let events = memory.events();
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.event_type, "Farts farts farts");
        assert_eq!(ev.properties.description, "This is a farts event");
        assert_eq!(ev.timestamp, 1476119058000);
        assert_eq!(ev.dimensions.len(), 5);
        assert_eq!(ev.dimensions.get("foo"), Some("bar"));
        assert_eq!(ev.dimensions.get("baz"), Some("gorch"));
        assert_eq!(ev.dimensions.get("yay"), Some("pie"));
        assert_eq!(ev.dimensions.get("novalue"), Some(""));
        assert_eq!(ev.dimensions.get("host"), Some("glooblestoots"));
    }

    #[tokio::test]
    async fn excluded_tags() {
        let memory = Arc::new(Memory::default());
        let sink = SignalfxSink::new(
            SIGNALFX_SINK_NAME,
            transform(&[("yay", "pie"), ("boo", "snakes")]),
            DropRules::default(),
            RouteSelector::single(memory.clone() as ArcSignalfxClient),
            0,
        );
        sink.set_excluded_tags(&["foo".to_string(), "boo".to_string(), "host".to_string()]);

        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 10.0, MetricType::Counter)
                .with_tags(["foo:bar", "baz:quz", "novalue"]),
        ];
        let samples = vec![
            EventSample::new("Farts farts farts", "", 1476119058)
                .with_tag("foo", "bar")
                .with_tag("baz", "gorch")
                .with_tag("novalue", "")
                .event_marker(),
        ];
        let ctx = FlushContext::new();
        sink.flush(&ctx, &records).await.unwrap();
        sink.flush_other_samples(&ctx, &samples).await.unwrap();

        let points = memory.metrics();
        assert_eq!(points.len(), 1);
        let dims = &points[0].dimensions;
        assert_eq!(dims.len(), 3);
        assert!(!dims.contains_key("foo"));
        assert!(!dims.contains_key("boo"));
        assert!(!dims.contains_key("host"));
        assert_eq!(dims.get("baz"), Some("quz"));

        let events = memory.events();
        assert_eq!(events.len(), 1);
        let dims = &events[0].dimensions;
        assert_eq!(dims.len(), 3);
        assert!(!dims.contains_key("foo"));
        assert_eq!(dims.get("baz"), Some("gorch"));
        assert_eq!(dims.get("yay"), Some("pie"));
    }

    #[tokio::test]
    async fn multi_key_routing() {
        let fallback = Arc::new(Memory::default());
        let specialized = Arc::new(Memory::default());
        let mut routes: AHashMap<String, ArcSignalfxClient> = AHashMap::new();
        routes.insert("available".to_string(), specialized.clone());
        let sink = SignalfxSink::new(
            SIGNALFX_SINK_NAME,
            transform(&[("yay", "pie")]),
            DropRules::default(),
            RouteSelector::new(
                fallback.clone() as ArcSignalfxClient,
                Some("test_by".to_string()),
                routes,
            ),
            0,
        );

        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz", "test_by:available"]),
            MetricRecord::new("a.b.c", 1476119058, 99.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz", "test_by:needs_fallback"]),
        ];
        sink.flush(&FlushContext::new(), &records).await.unwrap();

        let f = fallback.metrics();
        let s = specialized.metrics();
        assert_eq!(f.len(), 1);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].value, DatapointValue::Float(100.0));
        assert_eq!(f[0].value, DatapointValue::Float(99.0));
        for p in [&f[0], &s[0]] {
            assert_eq!(p.metric, "a.b.c");
            assert_eq!(p.dimensions.len(), 5);
            assert_eq!(p.dimensions.get("host"), Some("glooblestoots"));
        }
    }

    #[tokio::test]
    async fn event_routing() {
        let fallback = Arc::new(Memory::default());
        let specialized = Arc::new(Memory::default());
        let mut routes: AHashMap<String, ArcSignalfxClient> = AHashMap::new();
        routes.insert("available".to_string(), specialized.clone());
        let sink = SignalfxSink::new(
            SIGNALFX_SINK_NAME,
            transform(&[]),
            DropRules::default(),
            RouteSelector::new(
                fallback.clone() as ArcSignalfxClient,
                Some("test_by".to_string()),
                routes,
            ),
            0,
        );

        let samples = vec![
            EventSample::new("a", "", 1).with_tag("test_by", "available").event_marker(),
            EventSample::new("b", "", 1).event_marker(),
        ];
        sink.flush_other_samples(&FlushContext::new(), &samples)
            .await
            .unwrap();
        assert_eq!(specialized.events()[0].event_type, "a");
        assert_eq!(fallback.events()[0].event_type, "b");
    }

    #[tokio::test]
    async fn route_key_excluded() {
        let fallback = Arc::new(Memory::default());
        let specialized = Arc::new(Memory::default());
        let mut routes: AHashMap<String, ArcSignalfxClient> = AHashMap::new();
        routes.insert("available".to_string(), specialized.clone());
        let sink = SignalfxSink::new(
            SIGNALFX_SINK_NAME,
            transform(&[]),
            DropRules::default(),
            RouteSelector::new(
                fallback.clone() as ArcSignalfxClient,
                Some("test_by".to_string()),
                routes,
            ),
            0,
        );
        sink.set_excluded_tags(&["test_by".to_string()]);

        let ctx = FlushContext::new();
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 1.0, MetricType::Gauge)
                .with_tags(["test_by:available"]),
        ];
        sink.flush(&ctx, &records).await.unwrap();
        let samples = vec![
            EventSample::new("deploy", "", 1476119058)
                .with_tag("test_by", "available")
                .event_marker(),
        ];
        sink.flush_other_samples(&ctx, &samples).await.unwrap();

        assert!(fallback.metrics().is_empty());
        assert!(fallback.events().is_empty());
        assert_eq!(specialized.metrics().len(), 1);
        let events = specialized.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].dimensions.contains_key("test_by"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_point_per_batch() {
        let memory = Arc::new(Memory::default());
        let sink = sink_with(memory.clone(), DropRules::default(), 1);
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 100.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz"]),
            MetricRecord::new("a.b.c", 1476119058, 99.0, MetricType::Gauge)
                .with_tags(["foo:bar", "baz:quz"]),
        ];
        let stats = sink.flush(&FlushContext::new(), &records).await.unwrap();
        assert_eq!(stats.dispatched.submissions, 2);
        assert_eq!(memory.metric_submissions(), 2);
        assert_eq!(memory.metrics().len(), 2);
    }

    #[tokio::test]
    async fn batch_hang() {
        let sink = sink_with(Arc::new(HangingClient), DropRules::default(), 1);
        let records = vec![
            MetricRecord::new("a.b.c", 1476119058, 100.0, MetricType::Gauge),
            MetricRecord::new("a.b.c", 1476119058, 99.0, MetricType::Gauge),
        ];
        let ctx = FlushContext::with_timeout(Duration::from_millis(1));
        let r = tokio::time::timeout(Duration::from_secs(5), sink.flush(&ctx, &records))
            .await
            .unwrap();
        assert!(matches!(
            r,
            Err(DispatchError::Interrupted(ContextError::DeadlineExceeded))
        ));
    }

    #[tokio::test]
    async fn canceled_before_flush() {
        let (sink, memory) = memory_sink();
        let ctx = FlushContext::new();
        ctx.cancel();
        let records = vec![MetricRecord::new("a", 1, 1.0, MetricType::Gauge)];
        let r = sink.flush(&ctx, &records).await;
        assert!(matches!(
            r,
            Err(DispatchError::Interrupted(ContextError::Canceled))
        ));
        assert!(memory.metrics().is_empty());
    }

    #[tokio::test]
    async fn canceled_nothing_to_send() {
        let memory = Arc::new(Memory::default());
        let sink = sink_with(
            memory.clone(),
            DropRules::new(vec!["drop.".to_string()], Vec::new()),
            0,
        );
        let ctx = FlushContext::new();
        ctx.cancel();

        let stats = sink.flush(&ctx, &[]).await.unwrap();
        assert_eq!(stats, FlushStats::default());

        let records = vec![MetricRecord::new("drop.me", 1, 1.0, MetricType::Gauge)];
        let stats = sink.flush(&ctx, &records).await.unwrap();
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.dispatched.submissions, 0);

        let samples = vec![EventSample::new("check", "", 1).with_status(SampleStatus::Ok)];
        let stats = sink.flush_other_samples(&ctx, &samples).await.unwrap();
        assert_eq!(stats.rejected, 1);
        assert_eq!(memory.metric_submissions(), 0);
        assert_eq!(memory.event_submissions(), 0);
    }
}
