/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use ahash::AHashSet;

mod tag;
pub use tag::{
    EVENT_MARKER_TAG_KEY, MAGIC_DEVICE_TAG_KEY, MAGIC_HOST_TAG_KEY, ParsedTag,
    SINK_ONLY_TAG_KEY, TagCategory,
};

mod dimension;
pub use dimension::Dimensions;

mod sample;
pub use sample::{EventSample, SampleKind, SampleStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Status,
    /// Distribution that was not reduced to a single value by the aggregator.
    Histogram,
    Set,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Status => "status",
            MetricType::Histogram => "histogram",
            MetricType::Set => "set",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the sinks a record is pinned to. Empty means no restriction.
pub type RouteHints = AHashSet<String>;

/// Canonical, already aggregated metric record.
#[derive(Clone, Debug)]
pub struct MetricRecord {
    pub name: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub value: f64,
    pub r#type: MetricType,
    /// `key:value` pairs or bare flags, in producer order.
    pub tags: Vec<String>,
    pub sinks: RouteHints,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>, timestamp: i64, value: f64, r#type: MetricType) -> Self {
        MetricRecord {
            name: name.into(),
            timestamp,
            value,
            r#type,
            tags: Vec::new(),
            sinks: RouteHints::default(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sinks.insert(sink.into());
        self
    }

    pub fn parsed_tags(&self) -> impl Iterator<Item = ParsedTag<'_>> {
        self.tags.iter().map(|t| ParsedTag::parse(t))
    }
}
