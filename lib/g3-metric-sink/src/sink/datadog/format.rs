/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use serde::Serialize;

use crate::sink::{Formatted, RejectReason};
use crate::transform::TransformedTags;
use crate::types::{EventSample, MetricRecord, MetricType, SampleKind};

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// One series entry of the v1 metrics api.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatadogMetric {
    pub metric: String,
    /// A single `[timestamp, value]` pair.
    pub points: [[f64; 2]; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub r#type: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device_name: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub interval: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatadogEvent {
    pub title: String,
    pub text: String,
    pub date_happened: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatadogServiceCheck {
    pub check: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    pub timestamp: i64,
    pub status: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Events and service checks go to different endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatadogSample {
    Event(DatadogEvent),
    ServiceCheck(DatadogServiceCheck),
}

pub(super) fn format_metric(
    record: &MetricRecord,
    tags: TransformedTags,
    common_tags: &[String],
    interval: Duration,
) -> Formatted<DatadogMetric> {
    // counters are sent as per second rates
    let (r#type, value) = match record.r#type {
        MetricType::Counter => ("rate", record.value / interval.as_secs_f64()),
        MetricType::Gauge | MetricType::Status => ("gauge", record.value),
        t @ (MetricType::Histogram | MetricType::Set) => {
            return Formatted::Rejected(RejectReason::UnsupportedMetricType(t));
        }
    };

    let mut all_tags = Vec::with_capacity(common_tags.len() + tags.dimensions.len());
    all_tags.extend_from_slice(common_tags);
    all_tags.extend(tags.dimensions.to_tag_strings());

    Formatted::Accepted(DatadogMetric {
        metric: record.name.clone(),
        points: [[record.timestamp as f64, value]],
        tags: all_tags,
        r#type,
        host: tags.hostname,
        device_name: tags.device.unwrap_or_default(),
        interval: i32::try_from(interval.as_secs()).unwrap_or(i32::MAX),
    })
}

pub(super) fn format_sample(
    sample: &EventSample,
    tags: TransformedTags,
    common_tags: &[String],
) -> Formatted<DatadogSample> {
    let mut all_tags = tags.dimensions.to_tag_strings();
    all_tags.extend_from_slice(common_tags);

    match sample.kind() {
        SampleKind::Event => Formatted::Accepted(DatadogSample::Event(DatadogEvent {
            title: sample.name.clone(),
            text: sample.message.clone(),
            date_happened: sample.timestamp,
            host: tags.hostname,
            tags: all_tags,
        })),
        SampleKind::ServiceCheck => {
            let status = sample.status.map(|s| s.code()).unwrap_or_default();
            Formatted::Accepted(DatadogSample::ServiceCheck(DatadogServiceCheck {
                check: sample.name.clone(),
                host_name: tags.hostname,
                timestamp: sample.timestamp,
                status,
                message: sample.message.clone(),
                tags: all_tags,
            }))
        }
        SampleKind::Other => Formatted::Rejected(RejectReason::NotAnEvent),
    }
}
