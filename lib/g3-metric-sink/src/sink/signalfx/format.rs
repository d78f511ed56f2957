/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde::Serialize;

use crate::sink::{Formatted, RejectReason, trim_event_message};
use crate::types::{Dimensions, EventSample, MetricRecord, MetricType, SampleKind};

const EVENT_CATEGORY_USER_DEFINED: &str = "USER_DEFINED";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatapointKind {
    Gauge,
    Counter,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatapointValue {
    Int(i64),
    Float(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Datapoint {
    pub metric: String,
    pub value: DatapointValue,
    pub dimensions: Dimensions,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    #[serde(skip)]
    pub kind: DatapointKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignalfxEventProperties {
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalfxEvent {
    pub category: &'static str,
    pub event_type: String,
    pub dimensions: Dimensions,
    pub properties: SignalfxEventProperties,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
}

pub(super) fn format_metric(record: &MetricRecord, dimensions: Dimensions) -> Formatted<Datapoint> {
    let (kind, value) = match record.r#type {
        MetricType::Gauge => (DatapointKind::Gauge, DatapointValue::Float(record.value)),
        MetricType::Counter => (DatapointKind::Counter, DatapointValue::Int(record.value as i64)),
        MetricType::Status => (DatapointKind::Gauge, DatapointValue::Int(record.value as i64)),
        t @ (MetricType::Histogram | MetricType::Set) => {
            return Formatted::Rejected(RejectReason::UnsupportedMetricType(t));
        }
    };
    Formatted::Accepted(Datapoint {
        metric: record.name.clone(),
        value,
        dimensions,
        timestamp: record.timestamp.saturating_mul(1000),
        kind,
    })
}

pub(super) fn format_event(
    sample: &EventSample,
    dimensions: Dimensions,
) -> Formatted<SignalfxEvent> {
    match sample.kind() {
        SampleKind::Event => {}
        SampleKind::ServiceCheck => return Formatted::Rejected(RejectReason::ServiceCheck),
        SampleKind::Other => return Formatted::Rejected(RejectReason::NotAnEvent),
    }
    Formatted::Accepted(SignalfxEvent {
        category: EVENT_CATEGORY_USER_DEFINED,
        event_type: sample.name.clone(),
        dimensions,
        properties: SignalfxEventProperties {
            description: trim_event_message(&sample.message).to_string(),
        },
        timestamp: sample.timestamp.saturating_mul(1000),
    })
}
