/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod client;
pub mod config;
pub mod dispatch;
pub mod route;
pub mod sink;
pub mod transform;
pub mod types;

pub use dispatch::{ContextError, DispatchError, FlushContext};
pub use sink::{ArcMetricSink, FlushStats, MetricSink};
pub use types::{EventSample, MetricRecord, MetricType, SampleStatus};
