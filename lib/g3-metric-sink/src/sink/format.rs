/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use crate::types::MetricType;

const EVENT_MESSAGE_OPEN: &str = "%%% \n ";
const EVENT_MESSAGE_CLOSE: &str = " \n %%%";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedMetricType(MetricType),
    ServiceCheck,
    NotAnEvent,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnsupportedMetricType(t) => write!(f, "unsupported metric type {t}"),
            RejectReason::ServiceCheck => f.write_str("service checks are not supported"),
            RejectReason::NotAnEvent => f.write_str("not an event"),
        }
    }
}

/// Per record outcome of a vendor formatter.
#[derive(Clone, Debug, PartialEq)]
pub enum Formatted<T> {
    Accepted(T),
    Rejected(RejectReason),
}

impl<T> Formatted<T> {
    pub fn accepted(self) -> Option<T> {
        match self {
            Formatted::Accepted(v) => Some(v),
            Formatted::Rejected(_) => None,
        }
    }
}

/// Strip the markdown wrapper dogstatsd puts around event text.
pub fn trim_event_message(message: &str) -> &str {
    let message = message.strip_prefix(EVENT_MESSAGE_OPEN).unwrap_or(message);
    message.strip_suffix(EVENT_MESSAGE_CLOSE).unwrap_or(message)
}
