/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;

use super::{EVENT_MARKER_TAG_KEY, ParsedTag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl SampleStatus {
    pub fn code(&self) -> u8 {
        match self {
            SampleStatus::Ok => 0,
            SampleStatus::Warning => 1,
            SampleStatus::Critical => 2,
            SampleStatus::Unknown => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleKind {
    Event,
    ServiceCheck,
    Other,
}

/// An event or service check sample, flushed beside the metric records.
#[derive(Clone, Debug)]
pub struct EventSample {
    pub name: String,
    pub message: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub tags: BTreeMap<String, String>,
    pub status: Option<SampleStatus>,
}

impl EventSample {
    pub fn new(name: impl Into<String>, message: impl Into<String>, timestamp: i64) -> Self {
        EventSample {
            name: name.into(),
            message: message.into(),
            timestamp,
            tags: BTreeMap::new(),
            status: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_status(mut self, status: SampleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn event_marker(self) -> Self {
        self.with_tag(EVENT_MARKER_TAG_KEY, "")
    }

    #[inline]
    pub fn is_event_marker(&self) -> bool {
        self.tags.contains_key(EVENT_MARKER_TAG_KEY)
    }

    /// The event marker wins over a status, a status alone makes a service check.
    pub fn kind(&self) -> SampleKind {
        if self.is_event_marker() {
            SampleKind::Event
        } else if self.status.is_some() {
            SampleKind::ServiceCheck
        } else {
            SampleKind::Other
        }
    }

    pub fn parsed_tags(&self) -> impl Iterator<Item = ParsedTag<'_>> {
        self.tags.iter().map(|(k, v)| ParsedTag::new(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify() {
        let s = EventSample::new("deploy", "", 0).event_marker();
        assert_eq!(s.kind(), SampleKind::Event);

        let s = EventSample::new("deploy", "", 0)
            .event_marker()
            .with_status(SampleStatus::Ok);
        assert_eq!(s.kind(), SampleKind::Event);

        let s = EventSample::new("check", "", 0).with_status(SampleStatus::Critical);
        assert_eq!(s.kind(), SampleKind::ServiceCheck);

        let s = EventSample::new("span", "", 0).with_tag("foo", "bar");
        assert_eq!(s.kind(), SampleKind::Other);
    }
}
