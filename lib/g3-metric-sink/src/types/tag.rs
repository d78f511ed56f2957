/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub const MAGIC_HOST_TAG_KEY: &str = "host";
pub const MAGIC_DEVICE_TAG_KEY: &str = "device";
/// Present (with an empty value) on samples that are events rather than metrics.
pub const EVENT_MARKER_TAG_KEY: &str = "dogstatsd_event";
/// `veneursinkonly:<sink name>` pins a record to the named sink.
pub const SINK_ONLY_TAG_KEY: &str = "veneursinkonly";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagCategory {
    Plain,
    MagicHost,
    MagicDevice,
    EventMarker,
    RouteHint,
}

impl TagCategory {
    fn of_key(key: &str) -> Self {
        match key {
            MAGIC_HOST_TAG_KEY => TagCategory::MagicHost,
            MAGIC_DEVICE_TAG_KEY => TagCategory::MagicDevice,
            EVENT_MARKER_TAG_KEY => TagCategory::EventMarker,
            SINK_ONLY_TAG_KEY => TagCategory::RouteHint,
            _ => TagCategory::Plain,
        }
    }

    #[inline]
    pub fn is_plain(&self) -> bool {
        matches!(self, TagCategory::Plain)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedTag<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub category: TagCategory,
}

impl<'a> ParsedTag<'a> {
    pub fn new(key: &'a str, value: &'a str) -> Self {
        ParsedTag {
            key,
            value,
            category: TagCategory::of_key(key),
        }
    }

    /// Split on the first `:`, a tag without one is a flag with an empty value.
    pub fn parse(raw: &'a str) -> Self {
        match memchr::memchr(b':', raw.as_bytes()) {
            Some(p) => ParsedTag::new(&raw[..p], &raw[p + 1..]),
            None => ParsedTag::new(raw, ""),
        }
    }
}
