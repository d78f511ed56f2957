/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use ahash::AHashSet;

use crate::types::{Dimensions, ParsedTag, TagCategory};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformedTags {
    pub dimensions: Dimensions,
    /// Configured hostname, or the value of a `host` magic tag.
    pub hostname: String,
    pub device: Option<String>,
}

/// Turns canonical tags into the dimension set of one outgoing record.
#[derive(Clone, Debug)]
pub struct TagTransform {
    common: Dimensions,
    hostname_key: Option<String>,
    hostname: String,
}

impl TagTransform {
    pub fn new(common: Dimensions, hostname_key: Option<String>, hostname: String) -> Self {
        TagTransform {
            common,
            hostname_key,
            hostname,
        }
    }

    pub fn common_dimensions(&self) -> &Dimensions {
        &self.common
    }

    pub fn hostname_key(&self) -> Option<&str> {
        self.hostname_key.as_deref()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn transform<'a, I>(&self, tags: I, excluded: &AHashSet<String>) -> TransformedTags
    where
        I: IntoIterator<Item = ParsedTag<'a>>,
    {
        let mut dimensions = self.common.clone();
        if let Some(key) = &self.hostname_key {
            dimensions.insert(key, &self.hostname);
        }

        let mut hostname: Option<&str> = None;
        let mut device: Option<&str> = None;
        for tag in tags {
            match tag.category {
                TagCategory::Plain => dimensions.insert(tag.key, tag.value),
                TagCategory::MagicHost => hostname = Some(tag.value),
                TagCategory::MagicDevice => device = Some(tag.value),
                TagCategory::EventMarker | TagCategory::RouteHint => {}
            }
        }

        if let Some(host) = hostname
            && let Some(key) = &self.hostname_key
        {
            dimensions.insert(key, host);
        }

        for key in excluded {
            dimensions.remove(key);
        }

        TransformedTags {
            dimensions,
            hostname: hostname.unwrap_or(&self.hostname).to_string(),
            device: device.map(|d| d.to_string()),
        }
    }
}
