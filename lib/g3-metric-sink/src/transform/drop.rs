/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use ahash::AHashSet;

use crate::types::MetricRecord;

/// An empty name prefix drops every record.
#[derive(Clone, Debug, Default)]
pub struct DropRules {
    name_prefixes: Vec<String>,
    literal_tags: AHashSet<String>,
}

impl DropRules {
    pub fn new<P, T>(name_prefixes: P, literal_tags: T) -> Self
    where
        P: IntoIterator<Item = String>,
        T: IntoIterator<Item = String>,
    {
        DropRules {
            name_prefixes: name_prefixes.into_iter().collect(),
            literal_tags: literal_tags.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name_prefixes.is_empty() && self.literal_tags.is_empty()
    }

    pub fn should_drop(&self, record: &MetricRecord) -> bool {
        if self
            .name_prefixes
            .iter()
            .any(|p| record.name.starts_with(p.as_str()))
        {
            return true;
        }
        if self.literal_tags.is_empty() {
            return false;
        }
        record
            .tags
            .iter()
            .any(|t| self.literal_tags.contains(t.as_str()))
    }
}
