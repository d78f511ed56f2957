/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::yaml;
use crate::transform::DropRules;

/// Keys understood by every sink type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonSinkConfig {
    pub name: String,
    pub hostname: String,
    pub excluded_tags: Vec<String>,
    pub metric_name_prefix_drops: Vec<String>,
    pub metric_tag_literal_drops: Vec<String>,
    pub flush_timeout: Option<Duration>,
}

impl CommonSinkConfig {
    pub(super) fn new(default_name: &str) -> Self {
        CommonSinkConfig {
            name: default_name.to_string(),
            ..Default::default()
        }
    }

    /// Returns `Ok(false)` if the key is not a common one.
    pub(super) fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<bool> {
        match k {
            super::CONFIG_KEY_SINK_TYPE => {}
            super::CONFIG_KEY_SINK_NAME => {
                self.name =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "hostname" => {
                self.hostname =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "excluded_tags" => {
                self.excluded_tags = yaml::as_string_list(v)
                    .context(format!("invalid string list value for key {k}"))?;
            }
            "metric_name_prefix_drops" => {
                self.metric_name_prefix_drops = yaml::as_string_list(v)
                    .context(format!("invalid string list value for key {k}"))?;
            }
            "metric_tag_literal_drops" => {
                self.metric_tag_literal_drops = yaml::as_string_list(v)
                    .context(format!("invalid string list value for key {k}"))?;
            }
            "flush_timeout" => {
                let timeout = yaml::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.flush_timeout = Some(timeout);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn check(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            return Err(anyhow!("name is not set"));
        }
        if self.hostname.is_empty() {
            return Err(anyhow!("hostname is not set"));
        }
        if self.flush_timeout.is_some_and(|t| t.is_zero()) {
            return Err(anyhow!("flush timeout should not be zero"));
        }
        Ok(())
    }

    pub(super) fn drop_rules(&self) -> DropRules {
        DropRules::new(
            self.metric_name_prefix_drops.iter().cloned(),
            self.metric_tag_literal_drops.iter().cloned(),
        )
    }
}
