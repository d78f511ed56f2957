/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml as yaml_types};

use super::{CommonSinkConfig, yaml};
use crate::sink::datadog::{DATADOG_SINK_NAME, DatadogHttpClient, DatadogSink};
use crate::sink::{ArcMetricSink, MetricSink};

const DEFAULT_API_HOSTNAME: &str = "https://app.datadoghq.com";
const DEFAULT_FLUSH_MAX_PER_BODY: NonZeroUsize = NonZeroUsize::new(25000).unwrap();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatadogSinkConfig {
    pub common: CommonSinkConfig,
    pub api_hostname: String,
    pub api_key: String,
    pub tags: Vec<String>,
    pub interval: Duration,
    pub flush_max_per_body: NonZeroUsize,
}

impl Default for DatadogSinkConfig {
    fn default() -> Self {
        DatadogSinkConfig {
            common: CommonSinkConfig::new(DATADOG_SINK_NAME),
            api_hostname: DEFAULT_API_HOSTNAME.to_string(),
            api_key: String::new(),
            tags: Vec::new(),
            interval: Duration::from_secs(10),
            flush_max_per_body: DEFAULT_FLUSH_MAX_PER_BODY,
        }
    }
}

impl DatadogSinkConfig {
    pub(crate) fn parse(map: &yaml_types::Hash) -> anyhow::Result<Self> {
        let mut config = DatadogSinkConfig::default();
        yaml::foreach_setting(map, |k, v| config.set(k, v))?;
        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        if self.common.set(k, v)? {
            return Ok(());
        }
        match k {
            "api_hostname" => {
                self.api_hostname =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "api_key" => {
                self.api_key =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "tags" => {
                self.tags = yaml::as_string_list(v)
                    .context(format!("invalid string list value for key {k}"))?;
            }
            "interval" => {
                self.interval = yaml::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
            }
            "flush_max_per_body" => {
                self.flush_max_per_body = yaml::as_nonzero_count(v)
                    .context(format!("invalid nonzero count value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }

    fn check(&self) -> anyhow::Result<()> {
        self.common.check()?;
        if self.api_key.is_empty() {
            return Err(anyhow!("api key is not set"));
        }
        // the series api takes the interval in whole seconds
        if self.interval.as_secs() == 0 || self.interval.subsec_nanos() != 0 {
            return Err(anyhow!(
                "interval should be a positive number of whole seconds"
            ));
        }
        Ok(())
    }

    pub fn build(&self, client: reqwest::Client) -> anyhow::Result<ArcMetricSink> {
        let client = DatadogHttpClient::new(client, &self.api_hostname, &self.api_key)
            .context("failed to create the datadog client")?;
        let mut sink = DatadogSink::new(
            &self.common.name,
            self.common.hostname.clone(),
            self.tags.clone(),
            self.interval,
            self.flush_max_per_body,
            self.common.drop_rules(),
            Arc::new(client),
        );
        if let Some(timeout) = self.common.flush_timeout {
            sink = sink.with_flush_timeout(timeout);
        }
        sink.set_excluded_tags(&self.common.excluded_tags);
        Ok(Arc::new(sink))
    }
}
