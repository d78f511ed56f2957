/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use ahash::AHashMap;
use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml as yaml_types};

use super::{CommonSinkConfig, yaml};
use crate::route::RouteSelector;
use crate::sink::signalfx::{
    ArcSignalfxClient, SIGNALFX_SINK_NAME, SignalfxHttpClient, SignalfxSink,
};
use crate::sink::{ArcMetricSink, MetricSink};
use crate::transform::TagTransform;
use crate::types::Dimensions;

const DEFAULT_API_ENDPOINT: &str = "https://ingest.signalfx.com";
const DEFAULT_HOSTNAME_TAG: &str = "host";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalfxSinkConfig {
    pub common: CommonSinkConfig,
    pub api_endpoint: String,
    pub api_key: String,
    /// Empty for no hostname dimension.
    pub hostname_tag: String,
    pub common_dimensions: Vec<(String, String)>,
    pub vary_key_by: Option<String>,
    /// Tag value to access token.
    pub per_tag_api_keys: Vec<(String, String)>,
    pub max_points_in_batch: usize,
}

impl Default for SignalfxSinkConfig {
    fn default() -> Self {
        SignalfxSinkConfig {
            common: CommonSinkConfig::new(SIGNALFX_SINK_NAME),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            hostname_tag: DEFAULT_HOSTNAME_TAG.to_string(),
            common_dimensions: Vec::new(),
            vary_key_by: None,
            per_tag_api_keys: Vec::new(),
            max_points_in_batch: 0,
        }
    }
}

impl SignalfxSinkConfig {
    pub(crate) fn parse(map: &yaml_types::Hash) -> anyhow::Result<Self> {
        let mut config = SignalfxSinkConfig::default();
        yaml::foreach_setting(map, |k, v| config.set(k, v))?;
        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        if self.common.set(k, v)? {
            return Ok(());
        }
        match k {
            "api_endpoint" => {
                self.api_endpoint =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "api_key" => {
                self.api_key =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "hostname_tag" => {
                self.hostname_tag =
                    yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
            }
            "common_dimensions" => {
                self.common_dimensions = yaml::as_string_map(v)
                    .context(format!("invalid string map value for key {k}"))?;
            }
            "vary_key_by" => {
                let key = yaml::as_string(v).context(format!("invalid string value for key {k}"))?;
                self.vary_key_by = Some(key).filter(|k| !k.is_empty());
            }
            "per_tag_api_keys" => {
                self.per_tag_api_keys = yaml::as_string_map(v)
                    .context(format!("invalid string map value for key {k}"))?;
            }
            "max_points_in_batch" => {
                self.max_points_in_batch =
                    yaml::as_count(v).context(format!("invalid count value for key {k}"))?;
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
        if self.vary_key_by.is_none() && !self.per_tag_api_keys.is_empty() {
            return Err(anyhow!("per tag api keys are set but vary_key_by is not"));
        }
        Ok(())
    }

    pub fn build(&self, client: reqwest::Client) -> anyhow::Result<ArcMetricSink> {
        let fallback: ArcSignalfxClient = Arc::new(
            SignalfxHttpClient::new(client.clone(), &self.api_endpoint, &self.api_key)
                .context("failed to create the default client")?,
        );
        let mut routes: AHashMap<String, ArcSignalfxClient> = AHashMap::new();
        for (value, api_key) in &self.per_tag_api_keys {
            let c = SignalfxHttpClient::new(client.clone(), &self.api_endpoint, api_key)
                .context(format!("failed to create client for tag value {value}"))?;
            routes.insert(value.clone(), Arc::new(c));
        }

        let common_dimensions: Dimensions = self.common_dimensions.iter().cloned().collect();
        let hostname_key = Some(self.hostname_tag.clone()).filter(|k| !k.is_empty());
        let transform = TagTransform::new(
            common_dimensions,
            hostname_key,
            self.common.hostname.clone(),
        );

        let mut sink = SignalfxSink::new(
            &self.common.name,
            transform,
            self.common.drop_rules(),
            RouteSelector::new(fallback, self.vary_key_by.clone(), routes),
            self.max_points_in_batch,
        );
        if let Some(timeout) = self.common.flush_timeout {
            sink = sink.with_flush_timeout(timeout);
        }
        sink.set_excluded_tags(&self.common.excluded_tags);
        Ok(Arc::new(sink))
    }
}
