/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use ahash::AHashSet;
use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml as yaml_types};

use crate::sink::ArcMetricSink;

mod yaml;

mod common;
pub use common::CommonSinkConfig;

mod datadog;
pub use datadog::DatadogSinkConfig;

mod signalfx;
pub use signalfx::SignalfxSinkConfig;

const CONFIG_KEY_SINK_TYPE: &str = "type";
const CONFIG_KEY_SINK_NAME: &str = "name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnySinkConfig {
    Signalfx(SignalfxSinkConfig),
    Datadog(DatadogSinkConfig),
}

impl AnySinkConfig {
    pub fn name(&self) -> &str {
        match self {
            AnySinkConfig::Signalfx(c) => &c.common.name,
            AnySinkConfig::Datadog(c) => &c.common.name,
        }
    }

    pub fn sink_type(&self) -> &'static str {
        match self {
            AnySinkConfig::Signalfx(_) => "SignalFx",
            AnySinkConfig::Datadog(_) => "Datadog",
        }
    }

    /// Create the sink, all of its destination clients share `client`.
    pub fn build(&self, client: reqwest::Client) -> anyhow::Result<ArcMetricSink> {
        match self {
            AnySinkConfig::Signalfx(c) => c.build(client),
            AnySinkConfig::Datadog(c) => c.build(client),
        }
        .context(format!("failed to build {} sink {}", self.sink_type(), self.name()))
    }
}

/// Load a sequence of sink maps. Sink names should be unique.
pub fn load_all(v: &Yaml) -> anyhow::Result<Vec<AnySinkConfig>> {
    let Yaml::Array(seq) = v else {
        return Err(anyhow!("yaml value type for sinks should be 'array'"));
    };

    let mut names = AHashSet::new();
    let mut sinks = Vec::with_capacity(seq.len());
    for (i, v) in seq.iter().enumerate() {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("sink #{i} is not a map"));
        };
        let sink = load_sink(map).context(format!("invalid sink #{i}"))?;
        if !names.insert(sink.name().to_string()) {
            return Err(anyhow!("sink with name {} already exists", sink.name()));
        }
        sinks.push(sink);
    }
    Ok(sinks)
}

/// Load all sinks from the first document of a yaml string.
pub fn load_str(s: &str) -> anyhow::Result<Vec<AnySinkConfig>> {
    let docs = YamlLoader::load_from_str(s).context("invalid yaml document")?;
    match docs.first() {
        Some(doc) => load_all(doc),
        None => Ok(Vec::new()),
    }
}

pub fn load_sink(map: &yaml_types::Hash) -> anyhow::Result<AnySinkConfig> {
    let sink_type = yaml::sink_type(map)?;
    match sink_type.as_str() {
        "signalfx" => {
            let sink = SignalfxSinkConfig::parse(map).context("failed to load this SignalFx sink")?;
            Ok(AnySinkConfig::Signalfx(sink))
        }
        "datadog" => {
            let sink = DatadogSinkConfig::parse(map).context("failed to load this Datadog sink")?;
            Ok(AnySinkConfig::Datadog(sink))
        }
        _ => Err(anyhow!("unsupported sink type {sink_type}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn signalfx() {
        let sinks = load_str(
            r#"
- type: SignalFx
  hostname: glooblestoots
  api-key: secret
  api_endpoint: "http://www.example.com/"
  common_dimensions:
    yay: pie
  vary_key_by: test_by
  per_tag_api_keys:
    available: other-secret
  max_points_in_batch: 100
  excluded_tags: [foo, boo]
  metric_name_prefix_drops: foo.bar
  flush_timeout: 2s
"#,
        )
        .unwrap();
        assert_eq!(sinks.len(), 1);
        let AnySinkConfig::Signalfx(c) = &sinks[0] else {
            panic!("not a signalfx sink");
        };
        assert_eq!(c.common.name, "signalfx");
        assert_eq!(c.common.hostname, "glooblestoots");
        assert_eq!(c.api_key, "secret");
        assert_eq!(c.hostname_tag, "host");
        assert_eq!(c.common_dimensions, vec![("yay".to_string(), "pie".to_string())]);
        assert_eq!(c.vary_key_by.as_deref(), Some("test_by"));
        assert_eq!(c.per_tag_api_keys.len(), 1);
        assert_eq!(c.max_points_in_batch, 100);
        assert_eq!(c.common.excluded_tags, vec!["foo".to_string(), "boo".to_string()]);
        assert_eq!(c.common.metric_name_prefix_drops, vec!["foo.bar".to_string()]);
        assert_eq!(c.common.flush_timeout, Some(Duration::from_secs(2)));

        let sink = sinks[0].build(reqwest::Client::new()).unwrap();
        assert_eq!(sink.name(), "signalfx");
    }

    #[test]
    fn datadog() {
        let sinks = load_str(
            r#"
- type: datadog
  name: dd-main
  hostname: myhost
  api_key: k3y
  tags: ["env:prod"]
  interval: 1m
  flush_max_per_body: 1000
"#,
        )
        .unwrap();
        let AnySinkConfig::Datadog(c) = &sinks[0] else {
            panic!("not a datadog sink");
        };
        assert_eq!(c.common.name, "dd-main");
        assert_eq!(c.api_hostname, "https://app.datadoghq.com");
        assert_eq!(c.tags, vec!["env:prod".to_string()]);
        assert_eq!(c.interval, Duration::from_secs(60));
        assert_eq!(c.flush_max_per_body.get(), 1000);

        let sink = sinks[0].build(reqwest::Client::new()).unwrap();
        assert_eq!(sink.name(), "dd-main");
    }

    #[test]
    fn invalid() {
        // no api key
        assert!(load_str("- {type: datadog, hostname: h}").is_err());
        // no hostname
        assert!(load_str("- {type: signalfx, api_key: k}").is_err());
        // unknown key
        assert!(load_str("- {type: signalfx, hostname: h, api_key: k, foo: bar}").is_err());
        // unknown type
        assert!(load_str("- {type: statsd, hostname: h}").is_err());
        // zero body limit
        assert!(
            load_str("- {type: datadog, hostname: h, api_key: k, flush_max_per_body: 0}").is_err()
        );
        // fractional interval
        assert!(load_str("- {type: datadog, hostname: h, api_key: k, interval: 1.5}").is_err());
        // route keys without a route tag
        assert!(
            load_str("- {type: signalfx, hostname: h, api_key: k, per_tag_api_keys: {a: b}}")
                .is_err()
        );
        // not a list
        assert!(load_str("type: signalfx").is_err());
    }

    #[test]
    fn duplicated_name() {
        let r = load_str(
            r#"
- {type: signalfx, hostname: h, api_key: k}
- {type: signalfx, hostname: h, api_key: k2}
"#,
        );
        assert!(r.is_err());

        let r = load_str(
            r#"
- {type: signalfx, hostname: h, api_key: k}
- {type: datadog, hostname: h, api_key: k}
"#,
        )
        .unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[1].sink_type(), "Datadog");
    }

    #[test]
    fn empty() {
        assert!(load_str("").unwrap().is_empty());
    }
}
