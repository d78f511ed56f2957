/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::{Yaml, yaml};

use super::CONFIG_KEY_SINK_TYPE;

/// `Api-Key` and `api_key` name the same setting.
fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

/// Call `f` with the normalized key of every setting in a sink map.
pub(super) fn foreach_setting<F>(map: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in map {
        let Yaml::String(raw) = k else {
            return Err(anyhow!("sink setting key {k:?} is not a string"));
        };
        f(&normalize_key(raw), v)?;
    }
    Ok(())
}

/// The normalized value of the `type` setting, in whatever spelling its key has.
pub(super) fn sink_type(map: &yaml::Hash) -> anyhow::Result<String> {
    for (k, v) in map {
        if let Yaml::String(raw) = k
            && normalize_key(raw) == CONFIG_KEY_SINK_TYPE
        {
            let Yaml::String(value) = v else {
                return Err(anyhow!("sink type should be a string"));
            };
            return Ok(normalize_key(value));
        }
    }
    Err(anyhow!("no sink type set"))
}

/// Api keys and hostnames may look like numbers.
pub(super) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Integer(i) => Ok(i.to_string()),
        _ => Err(anyhow!("should be a string")),
    }
}

/// A sequence of strings, or a single string.
pub(super) fn as_string_list(v: &Yaml) -> anyhow::Result<Vec<String>> {
    let Yaml::Array(seq) = v else {
        return Ok(vec![as_string(v)?]);
    };
    seq.iter()
        .enumerate()
        .map(|(i, v)| as_string(v).context(format!("invalid list element #{i}")))
        .collect()
}

/// Tag key or value to string, in document order. Empty keys are rejected.
pub(super) fn as_string_map(v: &Yaml) -> anyhow::Result<Vec<(String, String)>> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("should be a map"));
    };
    let mut pairs = Vec::with_capacity(map.len());
    for (k, v) in map {
        let key = as_string(k).context(format!("invalid map key {k:?}"))?;
        if key.is_empty() {
            return Err(anyhow!("empty map key"));
        }
        let value = as_string(v).context(format!("invalid value for map key {key}"))?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

pub(super) fn as_count(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => usize::try_from(*i).map_err(|_| anyhow!("should not be negative")),
        Yaml::String(s) => s
            .parse()
            .map_err(|e| anyhow!("invalid count string {s}: {e}")),
        _ => Err(anyhow!("should be an integer")),
    }
}

pub(super) fn as_nonzero_count(v: &Yaml) -> anyhow::Result<NonZeroUsize> {
    NonZeroUsize::new(as_count(v)?).ok_or_else(|| anyhow!("should not be zero"))
}

/// A humanize string such as `10s`, or a plain number of seconds.
pub(super) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => s
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| anyhow!("invalid duration string {s}")),
            Err(e) => Err(anyhow!("invalid duration string {s}: {e}")),
        },
        Yaml::Integer(i) => u64::try_from(*i)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("negative duration")),
        _ => Err(anyhow!("should be a duration string or a number of seconds")),
    }
}
