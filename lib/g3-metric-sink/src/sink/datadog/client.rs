/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use url::Url;

use super::{DatadogEvent, DatadogMetric, DatadogSample, DatadogServiceCheck};
use crate::client::{DestinationClient, HttpPoster, PostBody, build_endpoint};
use crate::dispatch::FlushContext;

const SERIES_PATH: &str = "api/v1/series";
const INTAKE_PATH: &str = "intake";
const CHECK_RUN_PATH: &str = "api/v1/check_run";

#[derive(Serialize)]
struct SeriesBody<'a> {
    series: &'a [DatadogMetric],
}

#[derive(Serialize)]
struct IntakeEvents<'a> {
    api: Vec<&'a DatadogEvent>,
}

#[derive(Serialize)]
struct IntakeBody<'a> {
    events: IntakeEvents<'a>,
}

fn api_endpoint(base: &str, path: &str, api_key: &str) -> anyhow::Result<Url> {
    let mut url = build_endpoint(base, path)?;
    url.query_pairs_mut().append_pair("api_key", api_key);
    Ok(url)
}

pub struct DatadogHttpClient {
    poster: HttpPoster,
    series_endpoint: Url,
    intake_endpoint: Url,
    check_run_endpoint: Url,
}

impl DatadogHttpClient {
    pub fn new(client: reqwest::Client, api_hostname: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(DatadogHttpClient {
            poster: HttpPoster::new(client),
            series_endpoint: api_endpoint(api_hostname, SERIES_PATH, api_key)?,
            intake_endpoint: api_endpoint(api_hostname, INTAKE_PATH, api_key)?,
            check_run_endpoint: api_endpoint(api_hostname, CHECK_RUN_PATH, api_key)?,
        })
    }
}

#[async_trait]
impl DestinationClient for DatadogHttpClient {
    type Metric = DatadogMetric;
    type Event = DatadogSample;

    async fn submit_metrics(
        &self,
        ctx: &FlushContext,
        metrics: &[DatadogMetric],
    ) -> anyhow::Result<()> {
        let body = SeriesBody { series: metrics };
        self.poster
            .post_json(ctx, &self.series_endpoint, &body, PostBody::JsonDeflate)
            .await
    }

    async fn submit_events(
        &self,
        ctx: &FlushContext,
        events: &[DatadogSample],
    ) -> anyhow::Result<()> {
        let mut api = Vec::new();
        let mut checks: Vec<&DatadogServiceCheck> = Vec::new();
        for sample in events {
            match sample {
                DatadogSample::Event(ev) => api.push(ev),
                DatadogSample::ServiceCheck(check) => checks.push(check),
            }
        }

        let mut result = Ok(());
        if !api.is_empty() {
            let n = api.len();
            let body = IntakeBody {
                events: IntakeEvents { api },
            };
            result = self
                .poster
                .post_json(ctx, &self.intake_endpoint, &body, PostBody::JsonDeflate)
                .await
                .with_context(|| format!("failed to post {n} events"));
            if result.is_ok() {
                debug!("posted {n} events to datadog");
            }
        }
        if !checks.is_empty() {
            // check_run does not accept a compressed body
            let n = checks.len();
            let r = self
                .poster
                .post_json(ctx, &self.check_run_endpoint, &checks, PostBody::Json)
                .await
                .with_context(|| format!("failed to post {n} service checks"));
            if r.is_ok() {
                debug!("posted {n} service checks to datadog");
            }
            result = result.and(r);
        }
        result
    }
}
