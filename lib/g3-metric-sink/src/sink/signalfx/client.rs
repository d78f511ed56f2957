/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use async_trait::async_trait;
use http::HeaderName;
use serde::Serialize;
use url::Url;

use super::{Datapoint, DatapointKind, SignalfxEvent};
use crate::client::{DestinationClient, HttpPoster, PostBody, build_endpoint};
use crate::dispatch::FlushContext;

const DATAPOINT_PATH: &str = "v2/datapoint";
const EVENT_PATH: &str = "v2/event";

static SF_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-sf-token");

#[derive(Serialize)]
struct DatapointBody<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gauge: Vec<&'a Datapoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    counter: Vec<&'a Datapoint>,
}

impl<'a> DatapointBody<'a> {
    fn new(points: &'a [Datapoint]) -> Self {
        let mut body = DatapointBody {
            gauge: Vec::new(),
            counter: Vec::new(),
        };
        for p in points {
            match p.kind {
                DatapointKind::Gauge => body.gauge.push(p),
                DatapointKind::Counter => body.counter.push(p),
            }
        }
        body
    }
}

/// Ingest API client of one SignalFx access token.
pub struct SignalfxHttpClient {
    poster: HttpPoster,
    datapoint_endpoint: Url,
    event_endpoint: Url,
}

impl SignalfxHttpClient {
    pub fn new(client: reqwest::Client, api_endpoint: &str, api_key: &str) -> anyhow::Result<Self> {
        let poster = HttpPoster::new(client).with_header(SF_TOKEN_HEADER.clone(), api_key)?;
        Ok(SignalfxHttpClient {
            poster,
            datapoint_endpoint: build_endpoint(api_endpoint, DATAPOINT_PATH)?,
            event_endpoint: build_endpoint(api_endpoint, EVENT_PATH)?,
        })
    }

    pub fn datapoint_endpoint(&self) -> &Url {
        &self.datapoint_endpoint
    }

    pub fn event_endpoint(&self) -> &Url {
        &self.event_endpoint
    }
}

#[async_trait]
impl DestinationClient for SignalfxHttpClient {
    type Metric = Datapoint;
    type Event = SignalfxEvent;

    async fn submit_metrics(
        &self,
        ctx: &FlushContext,
        metrics: &[Datapoint],
    ) -> anyhow::Result<()> {
        let body = DatapointBody::new(metrics);
        self.poster
            .post_json(ctx, &self.datapoint_endpoint, &body, PostBody::Json)
            .await
    }

    async fn submit_events(
        &self,
        ctx: &FlushContext,
        events: &[SignalfxEvent],
    ) -> anyhow::Result<()> {
        self.poster
            .post_json(ctx, &self.event_endpoint, events, PostBody::Json)
            .await
    }
}
