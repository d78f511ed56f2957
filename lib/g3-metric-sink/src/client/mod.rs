/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::FlushContext;

mod http;
pub use http::{HttpPoster, PostBody, build_endpoint};

mod memory;
pub use memory::MemoryClient;

/// Where formatted records are delivered to.
///
/// A sink holds one fallback client and any number of routed ones. Each
/// call is exactly one delivery attempt, nothing is retried by the caller.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    type Metric: Send + Sync + 'static;
    type Event: Send + Sync + 'static;

    async fn submit_metrics(
        &self,
        ctx: &FlushContext,
        metrics: &[Self::Metric],
    ) -> anyhow::Result<()>;

    async fn submit_events(&self, ctx: &FlushContext, events: &[Self::Event])
    -> anyhow::Result<()>;
}

pub type ArcDestinationClient<M, E> = Arc<dyn DestinationClient<Metric = M, Event = E>>;
