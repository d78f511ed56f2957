/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;

use async_trait::async_trait;

use super::DestinationClient;
use crate::dispatch::FlushContext;

struct MemoryStore<M, E> {
    metrics: Vec<M>,
    metric_submissions: usize,
    events: Vec<E>,
    event_submissions: usize,
}

/// Keeps everything submitted to it, in submission order.
pub struct MemoryClient<M, E> {
    store: Mutex<MemoryStore<M, E>>,
}

impl<M, E> Default for MemoryClient<M, E> {
    fn default() -> Self {
        MemoryClient {
            store: Mutex::new(MemoryStore {
                metrics: Vec::new(),
                metric_submissions: 0,
                events: Vec::new(),
                event_submissions: 0,
            }),
        }
    }
}

impl<M: Clone, E: Clone> MemoryClient<M, E> {
    pub fn metrics(&self) -> Vec<M> {
        self.store
            .lock()
            .map(|s| s.metrics.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<E> {
        self.store
            .lock()
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }

    pub fn metric_submissions(&self) -> usize {
        self.store
            .lock()
            .map(|s| s.metric_submissions)
            .unwrap_or_default()
    }

    pub fn event_submissions(&self) -> usize {
        self.store
            .lock()
            .map(|s| s.event_submissions)
            .unwrap_or_default()
    }
}

#[async_trait]
impl<M, E> DestinationClient for MemoryClient<M, E>
where
    M: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Metric = M;
    type Event = E;

    async fn submit_metrics(&self, _ctx: &FlushContext, metrics: &[M]) -> anyhow::Result<()> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store poisoned: {e}"))?;
        store.metrics.extend_from_slice(metrics);
        store.metric_submissions += 1;
        Ok(())
    }

    async fn submit_events(&self, _ctx: &FlushContext, events: &[E]) -> anyhow::Result<()> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store poisoned: {e}"))?;
        store.events.extend_from_slice(events);
        store.event_submissions += 1;
        Ok(())
    }
}
