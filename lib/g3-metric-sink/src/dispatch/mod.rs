/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::num::NonZeroUsize;

use anyhow::anyhow;
use log::{debug, warn};
use thiserror::Error;
use tokio::task::JoinSet;

mod context;
pub use context::{ContextError, FlushContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStrategy {
    /// All records of a destination go in one submission.
    Unbounded,
    /// At most this many records per submission.
    FixedCount(NonZeroUsize),
    /// Use as few submissions as the body limit allows, sized evenly.
    WorkerCount(NonZeroUsize),
}

impl BatchStrategy {
    /// Zero means no limit.
    pub fn fixed_count(max_per_batch: usize) -> Self {
        match NonZeroUsize::new(max_per_batch) {
            Some(n) => BatchStrategy::FixedCount(n),
            None => BatchStrategy::Unbounded,
        }
    }

    pub fn chunk_size(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        match self {
            BatchStrategy::Unbounded => total,
            BatchStrategy::FixedCount(n) => n.get(),
            BatchStrategy::WorkerCount(max_per_body) => {
                // both rounded up, the last chunk may be smaller
                let workers = (total - 1) / max_per_body.get() + 1;
                (total - 1) / workers + 1
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch interrupted: {0}")]
    Interrupted(#[from] ContextError),
    #[error("{failed} of {total} submissions failed, first error: {first:?}")]
    Delivery {
        failed: usize,
        total: usize,
        first: anyhow::Error,
    },
}

/// Records formatted for one destination client.
pub struct DispatchGroup<C, T> {
    pub destination: String,
    pub client: C,
    pub records: Vec<T>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub submissions: usize,
    pub records: usize,
}

pub struct BatchDispatcher {
    sink: String,
    strategy: BatchStrategy,
}

impl BatchDispatcher {
    pub fn new(sink: &str, strategy: BatchStrategy) -> Self {
        BatchDispatcher {
            sink: sink.to_string(),
            strategy,
        }
    }

    #[inline]
    pub fn strategy(&self) -> BatchStrategy {
        self.strategy
    }

    /// Split every group into chunks and submit each chunk in its own task.
    ///
    /// The context is checked before the first chunk and before spawning each
    /// of the following ones. Once it is done the call returns at once with
    /// [`DispatchError::Interrupted`], tasks already spawned are left running.
    pub async fn dispatch<C, T, F, Fut>(
        &self,
        ctx: &FlushContext,
        groups: Vec<DispatchGroup<C, T>>,
        submit: F,
    ) -> Result<DispatchSummary, DispatchError>
    where
        C: Clone,
        T: Send + 'static,
        F: Fn(C, FlushContext, Vec<T>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut summary = DispatchSummary::default();
        let mut tasks = JoinSet::new();

        for group in groups {
            if group.records.is_empty() {
                continue;
            }
            let chunk_size = self.strategy.chunk_size(group.records.len());
            debug!(
                "sink {}: dispatch {} records to {} in chunks of {chunk_size}",
                self.sink,
                group.records.len(),
                group.destination,
            );

            let mut records = group.records.into_iter();
            loop {
                let chunk: Vec<T> = records.by_ref().take(chunk_size).collect();
                if chunk.is_empty() {
                    break;
                }
                if let Err(e) = ctx.check() {
                    tasks.detach_all();
                    warn!(
                        "sink {}: dispatch to {} stopped after {} submissions: {e}",
                        self.sink, group.destination, summary.submissions
                    );
                    return Err(e.into());
                }

                let len = chunk.len();
                let destination = group.destination.clone();
                let fut = submit(group.client.clone(), ctx.clone(), chunk);
                tasks.spawn(async move { (destination, len, fut.await) });
                summary.submissions += 1;
                summary.records += len;
            }
        }

        let mut failed = 0usize;
        let mut first_error: Option<anyhow::Error> = None;

        let done = ctx.done();
        tokio::pin!(done);
        loop {
            let joined = tokio::select! {
                biased;

                r = tasks.join_next() => r,
                e = &mut done => {
                    let pending = tasks.len();
                    tasks.detach_all();
                    warn!(
                        "sink {}: {e} with {pending} of {} submissions pending",
                        self.sink, summary.submissions
                    );
                    return Err(DispatchError::Interrupted(e));
                }
            };
            let Some(r) = joined else {
                break;
            };

            match r {
                Ok((_, _, Ok(()))) => {}
                Ok((destination, len, Err(e))) => {
                    warn!(
                        "sink {}: failed to submit {len} records to {destination}: {e:?}",
                        self.sink
                    );
                    failed += 1;
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    warn!("sink {}: submission task failed: {e}", self.sink);
                    failed += 1;
                    first_error.get_or_insert_with(|| anyhow!("submission task failed: {e}"));
                }
            }
        }

        match first_error {
            Some(first) => Err(DispatchError::Delivery {
                failed,
                total: summary.submissions,
                first,
            }),
            None => Ok(summary),
        }
    }
}
