/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token and optional deadline of one flush call.
///
/// Cloned into every submission. Submissions are expected to give up once
/// the context is done, but nothing aborts them from the outside.
#[derive(Clone, Debug)]
pub struct FlushContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for FlushContext {
    fn default() -> Self {
        FlushContext::new()
    }
}

impl FlushContext {
    pub fn new() -> Self {
        FlushContext {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        FlushContext {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_token(token: CancellationToken) -> Self {
        FlushContext {
            token,
            deadline: None,
        }
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(d) => d.min(deadline),
            None => deadline,
        });
        self
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn check(&self) -> Result<(), ContextError> {
        if self.token.is_cancelled() {
            return Err(ContextError::Canceled);
        }
        if let Some(deadline) = self.deadline
            && deadline <= Instant::now()
        {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolve once the context is canceled or past its deadline.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Canceled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}
