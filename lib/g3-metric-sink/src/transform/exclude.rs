/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use ahash::AHashSet;
use arc_swap::ArcSwap;

/// Tag keys removed from every outgoing record, replaceable at runtime.
pub struct ExcludedTagKeys {
    inner: ArcSwap<AHashSet<String>>,
}

impl Default for ExcludedTagKeys {
    fn default() -> Self {
        ExcludedTagKeys {
            inner: ArcSwap::from_pointee(AHashSet::new()),
        }
    }
}

impl ExcludedTagKeys {
    pub fn set<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: AHashSet<String> = keys.into_iter().map(Into::into).collect();
        self.inner.store(Arc::new(keys));
    }

    /// Taken once at the start of a flush, later updates apply to the next one.
    pub fn snapshot(&self) -> Arc<AHashSet<String>> {
        self.inner.load_full()
    }
}
