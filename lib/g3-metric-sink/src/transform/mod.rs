/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod tag;
pub use tag::{TagTransform, TransformedTags};

mod drop;
pub use drop::DropRules;

mod exclude;
pub use exclude::ExcludedTagKeys;
