/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use ahash::AHashMap;

use crate::types::{MetricRecord, ParsedTag, TagCategory};

pub const FALLBACK_DESTINATION: &str = "default";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination<'a> {
    Fallback,
    Route(&'a str),
}

impl Destination<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Destination::Fallback => FALLBACK_DESTINATION,
            Destination::Route(v) => *v,
        }
    }
}

impl fmt::Display for Destination<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the destination client of a record by the value of one tag.
pub struct RouteSelector<C> {
    route_tag_key: Option<String>,
    routes: AHashMap<String, C>,
    fallback: C,
}

impl<C> RouteSelector<C> {
    pub fn new(fallback: C, route_tag_key: Option<String>, routes: AHashMap<String, C>) -> Self {
        RouteSelector {
            route_tag_key: route_tag_key.filter(|k| !k.is_empty()),
            routes,
            fallback,
        }
    }

    pub fn single(fallback: C) -> Self {
        RouteSelector::new(fallback, None, AHashMap::new())
    }

    pub fn route_tag_key(&self) -> Option<&str> {
        self.route_tag_key.as_deref()
    }

    pub fn select<'a, I>(&self, tags: I) -> Destination<'_>
    where
        I: IntoIterator<Item = ParsedTag<'a>>,
    {
        let Some(route_key) = &self.route_tag_key else {
            return Destination::Fallback;
        };

        // the last occurrence wins, the same as for dimensions
        let mut found = None;
        for tag in tags {
            if tag.key == route_key.as_str() {
                found = Some(tag.value);
            }
        }

        match found.and_then(|v| self.routes.get_key_value(v)) {
            Some((k, _)) => Destination::Route(k.as_str()),
            None => Destination::Fallback,
        }
    }

    pub fn client(&self, destination: Destination<'_>) -> &C {
        match destination {
            Destination::Fallback => &self.fallback,
            Destination::Route(k) => self.routes.get(k).unwrap_or(&self.fallback),
        }
    }
}

/// Check the route hints of a record against the name of a sink.
///
/// Hints are the explicit sink set of the record plus the values of its
/// `veneursinkonly` tags. No hint at all means every sink accepts the record.
pub fn accepts_record(record: &MetricRecord, sink_name: &str) -> bool {
    let mut restricted = !record.sinks.is_empty();
    if record.sinks.contains(sink_name) {
        return true;
    }

    for tag in record.parsed_tags() {
        if tag.category == TagCategory::RouteHint {
            if tag.value == sink_name {
                return true;
            }
            restricted = true;
        }
    }

    !restricted
}
