/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dimensions {
    inner: BTreeMap<String, String>,
}

impl Dimensions {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        if let Some(v) = self.inner.get_mut(key) {
            v.clear();
            v.push_str(value);
        } else {
            self.inner.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `key:value` strings, a bare `key` for empty values.
    pub fn to_tag_strings(&self) -> Vec<String> {
        self.inner
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}:{v}")
                }
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Dimensions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dims = Dimensions::default();
        for (k, v) in iter {
            dims.insert(k.as_ref(), v.as_ref());
        }
        dims
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.inner.iter();
        let Some((k, v)) = iter.next() else {
            return Ok(());
        };
        write!(f, "{k}={v}")?;
        for (k, v) in iter {
            write!(f, ",{k}={v}")?;
        }
        Ok(())
    }
}
