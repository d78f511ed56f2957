/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::Write;

use anyhow::{Context, anyhow};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use http::{HeaderMap, HeaderName, HeaderValue, header};
use serde::Serialize;
use url::Url;

use crate::dispatch::FlushContext;

/// Join a fixed sub path to a configured base url, with exactly one `/`
/// between them whether or not the base ends with one.
pub fn build_endpoint(base: &str, sub_path: &str) -> anyhow::Result<Url> {
    let base = base.strip_suffix('/').unwrap_or(base);
    let sub_path = sub_path.trim_start_matches('/');
    let s = format!("{base}/{sub_path}");
    Url::parse(&s).map_err(|e| anyhow!("invalid endpoint url {s}: {e}"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostBody {
    Json,
    /// zlib stream, sent with `Content-Encoding: deflate`
    JsonDeflate,
}

#[derive(Clone)]
pub struct HttpPoster {
    client: reqwest::Client,
    static_headers: HeaderMap,
}

impl HttpPoster {
    pub fn new(client: reqwest::Client) -> Self {
        let mut static_headers = HeaderMap::new();
        static_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        HttpPoster {
            client,
            static_headers,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> anyhow::Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| anyhow!("invalid value for header {name}: {e}"))?;
        self.static_headers.insert(name, value);
        Ok(self)
    }

    pub async fn post_json<T>(
        &self,
        ctx: &FlushContext,
        url: &Url,
        body: &T,
        encoding: PostBody,
    ) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        // never log the query, it may carry the api key
        let target = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
        ctx.check()
            .map_err(|e| anyhow!("post to {target} not started: {e}"))?;

        let data = serde_json::to_vec(body).context("failed to encode request body")?;
        let mut req = self
            .client
            .post(url.clone())
            .headers(self.static_headers.clone());
        let data = match encoding {
            PostBody::Json => data,
            PostBody::JsonDeflate => {
                let mut encoder =
                    ZlibEncoder::new(Vec::with_capacity(data.len() / 4), Compression::default());
                encoder
                    .write_all(&data)
                    .context("failed to compress request body")?;
                req = req.header(header::CONTENT_ENCODING, HeaderValue::from_static("deflate"));
                encoder.finish().context("failed to compress request body")?
            }
        };
        if let Some(timeout) = ctx.remaining() {
            req = req.timeout(timeout);
        }

        let rsp = tokio::select! {
            r = req.body(data).send() => {
                r.map_err(|e| anyhow!("failed to post to {target}: {e}"))?
            }
            e = ctx.done() => {
                return Err(anyhow!("post to {target} interrupted: {e}"));
            }
        };

        let status = rsp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = rsp.bytes().await.unwrap_or_default();
        match error_detail(&body) {
            Some(detail) => Err(anyhow!(
                "error response from {target}: {} {detail}",
                status.as_u16()
            )),
            None => Err(anyhow!("error response from {target}: {}", status.as_u16())),
        }
    }
}

const ERROR_DETAIL_MAX_LEN: usize = 512;

/// Leading text of an error response body, cut at a char boundary.
fn error_detail(body: &[u8]) -> Option<String> {
    let truncated = body.len() > ERROR_DETAIL_MAX_LEN;
    let head = &body[..body.len().min(ERROR_DETAIL_MAX_LEN)];
    let text = match std::str::from_utf8(head) {
        Ok(s) => s,
        // a multi-byte char split by the cut
        Err(e) if truncated && e.error_len().is_none() => {
            std::str::from_utf8(&head[..e.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };
    if truncated {
        Some(format!("{text}..."))
    } else {
        Some(text.to_string())
    }
}
