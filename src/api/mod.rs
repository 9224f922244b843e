//! Reqwest-based client for the plotting service JSON API.

use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::session::links;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unreadable response from {url} (HTTP {status}): {reason}")]
    Decode { url: String, status: u16, reason: String },
    #[error("service refused {url} (HTTP {status}): {message}")]
    Rejected { url: String, status: u16, message: String },
    #[error("invalid plot id {0:?}")]
    InvalidId(String),
}

/// Request body of `POST /run` and `POST /plot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotData {
    pub code: String,
    pub files: BTreeMap<String, String>,
}

/// Saved record as returned by `GET /plot/<id>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotRecord {
    pub code: Option<String>,
    pub files: Option<BTreeMap<String, String>>,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl PlotRecord {
    /// A record that only carries a transport failure.
    pub fn failed(err: &ApiError) -> Self {
        Self { error: Some(transport_message(err)), ..Self::default() }
    }
}

// Every field is optional on the wire; error payloads reuse the same shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Reply {
    output: Option<String>,
    svg: Option<String>,
    error: Option<String>,
    id: Option<String>,
}

/// Result of a run or save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { output: String, svg: String },
    Failure { error: String },
}

impl Outcome {
    /// Build an outcome from possibly-missing wire fields. A non-empty `error`
    /// wins; any accompanying program output is folded into the error text.
    pub fn from_parts(output: Option<String>, svg: Option<String>, error: Option<String>) -> Self {
        let output = output.unwrap_or_default();
        match error.filter(|e| !e.is_empty()) {
            Some(error) if output.trim().is_empty() => Outcome::Failure { error },
            Some(error) => Outcome::Failure { error: format!("{}\n\n{}", error, output) },
            None => Outcome::Success { output, svg: svg.unwrap_or_default() },
        }
    }

    pub fn transport_failure(err: &ApiError) -> Self {
        Outcome::Failure { error: transport_message(err) }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

fn transport_message(err: &ApiError) -> String {
    format!("request failed: {}", err)
}

/// Result of `POST /plot` and `POST /replot/<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReply {
    pub outcome: Outcome,
    pub id: String,
}

impl SaveReply {
    pub fn failed(err: &ApiError) -> Self {
        Self { outcome: Outcome::transport_failure(err), id: String::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRequest {
    pub format: ImageFormat,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PlotClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlotClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self { http, base_url: cfg.api_base_url() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_plot(&self, id: &str) -> Result<PlotRecord, ApiError> {
        let url = format!("{}/plot/{}", self.base_url, checked_id(id)?);
        tracing::info!(%url, "fetching saved plot");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;
        decode(&url, resp).await
    }

    pub async fn run(&self, payload: &PlotData) -> Result<Outcome, ApiError> {
        let reply: Reply = self.post_json("/run", payload).await?;
        Ok(Outcome::from_parts(reply.output, reply.svg, reply.error))
    }

    pub async fn save(&self, payload: &PlotData) -> Result<SaveReply, ApiError> {
        let reply: Reply = self.post_json("/plot", payload).await?;
        Ok(save_reply(reply))
    }

    /// Re-run a saved plot with some of its files replaced.
    pub async fn replot(
        &self,
        id: &str,
        files: &BTreeMap<String, String>,
    ) -> Result<SaveReply, ApiError> {
        let path = format!("/replot/{}", checked_id(id)?);
        let reply: Reply = self.post_json(&path, files).await?;
        Ok(save_reply(reply))
    }

    pub async fn image(&self, id: &str, req: ImageRequest) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/plot/{}.{}", self.base_url, checked_id(id)?, req.format.extension());
        let mut query = Vec::new();
        if let Some(w) = req.width.filter(|w| *w > 0.0) {
            query.push(("w", w.to_string()));
        }
        if let Some(h) = req.height.filter(|h| *h > 0.0) {
            query.push(("h", h.to_string()));
        }
        tracing::info!(%url, "downloading plot image");
        let resp = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;
        if !status.is_success() {
            let message = serde_json::from_slice::<Reply>(&bytes)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
            return Err(ApiError::Rejected { url, status: status.as_u16(), message });
        }
        Ok(bytes.to_vec())
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::info!(%url, "submitting");
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.clone(), source })?;
        decode(&url, resp).await
    }
}

// The service answers errors with a JSON body and a non-2xx status, so the
// body is decoded regardless of status.
async fn decode<T>(url: &str, resp: reqwest::Response) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = resp.status().as_u16();
    let text = resp
        .text()
        .await
        .map_err(|source| ApiError::Transport { url: url.to_string(), source })?;
    tracing::debug!(%url, status, bytes = text.len(), "response received");
    serde_json::from_str(&text).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        status,
        reason: e.to_string(),
    })
}

fn save_reply(reply: Reply) -> SaveReply {
    let id = reply.id.unwrap_or_default();
    let outcome = Outcome::from_parts(reply.output, reply.svg, reply.error);
    if !outcome.is_failure() && !id.is_empty() && !links::is_plot_id(&id) {
        tracing::warn!(%id, "service returned an invalid plot id");
        let error = format!("service returned an invalid plot id {:?}", id);
        return SaveReply { outcome: Outcome::Failure { error }, id: String::new() };
    }
    SaveReply { outcome, id }
}

fn checked_id(id: &str) -> Result<&str, ApiError> {
    if links::is_plot_id(id) {
        Ok(id)
    } else {
        Err(ApiError::InvalidId(id.to_string()))
    }
}
