//! HTTP plumbing shared by the REST clients: failure classification and
//! response decoding with bounded body previews.

use serde::de::DeserializeOwned;
use std::{error::Error as StdError, fmt};
use uvsync_core::api::SinkErrorKind;

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug)]
pub struct ApiError {
    kind: SinkErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    pub fn kind(&self) -> SinkErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            SinkErrorKind::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            SinkErrorKind::Network
        } else if err.is_decode() {
            SinkErrorKind::Decode
        } else if let Some(status) = err.status() {
            SinkErrorKind::from_status(status.as_u16())
        } else {
            SinkErrorKind::Unknown
        };
        let status = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        ApiError {
            kind,
            status,
            url: Some(url),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, url: String, preview: String) -> Self {
        ApiError {
            kind: SinkErrorKind::from_status(status),
            status: Some(status),
            url: Some(url),
            message: preview,
            source: None,
        }
    }

    pub(crate) fn decode_error(
        status: u16,
        url: String,
        err: serde_json::Error,
        preview: String,
    ) -> Self {
        let message = format!("failed to decode response body: {} | body={}", err, preview);
        ApiError {
            kind: SinkErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "api error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

/// Kind of an error produced by these clients; `Unknown` for anything else.
pub fn error_kind(err: &anyhow::Error) -> SinkErrorKind {
    err.downcast_ref::<ApiError>()
        .map(ApiError::kind)
        .unwrap_or(SinkErrorKind::Unknown)
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

pub(crate) async fn send(req: reqwest::RequestBuilder, url: &str) -> anyhow::Result<reqwest::Response> {
    req.send()
        .await
        .map_err(|err| ApiError::from_reqwest(err, url.to_string()).into())
}

/// Decode a JSON body, mapping non-2xx statuses and bad bodies to [`ApiError`].
pub(crate) async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| ApiError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        let preview = preview_body(&body);
        return Err(ApiError::status_error(status.as_u16(), url, preview).into());
    }

    serde_json::from_str::<T>(&body).map_err(|err| {
        let preview = preview_body(&body);
        ApiError::decode_error(status.as_u16(), url, err, preview).into()
    })
}

pub(crate) async fn ensure_success(resp: reqwest::Response) -> anyhow::Result<()> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status.is_success() {
        return Ok(());
    }

    let body = resp
        .text()
        .await
        .map_err(|err| ApiError::from_reqwest(err, url.clone()))?;
    let preview = preview_body(&body);
    Err(ApiError::status_error(status.as_u16(), url, preview).into())
}

pub(crate) fn build_client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()?)
}
