use std::sync::Arc;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::repository::{Storage, StorageError};

mod academics;
mod assessments;
mod attendance;
mod enrollment;
mod wire;

/// Where the REST API lives and how to talk to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub locale: String,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            locale: locale.into(),
        }
    }
}

/// JSON-over-HTTP client for the school API.
///
/// Cookies set by the server are kept and replayed, so a logged-in session
/// established elsewhere in the process carries over to every call.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
}

impl HttpRemote {
    /// Build a client for the given API root.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the base URL or locale is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self, StorageError> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let locale = HeaderValue::from_str(config.locale.trim())
            .map_err(|e| StorageError::Connection(format!("invalid locale header: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, locale);

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Append `segments` to the API root. Each one is percent-encoded and stays a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(StorageError::InvalidPath((*bad).to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Connection("API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, StorageError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        decode_json(check_status(response).await?).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: Option<&B>,
    ) -> Result<T, StorageError> {
        let response = self.post(path, body).await?;
        decode_json(response).await
    }

    /// POST and ignore whatever acknowledgement body comes back.
    async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: Option<&B>,
    ) -> Result<(), StorageError> {
        self.post(path, body).await.map(drop)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: Option<&B>,
    ) -> Result<Response, StorageError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await
    }
}

impl Storage {
    /// Build a `Storage` backed by the REST API.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the HTTP client cannot be configured.
    pub fn http(config: &RemoteConfig) -> Result<Self, StorageError> {
        let remote = HttpRemote::new(config)?;
        Ok(Self {
            academics: Arc::new(remote.clone()),
            enrollment: Arc::new(remote.clone()),
            attendance: Arc::new(remote.clone()),
            assessments: Arc::new(remote),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, StorageError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| StorageError::Connection(format!("invalid API URL {raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(StorageError::Connection(format!("API URL {raw} cannot be a base")));
    }
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = error_from_response(status, &body);
    tracing::debug!(status = status.as_u16(), error = %err, "request rejected");
    Err(err)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn transport_error(err: reqwest::Error) -> StorageError {
    if err.is_decode() {
        StorageError::Serialization(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

/// Map a non-2xx answer to a `StorageError`.
///
/// 404 is kept distinct so callers can treat "nothing saved yet" as a normal state.
/// Everything else carries `error.message` from the JSON body, or the status reason.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> StorageError {
    if status == StatusCode::NOT_FOUND {
        return StorageError::NotFound;
    }

    let message = serde_json::from_str::<wire::ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
        });

    StorageError::Remote {
        status: status.as_u16(),
        message,
    }
}
