//! HTTP client for the mock server admin API (`{url}/__admin`).

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode, Url, redirect};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Target;
use crate::error::StoreError;
use crate::mapping::{Document, Mapping};

use super::MappingStore;

/// Admin API path prefix appended to the configured url.
pub const ADMIN_PREFIX: &str = "__admin";

#[derive(Deserialize)]
struct MappingList {
    #[serde(default)]
    mappings: Vec<Mapping>,
}

/// [`MappingStore`] backed by a live mock server.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    admin: Url,
}

impl HttpStore {
    /// Builds a client for `target`.
    ///
    /// The target's timeout applies to every call. Redirects are not
    /// followed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the target url is not an
    /// absolute http(s) url or the HTTP client cannot be built.
    pub fn new(target: &Target) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .timeout(target.timeout)
            .build()
            .map_err(|e| StoreError::Transport {
                operation: "connect",
                message: e.to_string(),
            })?;

        let admin = Url::parse(&format!(
            "{}/{ADMIN_PREFIX}",
            target.url.trim_end_matches('/')
        ))
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| StoreError::Transport {
            operation: "connect",
            message: format!("invalid mock server url '{}'", target.url),
        })?;

        Ok(Self { client, admin })
    }

    /// Base admin url, e.g. `http://localhost:8080/__admin`.
    #[must_use]
    pub fn admin_url(&self) -> &str {
        self.admin.as_str()
    }

    /// Admin url with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.admin.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn mappings_url(&self) -> Url {
        self.endpoint(&["mappings"])
    }

    /// Url of one mapping. The id always stays a single path segment.
    fn mapping_url(&self, operation: &'static str, id: &str) -> Result<Url, StoreError> {
        if id.is_empty() || id == "." || id == ".." {
            return Err(StoreError::InvalidId {
                operation,
                id: id.to_string(),
            });
        }
        Ok(self.endpoint(&["mappings", id]))
    }

    /// Sends a request and returns the body text when the status is `expected`.
    async fn send(
        &self,
        operation: &'static str,
        id: Option<&str>,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<String, StoreError> {
        debug!(operation, ?id, "admin API request");

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(operation, &e))?;

        if status != expected {
            return Err(StoreError::Status {
                operation,
                id: id.map(str::to_string),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn transport_error(operation: &'static str, err: &reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout { operation }
    } else {
        StoreError::Transport {
            operation,
            message: err.to_string(),
        }
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode {
        operation,
        message: e.to_string(),
    })
}

#[async_trait]
impl MappingStore for HttpStore {
    async fn list(&self) -> Result<Vec<Mapping>, StoreError> {
        let body = self
            .send(
                "list",
                None,
                self.client.get(self.mappings_url()),
                StatusCode::OK,
            )
            .await?;
        Ok(decode::<MappingList>("list", &body)?.mappings)
    }

    async fn get(&self, id: &str) -> Result<Mapping, StoreError> {
        let body = self
            .send(
                "get",
                Some(id),
                self.client.get(self.mapping_url("get", id)?),
                StatusCode::OK,
            )
            .await?;
        decode("get", &body)
    }

    async fn create(&self, mapping: &Mapping) -> Result<Mapping, StoreError> {
        let body = self
            .send(
                "create",
                None,
                self.client.post(self.mappings_url()).json(mapping),
                StatusCode::CREATED,
            )
            .await?;
        let created: Mapping = decode("create", &body)?;
        if created.id().is_none() {
            return Err(StoreError::MissingId {
                operation: "create",
            });
        }
        Ok(created)
    }

    async fn update(&self, id: &str, mapping: &Mapping) -> Result<Mapping, StoreError> {
        let body = self
            .send(
                "update",
                Some(id),
                self.client.put(self.mapping_url("update", id)?).json(mapping),
                StatusCode::OK,
            )
            .await?;
        decode("update", &body)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.send(
            "delete",
            Some(id),
            self.client.delete(self.mapping_url("delete", id)?),
            StatusCode::OK,
        )
        .await
        .map(drop)
    }

    async fn settings(&self, settings: &Document) -> Result<(), StoreError> {
        self.send(
            "settings",
            None,
            self.client
                .post(self.endpoint(&["settings"]))
                .json(settings),
            StatusCode::OK,
        )
        .await
        .map(drop)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.send(
            "reset",
            None,
            self.client.post(self.endpoint(&["reset"])),
            StatusCode::OK,
        )
        .await
        .map(drop)
    }

    async fn reset_mappings(&self) -> Result<(), StoreError> {
        self.send(
            "reset_mappings",
            None,
            self.client.post(self.endpoint(&["mappings", "reset"])),
            StatusCode::OK,
        )
        .await
        .map(drop)
    }
}
