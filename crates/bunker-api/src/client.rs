// Async HTTP client for the prepper-bunker inventory REST API.
//
// Every kind exposes the same five verbs under `/{kind-path}`; the generic
// [`ResourceApi`] binds them to one record type. Kind-specific read
// endpoints live in `queries.rs` as inherent methods.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{RecordId, Resource};
use crate::transport::TransportConfig;

// ── Error response shape from the backend ───────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the inventory REST API.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally.
#[derive(Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl InventoryClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL (e.g. `http://localhost:8080/api`) and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Typed CRUD handle for one resource kind.
    pub fn resource<R: Resource>(&self) -> ResourceApi<R> {
        ResourceApi {
            client: self.clone(),
            _record: PhantomData,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Append percent-encoded path segments to the base URL.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    /// `GET` with free-text path segments (`by-purpose/{purpose}` etc.).
    pub(crate) async fn get_segments<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, Error> {
        let url = self.segment_url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.error.or(e.message))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

// ── Per-kind CRUD ────────────────────────────────────────────────────

/// The five REST verbs for one record type.
///
/// `GET /{kind}`, `GET /{kind}/{id}`, `POST /{kind}`, `PUT /{kind}/{id}`,
/// `DELETE /{kind}/{id}`.
pub struct ResourceApi<R: Resource> {
    client: InventoryClient,
    _record: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    fn collection() -> &'static str {
        R::KIND.path()
    }

    fn item(id: RecordId) -> String {
        format!("{}/{id}", R::KIND.path())
    }

    pub async fn list(&self) -> Result<Vec<R>, Error> {
        self.client.get(Self::collection()).await
    }

    pub async fn get(&self, id: RecordId) -> Result<R, Error> {
        self.client.get(&Self::item(id)).await
    }

    pub async fn create(&self, input: &R::Create) -> Result<R, Error> {
        self.client.post(Self::collection(), input).await
    }

    pub async fn update(&self, id: RecordId, input: &R::Create) -> Result<R, Error> {
        self.client.put(&Self::item(id), input).await
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), Error> {
        self.client.delete(&Self::item(id)).await
    }

    pub fn client(&self) -> &InventoryClient {
        &self.client
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Food;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            InventoryClient::with_client(reqwest::Client::new(), "http://localhost:8080/api")
                .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/");
        assert_eq!(
            client.url("food/3").unwrap().as_str(),
            "http://localhost:8080/api/food/3"
        );
    }

    #[test]
    fn free_text_segments_are_encoded() {
        let client =
            InventoryClient::with_client(reqwest::Client::new(), "http://localhost:8080/api/")
                .unwrap();
        let url = client
            .segment_url(&["medications", "by-purpose", "pain relief"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/medications/by-purpose/pain%20relief"
        );
    }

    #[test]
    fn item_paths_use_collection_segment() {
        assert_eq!(ResourceApi::<Food>::item(9), "food/9");
        assert_eq!(
            ResourceApi::<crate::models::StorageLocation>::collection(),
            "storage-locations"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = InventoryClient::with_client(reqwest::Client::new(), "not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
