//! # HTTP Store
//!
//! REST implementation of [`RemoteStore`] over `reqwest`.
//!
//! ## Endpoints
//! ```text
//! fetch_collection   GET  {base}/api/{resource}
//! fetch_by_id        GET  {base}/api/{resource}/{id}
//! create             POST {base}/api/{resource}
//! update             PUT  {base}/api/{resource}/{id}
//! ```
//!
//! `{resource}` is `sales`, `devices`, `customizations` or `addons`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use sale_core::{EntityId, EntityKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::store::{Entity, RemoteStore};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Root of the store; `/api/...` is appended to its path.
    pub base_url: Url,

    /// Sent as `Authorization: Bearer <token>` when present.
    pub api_token: Option<String>,

    pub timeout: Duration,
}

impl HttpStoreConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpStore {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if the base URL cannot take path
    /// segments or the client cannot be built.
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        if config.base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base url '{}' cannot take a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpStoreConfig {
        &self.config
    }

    /// `{base}/api/{resource}[/{id}]`
    fn url(&self, kind: EntityKind, id: Option<EntityId>) -> StoreResult<Url> {
        let mut url = self.config.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Config(format!(
                    "base url '{}' cannot take a path",
                    self.config.base_url
                ))
            })?;
            segments.pop_if_empty().push("api").push(kind.resource());
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps the status, then decodes the body.
    ///
    /// A 404 on a request addressed by id becomes `NotFound`.
    async fn read<T: DeserializeOwned>(
        response: Response,
        kind: EntityKind,
        id: Option<EntityId>,
    ) -> StoreResult<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::not_found(kind, id));
            }
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%kind, status = status.as_u16(), "Remote store rejected request");
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    #[instrument(skip(self), fields(kind = %T::KIND))]
    async fn fetch_collection<T: Entity>(&self) -> StoreResult<Vec<T>> {
        let url = self.url(T::KIND, None)?;
        debug!(url = %url, "GET collection");

        let response = self.request(Method::GET, url).send().await?;
        let items: Vec<T> = Self::read(response, T::KIND, None).await?;

        debug!(count = items.len(), "Collection fetched");
        Ok(items)
    }

    #[instrument(skip(self), fields(kind = %T::KIND))]
    async fn fetch_by_id<T: Entity>(&self, id: EntityId) -> StoreResult<T> {
        let url = self.url(T::KIND, Some(id))?;
        debug!(url = %url, "GET by id");

        let response = self.request(Method::GET, url).send().await?;
        Self::read(response, T::KIND, Some(id)).await
    }

    #[instrument(skip(self, payload), fields(kind = %T::KIND))]
    async fn create<P, T>(&self, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity,
    {
        let url = self.url(T::KIND, None)?;
        debug!(url = %url, "POST");

        let response = self.request(Method::POST, url).json(payload).send().await?;
        Self::read(response, T::KIND, None).await
    }

    #[instrument(skip(self, payload), fields(kind = %T::KIND))]
    async fn update<P, T>(&self, id: EntityId, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity,
    {
        let url = self.url(T::KIND, Some(id))?;
        debug!(url = %url, "PUT");

        let response = self.request(Method::PUT, url).json(payload).send().await?;
        Self::read(response, T::KIND, Some(id)).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sale_core::{Device, Money, Reference, Sale, SalePayload};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> HttpStore {
        let base = Url::parse(&server.uri()).unwrap();
        HttpStore::new(HttpStoreConfig::new(base).with_token("secret")).unwrap()
    }

    fn payload() -> SalePayload {
        SalePayload {
            id: None,
            sale_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            final_price: Money::from_cents(25000),
            device: Reference::new(3),
            customizations: vec![Reference::new(1)],
            addons: vec![],
            extra: Default::default(),
        }
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let base = Url::parse("http://store.local/admin/").unwrap();
        let store = HttpStore::new(HttpStoreConfig::new(base)).unwrap();
        assert_eq!(
            store.url(EntityKind::Customization, None).unwrap().as_str(),
            "http://store.local/admin/api/customizations"
        );
        assert_eq!(
            store.url(EntityKind::Sale, Some(7)).unwrap().as_str(),
            "http://store.local/admin/api/sales/7"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(
            HttpStore::new(HttpStoreConfig::new(base)),
            Err(StoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_collection_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 3, "code": "D3"}, {"id": 4}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let devices: Vec<Device> = store_for(&server).fetch_collection().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].code.as_deref(), Some("D3"));
    }

    #[tokio::test]
    async fn test_fetch_by_id_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sales/7"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store_for(&server).fetch_by_id::<Sale>(7).await.unwrap_err();
        assert_eq!(err, StoreError::not_found(EntityKind::Sale, 7));
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/addons"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .fetch_collection::<sale_core::Addon>()
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Status {
                status: 500,
                message: "database down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sales"))
            .and(body_json(json!({
                "saleDate": "2024-01-01T10:00:00Z",
                "finalPrice": 250,
                "device": {"id": 3},
                "customizations": [{"id": 1}],
                "addons": []
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 11,
                "saleDate": "2024-01-01T10:00:00Z",
                "finalPrice": 250,
                "device": {"id": 3},
                "customizations": [{"id": 1}],
                "addons": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created: Sale = store_for(&server).create(&payload()).await.unwrap();
        assert_eq!(created.id, Some(11));
    }

    #[tokio::test]
    async fn test_update_puts_to_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/sales/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "saleDate": "2024-01-01T10:00:00Z",
                "finalPrice": 250,
                "device": {"id": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut body = payload();
        body.id = Some(7);
        let updated: Sale = store_for(&server).update(7, &body).await.unwrap();
        assert_eq!(updated.final_price, Some(Money::from_cents(25000)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .fetch_collection::<Device>()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let store = HttpStore::new(
            HttpStoreConfig::new(base).with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = store.fetch_collection::<Device>().await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
    }
}
