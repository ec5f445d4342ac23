//! Request/response contracts the page glue relies on, plus an HTTP implementation
//! that talks to this crate's API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{HeartState, Store, StoreId, UserId};
use crate::transport::http::types::{ApiResponse, USER_HEADER};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Api { status: u16, message: String },

    #[error("not signed in")]
    Unauthenticated,

    #[error("place lookup failed: {0}")]
    Place(String),
}

/// A resolved place selection from the address autocomplete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
}

/// One type-ahead row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub href: String,
}

impl From<&Store> for Suggestion {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            href: format!("/store/{}", store.slug),
        }
    }
}

#[async_trait]
pub trait HeartApi: Send + Sync {
    async fn toggle_heart(&self, store: StoreId) -> Result<HeartState, ClientError>;
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Suggestion>, ClientError>;
}

/// Address-to-coordinates provider (a maps service in production).
#[async_trait]
pub trait PlaceAutocomplete: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Place, ClientError>;
}

/// Reports failures to whoever is looking at the page.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// HTTP client for the heart and search endpoints.
#[derive(Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
    user: Option<UserId>,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: None,
        }
    }

    /// Acts on behalf of `user` for endpoints that need a signed-in user.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        let body: ApiResponse = resp.json().await?;
        if !status.is_success() || !body.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| status.to_string()),
            });
        }
        let data = body.data.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data).map_err(|e| ClientError::Api {
            status: status.as_u16(),
            message: format!("unexpected response shape: {}", e),
        })
    }
}

#[async_trait]
impl HeartApi for StorefrontClient {
    async fn toggle_heart(&self, store: StoreId) -> Result<HeartState, ClientError> {
        let user = self.user.ok_or(ClientError::Unauthenticated)?;
        let resp = self
            .http
            .post(format!("{}/api/stores/{}/heart", self.base_url, store))
            .header(USER_HEADER, user.to_string())
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl SearchApi for StorefrontClient {
    async fn search(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await?;
        let stores: Vec<Store> = Self::decode(resp).await?;
        Ok(stores.iter().map(Suggestion::from).collect())
    }
}
