//! REST client for the inventory service

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::InventoryBackend;
use crate::config::{ClientOptions, InventoryConfig};
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};
use crate::items::{Item, NewItem};
use crate::recognition::{RawRecognitionEntry, RecognizeRequest};
use crate::session::Session;
use crate::spaces::{NewSpace, Space};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecognizeResponse {
    Wrapped { items: Vec<RawRecognitionEntry> },
    Bare(Vec<RawRecognitionEntry>),
}

/// A room as nested by `GET /spaces`
#[derive(Deserialize)]
struct NestedSpace {
    #[serde(flatten)]
    space: Space,
    #[serde(default)]
    children: Vec<Space>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpacesResponse {
    Flat { flat: Vec<Space> },
    Nested { spaces: Vec<NestedSpace> },
    Bare(Vec<Space>),
}

impl SpacesResponse {
    fn into_flat(self) -> Vec<Space> {
        match self {
            SpacesResponse::Flat { flat } => flat,
            SpacesResponse::Bare(spaces) => spaces,
            SpacesResponse::Nested { spaces } => spaces
                .into_iter()
                .flat_map(|node| std::iter::once(node.space).chain(node.children))
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpaceResponse {
    Wrapped { space: Space },
    Bare(Space),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsResponse {
    Wrapped { items: Vec<Item> },
    Bare(Vec<Item>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemResponse {
    Wrapped { item: Item },
    Bare(Item),
}

/// Talks to the inventory REST API with the configured bearer token
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: InventoryConfig,
    session: Option<Session>,
    request_timeout: Option<Duration>,
    recognize_timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a backend for `config`.
    ///
    /// A token that is not a readable JWT is still sent; only the local owner
    /// id and expiry check are lost.
    pub fn new(config: InventoryConfig, options: &ClientOptions) -> Self {
        Self::with_client(Client::new(), config, options)
    }

    /// Create a backend reusing an existing HTTP client
    pub fn with_client(client: Client, config: InventoryConfig, options: &ClientOptions) -> Self {
        let session = config
            .access_token
            .as_deref()
            .and_then(|token| match Session::from_access_token(token) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!("Access token is not a readable JWT: {}", e);
                    None
                }
            });

        Self {
            client,
            config,
            session,
            request_timeout: options.request_timeout,
            recognize_timeout: options.recognize_timeout,
        }
    }

    /// The session decoded from the access token, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn token(&self) -> Result<Option<&str>> {
        if let Some(session) = &self.session {
            if session.is_expired() {
                return Err(Error::unauthorized("access token has expired"));
            }
        }
        Ok(self.config.access_token.as_deref())
    }

    fn authorized<'a>(&self, request: FetchBuilder<'a>) -> Result<FetchBuilder<'a>> {
        Ok(request
            .bearer_auth(self.token()?)
            .timeout(self.request_timeout))
    }
}

#[async_trait]
impl InventoryBackend for HttpBackend {
    fn owner_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    async fn recognize(&self, image: &[u8], mime_type: &str) -> Result<Vec<RawRecognitionEntry>> {
        if image.is_empty() {
            return Err(Error::validation("photo is empty"));
        }
        let body = RecognizeRequest {
            image: BASE64.encode(image),
            mime_type: mime_type.to_string(),
        };
        let url = self.config.endpoint("recognize")?;

        let response = self
            .authorized(Fetch::post(&self.client, url))?
            .timeout(self.recognize_timeout)
            .json(&body)?
            .execute::<RecognizeResponse>()
            .await?;

        Ok(match response {
            RecognizeResponse::Wrapped { items } => items,
            RecognizeResponse::Bare(items) => items,
        })
    }

    async fn list_spaces(&self) -> Result<Vec<Space>> {
        let url = self.config.endpoint("spaces")?;
        let response = self
            .authorized(Fetch::get(&self.client, url))?
            .execute::<SpacesResponse>()
            .await?;
        Ok(response.into_flat())
    }

    async fn create_space(&self, space: &NewSpace) -> Result<Space> {
        let url = self.config.endpoint("spaces")?;
        let response = self
            .authorized(Fetch::post(&self.client, url))?
            .json(space)?
            .execute::<SpaceResponse>()
            .await?;
        Ok(match response {
            SpaceResponse::Wrapped { space } => space,
            SpaceResponse::Bare(space) => space,
        })
    }

    async fn delete_space(&self, id: &str) -> Result<()> {
        let url = self.config.endpoint(&format!("spaces/{}", id))?;
        self.authorized(Fetch::delete(&self.client, url))?
            .execute_empty()
            .await
    }

    async fn list_items(&self, space_id: Option<&str>) -> Result<Vec<Item>> {
        let url = self.config.endpoint("items")?;
        let response = self
            .authorized(Fetch::get(&self.client, url))?
            .query("space_id", space_id)
            .execute::<ItemsResponse>()
            .await?;
        Ok(match response {
            ItemsResponse::Wrapped { items } => items,
            ItemsResponse::Bare(items) => items,
        })
    }

    async fn create_item(&self, item: &NewItem) -> Result<Item> {
        let url = self.config.endpoint("items")?;
        let response = self
            .authorized(Fetch::post(&self.client, url))?
            .json(item)?
            .execute::<ItemResponse>()
            .await?;
        Ok(match response {
            ItemResponse::Wrapped { item } => item,
            ItemResponse::Bare(item) => item,
        })
    }

    async fn update_item(&self, id: &str, item: &NewItem) -> Result<Item> {
        let url = self.config.endpoint(&format!("items/{}", id))?;
        let response = self
            .authorized(Fetch::put(&self.client, url))?
            .json(item)?
            .execute::<ItemResponse>()
            .await?;
        Ok(match response {
            ItemResponse::Wrapped { item } => item,
            ItemResponse::Bare(item) => item,
        })
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let url = self.config.endpoint(&format!("items/{}", id))?;
        self.authorized(Fetch::delete(&self.client, url))?
            .execute_empty()
            .await
    }
}
