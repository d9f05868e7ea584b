//! Configuration for the inventory client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::recognition::{LabelSet, ValuePolicy};

/// Environment variable holding the inventory API base URL
pub const API_URL_ENV: &str = "INVENTORY_API_URL";

/// Environment variable holding the bearer token of the signed-in user
pub const ACCESS_TOKEN_ENV: &str = "INVENTORY_ACCESS_TOKEN";

/// Where the inventory service lives and who is talking to it
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Base URL of the inventory API, e.g. `https://home.example.com/api`
    pub base_url: Url,
    /// Bearer token of the authenticated user
    pub access_token: Option<String>,
}

impl InventoryConfig {
    /// Creates a new configuration, validating the URL and token.
    pub fn new(url: &str, access_token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("{} cannot be used as a base URL", url)));
        }
        if let Some(token) = &access_token {
            if token.trim().is_empty() {
                return Err(Error::config("access token cannot be empty"));
            }
        }
        Ok(Self {
            base_url,
            access_token,
        })
    }

    /// Reads the configuration from `INVENTORY_API_URL` and `INVENTORY_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(API_URL_ENV).map_err(|_| {
            Error::config(format!("{} environment variable not found", API_URL_ENV))
        })?;
        let token = std::env::var(ACCESS_TOKEN_ENV).ok();
        Self::new(&url, token)
    }

    /// Builds the absolute URL of an API path such as `items/42`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

/// Tunables for the ingestion pipeline and its HTTP calls
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout applied to space and item requests
    pub request_timeout: Option<Duration>,

    /// Timeout applied to photo recognition, which is much slower
    pub recognize_timeout: Option<Duration>,

    /// Maximum number of create requests in flight during a batch commit
    pub commit_concurrency: usize,

    /// How missing item values are filled in
    pub value_policy: ValuePolicy,

    /// Months added to today for candidates that need an expiry date
    pub expiry_default_months: u32,

    /// Language of the inferred category labels
    pub category_labels: LabelSet,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            recognize_timeout: Some(Duration::from_secs(60)),
            commit_concurrency: 4,
            value_policy: ValuePolicy::Unset,
            expiry_default_months: 3,
            category_labels: LabelSet::Chinese,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the recognition timeout
    pub fn with_recognize_timeout(mut self, value: Option<Duration>) -> Self {
        self.recognize_timeout = value;
        self
    }

    /// Set the commit concurrency; zero is treated as one
    pub fn with_commit_concurrency(mut self, value: usize) -> Self {
        self.commit_concurrency = value.max(1);
        self
    }

    /// Set the value policy
    pub fn with_value_policy(mut self, value: ValuePolicy) -> Self {
        self.value_policy = value;
        self
    }

    /// Set the default expiry offset in months
    pub fn with_expiry_default_months(mut self, value: u32) -> Self {
        self.expiry_default_months = value;
        self
    }

    /// Set the category label language
    pub fn with_category_labels(mut self, value: LabelSet) -> Self {
        self.category_labels = value;
        self
    }
}
