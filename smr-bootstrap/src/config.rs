use crate::BootstrapError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.ficsit.app";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Where the site finds its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url()
        }
    }
}

impl SiteConfig {
    pub fn new<U: Into<String>>(api_url: U) -> Self {
        Self {
            api_url: api_url.into()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, BootstrapError> {
        let config: SiteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BootstrapError> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| BootstrapError::InvalidUrl {
            url: self.api_url.clone(),
            reason: e.to_string()
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BootstrapError::InvalidUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme `{}`", scheme)
            })
        }
    }

    /// The GraphQL endpoint.
    pub fn api_graphql(&self) -> String {
        format!("{}/v2/query", self.api_url.trim_end_matches('/'))
    }
}
