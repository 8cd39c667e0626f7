//! Client configuration (environment or JSON).

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lineitems_events::Topic;

use crate::query::RefreshPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TOPIC: &str = "/event/OpportunityProductUpdate_e__e";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub topic: String,
    pub refresh_policy: RefreshPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            topic: DEFAULT_TOPIC.to_string(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Read `LINEITEMS_*` environment variables, defaulting what is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("LINEITEMS_API_URL").unwrap_or_else(|| {
            tracing::warn!("LINEITEMS_API_URL not set; using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        let api_token = lookup("LINEITEMS_API_TOKEN").filter(|token| !token.trim().is_empty());
        if api_token.is_none() {
            tracing::warn!("LINEITEMS_API_TOKEN not set; requests are unauthenticated");
        }

        let topic = lookup("LINEITEMS_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let refresh_policy = match lookup("LINEITEMS_REFRESH_POLICY") {
            Some(raw) => raw
                .parse::<RefreshPolicy>()
                .context("invalid LINEITEMS_REFRESH_POLICY")?,
            None => RefreshPolicy::default(),
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            topic,
            refresh_policy,
        })
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid client configuration")
    }

    pub fn topic(&self) -> Topic {
        Topic::new(self.topic.clone())
    }
}
