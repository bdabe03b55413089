//! Subscription panel port trait
//!
//! Defines the interface for talking to XBoard-compatible panels.

use async_trait::async_trait;

use crate::domain::entities::Subscription;
use crate::error::UpstreamError;

/// Where and as whom panel requests are made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSession {
    pub base_url: String,
    pub user_agent: String,
}

impl PanelSession {
    pub fn new(base_url: &str, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

#[async_trait]
pub trait PanelClient: Send + Sync {
    /// Log in and return the panel's `auth_data` token.
    async fn login(
        &self,
        session: &PanelSession,
        email: &str,
        password: &str,
    ) -> Result<String, UpstreamError>;

    /// Lift a panel's temporary subscription restriction. Returns whether the panel agreed.
    async fn unlock_subscribe(
        &self,
        session: &PanelSession,
        auth_data: &str,
        tag: &str,
    ) -> Result<bool, UpstreamError>;

    /// Look up the account's subscription URL.
    async fn get_subscribe_url(
        &self,
        session: &PanelSession,
        auth_data: &str,
    ) -> Result<String, UpstreamError>;

    /// Download the subscription itself.
    async fn fetch_subscription(
        &self,
        session: &PanelSession,
        url: &str,
    ) -> Result<Subscription, UpstreamError>;
}
