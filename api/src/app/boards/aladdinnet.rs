//! Aladdin Network board
//!
//! Fetches the Clash configuration from the panel and pins every proxy server
//! to an IP address using the configuration's own nameserver policy, so the
//! client no longer depends on those nameservers being reachable.

use std::sync::Arc;

use async_trait::async_trait;

use super::xboard::{email_param, password_param};
use crate::app::clash::pin_proxy_servers;
use crate::domain::entities::{BoardDescriptor, ParamSpec, Subscription, ValidatedParams};
use crate::domain::ports::{DnsResolver, PanelClient, PanelSession, SubscriptionBoard};
use crate::error::{BoardError, TransformError};

pub const DEFAULT_BASE_URL: &str = "https://openapi.kdcloud.uk";

/// The panel only serves Clash configurations to Clash clients
pub const CLASH_USER_AGENT: &str = "ClashforWindows/0.20.39";

const YAML_CONTENT_TYPE: &str = "text/yaml; charset=utf-8";

pub struct AladdinNetwork<P: PanelClient, R: DnsResolver> {
    panel: Arc<P>,
    resolver: Arc<R>,
    descriptor: BoardDescriptor,
}

impl<P: PanelClient, R: DnsResolver> AladdinNetwork<P, R> {
    pub const ID: &'static str = "aladdinnet";

    pub fn new(panel: Arc<P>, resolver: Arc<R>) -> Self {
        let descriptor = BoardDescriptor::new(
            Self::ID,
            "Aladdin Network Clash subscription fetcher with DNS replacement",
        )
        .param(
            "baseurl",
            ParamSpec::optional()
                .with_default(DEFAULT_BASE_URL)
                .with_description("Panel API base URL"),
        )
        .param("email", email_param())
        .param("password", password_param());

        Self {
            panel,
            resolver,
            descriptor,
        }
    }
}

#[async_trait]
impl<P: PanelClient, R: DnsResolver> SubscriptionBoard for AladdinNetwork<P, R> {
    fn descriptor(&self) -> &BoardDescriptor {
        &self.descriptor
    }

    async fn construct(&self, params: &ValidatedParams) -> Result<Subscription, BoardError> {
        let session = PanelSession::new(params.value("baseurl"), CLASH_USER_AGENT);

        let auth_data = self
            .panel
            .login(&session, params.value("email"), params.value("password"))
            .await?;
        let url = self.panel.get_subscribe_url(&session, &auth_data).await?;
        let subscription = self.panel.fetch_subscription(&session, &url).await?;

        let config = std::str::from_utf8(&subscription.body).map_err(TransformError::Decode)?;
        let pinned = pin_proxy_servers(config, self.resolver.as_ref()).await?;

        Ok(subscription.with_body(pinned, YAML_CONTENT_TYPE))
    }
}
