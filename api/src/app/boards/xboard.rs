//! XBoard board
//!
//! Logs into an XBoard panel, looks up the account's subscription URL and
//! returns the subscription exactly as the panel serves it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use crate::domain::entities::{
    BoardDescriptor, ParamSpec, RequestContext, Subscription, ValidatedParams,
};
use crate::domain::ports::{PanelClient, PanelSession, SubscriptionBoard};
use crate::error::{BoardError, UpstreamError};

/// `ua` value asking for the caller's own User-Agent to be forwarded
pub const FORWARD_USER_AGENT: &str = "Request User-Agent";

/// Client formats XBoard understands in the subscribe URL's `flag` parameter
pub const CLIENT_FLAGS: &[&str] = &[
    "clash",
    "clashmeta",
    "meta",
    "stash",
    "sing-box",
    "shadowrocket",
    "surge",
    "surfboard",
    "quantumult",
    "quantumultx",
    "loon",
    "v2rayn",
    "v2rayng",
    "passwall",
    "sagernet",
    "general",
];

pub(crate) fn ua_param() -> ParamSpec {
    ParamSpec::optional()
        .with_default(FORWARD_USER_AGENT)
        .with_description(
            "User-Agent sent to the panel; the default forwards the caller's own User-Agent",
        )
}

pub(crate) fn flag_param() -> ParamSpec {
    ParamSpec::optional()
        .with_available(CLIENT_FLAGS)
        .with_description("Client format requested from the panel")
}

pub(crate) fn email_param() -> ParamSpec {
    ParamSpec::required()
        .with_example("user@example.com")
        .with_description("Panel account email")
}

pub(crate) fn password_param() -> ParamSpec {
    ParamSpec::required().with_description("Panel account password")
}

/// Replace the `ua` placeholder with the caller's User-Agent.
pub(crate) fn forward_user_agent(params: &mut ValidatedParams, ctx: &RequestContext) {
    if params.get("ua") == Some(FORWARD_USER_AGENT) {
        params.insert("ua", ctx.user_agent.clone().unwrap_or_default());
    }
}

/// Append the client `flag` to a subscribe URL.
pub(crate) fn with_flag(url: String, flag: Option<&str>) -> Result<String, UpstreamError> {
    let Some(flag) = flag else {
        return Ok(url);
    };

    let mut parsed = Url::parse(&url).map_err(|_| UpstreamError::InvalidUrl(url.clone()))?;
    parsed.query_pairs_mut().append_pair("flag", flag);
    Ok(parsed.into())
}

pub struct XBoard<P: PanelClient> {
    panel: Arc<P>,
    descriptor: BoardDescriptor,
}

impl<P: PanelClient> XBoard<P> {
    pub const ID: &'static str = "xboard";

    pub fn new(panel: Arc<P>) -> Self {
        let descriptor =
            BoardDescriptor::new(Self::ID, "Dynamic subscription fetcher for XBoard providers")
                .param(
                    "baseurl",
                    ParamSpec::required()
                        .with_example("https://example.com")
                        .with_description("Panel base URL"),
                )
                .param("email", email_param())
                .param("password", password_param())
                .param("ua", ua_param())
                .param("flag", flag_param());

        Self { panel, descriptor }
    }
}

#[async_trait]
impl<P: PanelClient> SubscriptionBoard for XBoard<P> {
    fn descriptor(&self) -> &BoardDescriptor {
        &self.descriptor
    }

    fn normalize(&self, params: &mut ValidatedParams, ctx: &RequestContext) {
        forward_user_agent(params, ctx);
    }

    async fn construct(&self, params: &ValidatedParams) -> Result<Subscription, BoardError> {
        let session = PanelSession::new(params.value("baseurl"), params.value("ua"));
        tracing::debug!(base_url = %session.base_url, "logging in to panel");

        let auth_data = self
            .panel
            .login(&session, params.value("email"), params.value("password"))
            .await?;
        let url = self.panel.get_subscribe_url(&session, &auth_data).await?;
        let url = with_flag(url, params.get("flag"))?;

        Ok(self.panel.fetch_subscription(&session, &url).await?)
    }
}
