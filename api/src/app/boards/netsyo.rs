//! Netsyo board
//!
//! An XBoard panel that rate-limits subscription downloads. The restriction is
//! lifted for a few minutes through the panel's bootstrap endpoint before the
//! subscription is fetched.

use std::sync::Arc;

use async_trait::async_trait;

use super::xboard::{email_param, flag_param, forward_user_agent, password_param, ua_param, with_flag};
use crate::domain::entities::{
    BoardDescriptor, ParamSpec, RequestContext, Subscription, ValidatedParams,
};
use crate::domain::ports::{PanelClient, PanelSession, SubscriptionBoard};
use crate::error::BoardError;

pub const DEFAULT_BASE_URL: &str = "https://www.netsyo.com";

/// Tag the bootstrap endpoint expects in its `use` field
const UNLOCK_TAG: &str = "netsyo";

pub struct Netsyo<P: PanelClient> {
    panel: Arc<P>,
    descriptor: BoardDescriptor,
}

impl<P: PanelClient> Netsyo<P> {
    pub const ID: &'static str = "netsyo";

    pub fn new(panel: Arc<P>) -> Self {
        let descriptor =
            BoardDescriptor::new(Self::ID, "Dynamic subscription fetcher for Netsyo providers")
                .param(
                    "baseurl",
                    ParamSpec::optional()
                        .with_default(DEFAULT_BASE_URL)
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
impl<P: PanelClient> SubscriptionBoard for Netsyo<P> {
    fn descriptor(&self) -> &BoardDescriptor {
        &self.descriptor
    }

    fn normalize(&self, params: &mut ValidatedParams, ctx: &RequestContext) {
        forward_user_agent(params, ctx);
    }

    async fn construct(&self, params: &ValidatedParams) -> Result<Subscription, BoardError> {
        let session = PanelSession::new(params.value("baseurl"), params.value("ua"));

        let auth_data = self
            .panel
            .login(&session, params.value("email"), params.value("password"))
            .await?;

        if !self
            .panel
            .unlock_subscribe(&session, &auth_data, UNLOCK_TAG)
            .await?
        {
            tracing::warn!(base_url = %session.base_url, "panel refused to unlock subscription");
            return Err(BoardError::Locked);
        }

        let url = self.panel.get_subscribe_url(&session, &auth_data).await?;
        let url = with_flag(url, params.get("flag"))?;

        Ok(self.panel.fetch_subscription(&session, &url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::QueryParams;
    use crate::test_utils::{MockPanelClient, PanelCall};

    fn params(board: &Netsyo<MockPanelClient>) -> ValidatedParams {
        let query: QueryParams = [("email", "a@b.c"), ("password", "pw"), ("ua", "clash")]
            .into_iter()
            .collect();
        board.descriptor().validate(&query).unwrap()
    }

    #[test]
    fn base_url_defaults_to_netsyo() {
        let board = Netsyo::new(Arc::new(MockPanelClient::new()));
        assert_eq!(params(&board).get("baseurl"), Some(DEFAULT_BASE_URL));
        assert_eq!(
            board.descriptor().example_url(),
            "/board/netsyo?email=user@example.com&password=<password>"
        );
    }

    #[tokio::test]
    async fn unlocks_before_fetching() {
        let panel = Arc::new(MockPanelClient::new().with_content("trojan://x"));
        let board = Netsyo::new(panel.clone());

        let sub = board.construct(&params(&board)).await.unwrap();

        assert_eq!(sub.body, "trojan://x");
        let calls = panel.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[1],
            PanelCall::Unlock {
                auth_data: MockPanelClient::AUTH_DATA.to_string(),
                tag: "netsyo".to_string(),
            }
        );
        assert!(matches!(calls[3], PanelCall::Fetch { .. }));
    }

    #[tokio::test]
    async fn refused_unlock_is_an_error() {
        let panel = Arc::new(MockPanelClient::new().with_unlock(false));
        let board = Netsyo::new(panel.clone());

        let err = board.construct(&params(&board)).await.unwrap_err();

        assert!(matches!(err, BoardError::Locked));
        assert_eq!(panel.calls().len(), 2);
    }
}
