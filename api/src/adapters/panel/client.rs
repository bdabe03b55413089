//! XBoard panel API client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::entities::Subscription;
use crate::domain::ports::{PanelClient, PanelSession};
use crate::error::{UpstreamError, UpstreamService};

/// Implementation of the XBoard panel client
pub struct XBoardPanelClient {
    http: Client,
    api_timeout: Duration,
    fetch_timeout: Duration,
}

impl XBoardPanelClient {
    pub fn new(http: Client, api_timeout: Duration, fetch_timeout: Duration) -> Self {
        Self {
            http,
            api_timeout,
            fetch_timeout,
        }
    }

    fn request(&self, method: Method, url: &str, session: &PanelSession) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_AGENT, session.user_agent.as_str())
            .timeout(self.api_timeout)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        service: UpstreamService,
        action: &'static str,
    ) -> Result<Response, UpstreamError> {
        let response = request.send().await.map_err(|source| {
            tracing::warn!(error = %source, %service, "panel request failed");
            UpstreamError::Connect { service, source }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::warn!(status = status.as_u16(), %service, "panel returned an error status");
            Err(UpstreamError::Status {
                action,
                status: status.as_u16(),
            })
        }
    }

    async fn data<T: DeserializeOwned + Default>(
        response: Response,
        service: UpstreamService,
    ) -> Result<T, UpstreamError> {
        response
            .json::<PanelResponse<T>>()
            .await
            .map(|body| body.data.unwrap_or_default())
            .map_err(|_| UpstreamError::InvalidJson(service))
    }
}

/// Request types for the panel API
#[derive(Serialize)]
struct LoginForm<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct UnlockForm<'a> {
    #[serde(rename = "use")]
    tag: &'a str,
}

/// Response types from the panel API
#[derive(Deserialize)]
struct PanelResponse<T> {
    #[serde(default)]
    data: Option<T>,
}

#[derive(Default, Deserialize)]
struct LoginData {
    #[serde(default)]
    auth_data: Option<String>,
}

#[derive(Default, Deserialize)]
struct SubscribeData {
    #[serde(default)]
    subscribe_url: Option<String>,
}

#[async_trait]
impl PanelClient for XBoardPanelClient {
    async fn login(
        &self,
        session: &PanelSession,
        email: &str,
        password: &str,
    ) -> Result<String, UpstreamError> {
        let request = self
            .request(
                Method::POST,
                &session.api_url("/passport/auth/login"),
                session,
            )
            .form(&LoginForm { email, password });
        let response = self
            .send(
                request,
                UpstreamService::Authentication,
                "Authentication request failed",
            )
            .await?;

        let data: LoginData = Self::data(response, UpstreamService::Authentication).await?;
        data.auth_data
            .filter(|token| !token.is_empty())
            .ok_or(UpstreamError::MissingField(
                "Authentication succeeded but token is missing in response",
            ))
    }

    async fn unlock_subscribe(
        &self,
        session: &PanelSession,
        auth_data: &str,
        tag: &str,
    ) -> Result<bool, UpstreamError> {
        let request = self
            .request(Method::POST, &session.api_url("/user/bootstrap"), session)
            .header(AUTHORIZATION, auth_data)
            .form(&UnlockForm { tag });
        let response = self
            .send(
                request,
                UpstreamService::Subscription,
                "Failed to unlock subscription restrict",
            )
            .await?;

        let data: serde_json::Value = Self::data(response, UpstreamService::Subscription).await?;
        Ok(data.as_f64() == Some(1.0) || data == serde_json::Value::Bool(true))
    }

    async fn get_subscribe_url(
        &self,
        session: &PanelSession,
        auth_data: &str,
    ) -> Result<String, UpstreamError> {
        let request = self
            .request(Method::GET, &session.api_url("/user/getSubscribe"), session)
            .header(AUTHORIZATION, auth_data);
        let response = self
            .send(
                request,
                UpstreamService::Subscription,
                "Failed to fetch subscription information",
            )
            .await?;

        let data: SubscribeData = Self::data(response, UpstreamService::Subscription).await?;
        data.subscribe_url
            .filter(|url| !url.is_empty())
            .ok_or(UpstreamError::MissingField(
                "Subscription URL not found in response",
            ))
    }

    async fn fetch_subscription(
        &self,
        session: &PanelSession,
        url: &str,
    ) -> Result<Subscription, UpstreamError> {
        let request = self
            .request(Method::GET, url, session)
            .timeout(self.fetch_timeout);
        let response = self
            .send(
                request,
                UpstreamService::Subscription,
                "Failed to fetch subscription content",
            )
            .await?;

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::Connect {
                service: UpstreamService::Subscription,
                source,
            })?;

        tracing::debug!(bytes = body.len(), "subscription fetched");
        Ok(Subscription::from_upstream(body, &headers))
    }
}
