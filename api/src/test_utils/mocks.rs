//! Mock implementations of port traits
//!
//! In-memory implementations that can be configured for testing and that
//! record how they were called.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderName, HeaderValue};

use crate::domain::entities::{
    BoardDescriptor, ParamSpec, RequestContext, Subscription, ValidatedParams,
};
use crate::domain::ports::{DnsResolver, PanelClient, PanelSession, SubscriptionBoard};
use crate::error::{BoardError, ResolveError, UpstreamError};

// ============================================================================
// Mock Panel Client
// ============================================================================

/// Step of the panel flow a mock can be told to fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStage {
    Login,
    Unlock,
    GetSubscribe,
    Fetch,
}

impl PanelStage {
    fn action(self) -> &'static str {
        match self {
            PanelStage::Login => "Authentication request failed",
            PanelStage::Unlock => "Failed to unlock subscription restrict",
            PanelStage::GetSubscribe => "Failed to fetch subscription information",
            PanelStage::Fetch => "Failed to fetch subscription content",
        }
    }
}

/// A call observed by the mock panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCall {
    Login {
        base_url: String,
        user_agent: String,
        email: String,
    },
    Unlock {
        auth_data: String,
        tag: String,
    },
    GetSubscribe {
        auth_data: String,
    },
    Fetch {
        url: String,
    },
}

pub struct MockPanelClient {
    subscribe_url: String,
    content: Bytes,
    unlock: bool,
    failing_at: Option<PanelStage>,
    calls: Arc<RwLock<Vec<PanelCall>>>,
}

impl Default for MockPanelClient {
    fn default() -> Self {
        Self {
            subscribe_url: "https://sub.example/api/v1/client/subscribe?token=mock".to_string(),
            content: Bytes::from_static(b"ss://mock"),
            unlock: true,
            failing_at: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockPanelClient {
    pub const AUTH_DATA: &'static str = "Bearer mock-token";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribe_url(mut self, url: &str) -> Self {
        self.subscribe_url = url.to_string();
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = Bytes::copy_from_slice(content.as_bytes());
        self
    }

    pub fn with_content_bytes(mut self, content: &[u8]) -> Self {
        self.content = Bytes::copy_from_slice(content);
        self
    }

    pub fn with_unlock(mut self, unlock: bool) -> Self {
        self.unlock = unlock;
        self
    }

    /// Answer the given stage with a 403
    pub fn failing_at(mut self, stage: PanelStage) -> Self {
        self.failing_at = Some(stage);
        self
    }

    pub fn calls(&self) -> Vec<PanelCall> {
        self.calls.read().unwrap().clone()
    }

    fn record(&self, call: PanelCall, stage: PanelStage) -> Result<(), UpstreamError> {
        self.calls.write().unwrap().push(call);
        if self.failing_at == Some(stage) {
            return Err(UpstreamError::Status {
                action: stage.action(),
                status: 403,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PanelClient for MockPanelClient {
    async fn login(
        &self,
        session: &PanelSession,
        email: &str,
        _password: &str,
    ) -> Result<String, UpstreamError> {
        self.record(
            PanelCall::Login {
                base_url: session.base_url.clone(),
                user_agent: session.user_agent.clone(),
                email: email.to_string(),
            },
            PanelStage::Login,
        )?;
        Ok(Self::AUTH_DATA.to_string())
    }

    async fn unlock_subscribe(
        &self,
        _session: &PanelSession,
        auth_data: &str,
        tag: &str,
    ) -> Result<bool, UpstreamError> {
        self.record(
            PanelCall::Unlock {
                auth_data: auth_data.to_string(),
                tag: tag.to_string(),
            },
            PanelStage::Unlock,
        )?;
        Ok(self.unlock)
    }

    async fn get_subscribe_url(
        &self,
        _session: &PanelSession,
        auth_data: &str,
    ) -> Result<String, UpstreamError> {
        self.record(
            PanelCall::GetSubscribe {
                auth_data: auth_data.to_string(),
            },
            PanelStage::GetSubscribe,
        )?;
        Ok(self.subscribe_url.clone())
    }

    async fn fetch_subscription(
        &self,
        _session: &PanelSession,
        url: &str,
    ) -> Result<Subscription, UpstreamError> {
        self.record(
            PanelCall::Fetch {
                url: url.to_string(),
            },
            PanelStage::Fetch,
        )?;
        Ok(Subscription::new(self.content.clone()).with_header(
            HeaderName::from_static("subscription-userinfo"),
            HeaderValue::from_static("upload=0; download=0; total=1073741824; expire=0"),
        ))
    }
}

// ============================================================================
// Mock DNS Resolver
// ============================================================================

#[derive(Default)]
pub struct MockResolver {
    answers: HashMap<String, Vec<Ipv4Addr>>,
    queries: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, domain: &str, ips: &[&str]) -> Self {
        self.answers.insert(
            domain.to_string(),
            ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        );
        self
    }

    /// (nameserver, domain) pairs in query order
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl DnsResolver for MockResolver {
    async fn resolve_ipv4(
        &self,
        nameserver: &str,
        domain: &str,
    ) -> Result<Vec<Ipv4Addr>, ResolveError> {
        self.queries
            .write()
            .unwrap()
            .push((nameserver.to_string(), domain.to_string()));

        self.answers
            .get(domain)
            .cloned()
            .ok_or_else(|| ResolveError::NoRecords {
                domain: domain.to_string(),
                server: nameserver.to_string(),
            })
    }
}

// ============================================================================
// Static Board
// ============================================================================

/// Board answering `name=<name>;mode=<mode>` without any upstream
pub struct StaticBoard {
    descriptor: BoardDescriptor,
    failing: bool,
    invocations: AtomicUsize,
}

impl StaticBoard {
    pub fn new(id: &str, description: &str) -> Self {
        let descriptor = BoardDescriptor::new(id, description)
            .param(
                "name",
                ParamSpec::required()
                    .with_example("alice")
                    .with_description("Who the feed is for"),
            )
            .param(
                "mode",
                ParamSpec::optional()
                    .with_default("plain")
                    .with_available(&["plain", "upper"]),
            );

        Self {
            descriptor,
            failing: false,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Fail every construct call with `BoardError::Locked`
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionBoard for StaticBoard {
    fn descriptor(&self) -> &BoardDescriptor {
        &self.descriptor
    }

    fn normalize(&self, params: &mut ValidatedParams, _ctx: &RequestContext) {
        if params.get("mode") == Some("upper") {
            let upper = params.value("name").to_uppercase();
            params.insert("name", upper);
        }
    }

    async fn construct(&self, params: &ValidatedParams) -> Result<Subscription, BoardError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(BoardError::Locked);
        }

        let body = format!("name={};mode={}", params.value("name"), params.value("mode"));
        Ok(Subscription::new(body).with_header(
            HeaderName::from_static("profile-title"),
            HeaderValue::from_str(params.value("name")).unwrap(),
        ))
    }
}
