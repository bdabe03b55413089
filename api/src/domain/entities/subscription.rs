//! Subscription content returned to callers

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

/// Upstream headers subscription clients read, passed through verbatim
pub const PASSTHROUGH_HEADERS: &[&str] = &[
    "content-type",
    "content-disposition",
    "subscription-userinfo",
    "profile-update-interval",
    "profile-title",
    "profile-web-page-url",
    "support-url",
];

/// A subscription feed: raw body plus the headers that travel with it
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl Subscription {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Build from an upstream response, keeping only passthrough headers.
    pub fn from_upstream(body: impl Into<Bytes>, upstream: &HeaderMap) -> Self {
        let mut headers = HeaderMap::new();
        for name in PASSTHROUGH_HEADERS {
            for value in upstream.get_all(*name) {
                headers.append(HeaderName::from_static(*name), value.clone());
            }
        }

        Self {
            body: body.into(),
            headers,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body, keeping the headers. Content type is overridden.
    pub fn with_body(self, body: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            body: body.into(),
            headers: self.headers,
        }
        .with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }
}
