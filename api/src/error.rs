//! Unified error types for the SubBoard API
//!
//! This module defines error types for each layer:
//! - `UpstreamError`: subscription panel API errors
//! - `ResolveError`: nameserver lookups used by the Clash rewriter
//! - `TransformError`: subscription content rewriting errors
//! - `BoardError`: everything a board handler can fail with
//! - `AppError`: errors returned by HTTP handlers, rendered as the JSON envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::BoardHelp;

/// Which upstream service a panel call was talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Authentication,
    Subscription,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamService::Authentication => write!(f, "authentication service"),
            UpstreamService::Subscription => write!(f, "subscription service"),
        }
    }
}

/// Subscription panel API errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Unable to connect to {service}")]
    Connect {
        service: UpstreamService,
        #[source]
        source: reqwest::Error,
    },

    #[error("{action}, server return status code {status}.")]
    Status { action: &'static str, status: u16 },

    #[error("Invalid JSON response from {0}")]
    InvalidJson(UpstreamService),

    #[error("{0}")]
    MissingField(&'static str),

    #[error("Invalid subscription URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Connect { .. } | UpstreamError::InvalidJson(_) => {
                StatusCode::BAD_GATEWAY
            }
            UpstreamError::Status { .. }
            | UpstreamError::MissingField(_)
            | UpstreamError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Nameserver lookup errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Rcode type detected: {0}, cannot resolve IP.")]
    Rcode(String),

    #[error("System/DHCP type detected: {0}, cannot resolve IP.")]
    System(String),

    #[error("Invalid port in DNS server: {0}")]
    InvalidPort(String),

    #[error("Invalid DNS server address: {0}")]
    InvalidAddress(String),

    #[error("Unknown protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("No A records found for {domain} via {server}")]
    NoRecords { domain: String, server: String },

    #[error("DNS query failed for {domain} via {server}: {reason}")]
    Query {
        domain: String,
        server: String,
        reason: String,
    },
}

/// Subscription content rewriting errors
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to decode subscribe content as UTF-8.")]
    Decode(#[source] std::str::Utf8Error),

    #[error("Failed to parse YAML subscribe content.")]
    Parse(#[source] serde_yaml::Error),

    #[error("dns.nameserver-policy is missing in YAML configuration.")]
    MissingNameserverPolicy,

    #[error("proxies list is missing or invalid in YAML configuration")]
    MissingProxies,

    #[error("Failed to replace the domain with an IP address: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Failed to serialize YAML subscribe content.")]
    Serialize(#[source] serde_yaml::Error),
}

/// Errors a board handler can produce while building a subscription
#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Failed to unlock subscription restrict")]
    Locked,
}

impl BoardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoardError::Upstream(e) => e.status_code(),
            BoardError::Transform(_) | BoardError::Locked => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Machine-readable error codes carried in error details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Missing,
    Invalid,
    BoardNotFound,
    NotFound,
    Upstream,
}

/// One entry of the `details` list in an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub error: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ErrorDetail {
    pub fn missing(param: &str) -> Self {
        Self {
            error: ErrorCode::Missing,
            message: "parameter is required".to_string(),
            param: Some(param.to_string()),
            value: None,
        }
    }

    pub fn invalid(param: &str, value: &str, available: &[String]) -> Self {
        Self {
            error: ErrorCode::Invalid,
            message: format!("must be one of [{}]", available.join(", ")),
            param: Some(param.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn plain(error: ErrorCode, message: String) -> Self {
        Self {
            error,
            message,
            param: None,
            value: None,
        }
    }
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Board not found: {board}")]
    BoardNotFound {
        board: String,
        available: Vec<String>,
    },

    #[error("Route not found: {path}")]
    RouteNotFound {
        path: String,
        available: Vec<String>,
    },

    #[error("Invalid query parameters for board {}", .help.name)]
    InvalidParams {
        details: Vec<ErrorDetail>,
        help: BoardHelp,
    },

    #[error("Board {} failed: {source}", .help.name)]
    Board {
        #[source]
        source: BoardError,
        help: BoardHelp,
    },
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: &'static str,
    details: Vec<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<BoardHelp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_boards: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BoardNotFound { board, available } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    code: StatusCode::NOT_FOUND.as_u16(),
                    error: "board_not_found",
                    details: vec![ErrorDetail::plain(
                        ErrorCode::BoardNotFound,
                        format!("board '{}' is not registered", board),
                    )],
                    help: None,
                    available: Some(available),
                    available_boards: None,
                },
            ),
            AppError::RouteNotFound { path, available } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    code: StatusCode::NOT_FOUND.as_u16(),
                    error: "not_found",
                    details: vec![ErrorDetail::plain(
                        ErrorCode::NotFound,
                        format!("no route for {}", path),
                    )],
                    help: None,
                    available: None,
                    available_boards: Some(available),
                },
            ),
            AppError::InvalidParams { details, help } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    code: StatusCode::BAD_REQUEST.as_u16(),
                    error: "invalid_query_params",
                    details,
                    help: Some(help),
                    available: None,
                    available_boards: None,
                },
            ),
            AppError::Board { source, help } => {
                let status = source.status_code();
                tracing::error!(board = %help.name, error = ?source, "board handler failed");
                (
                    status,
                    ErrorResponse {
                        code: status.as_u16(),
                        error: "upstream_error",
                        details: vec![ErrorDetail::plain(ErrorCode::Upstream, source.to_string())],
                        help: Some(help),
                        available: None,
                        available_boards: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_mapping() {
        assert_eq!(
            UpstreamError::Status {
                action: "Authentication request failed",
                status: 403,
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            UpstreamError::InvalidJson(UpstreamService::Subscription).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            UpstreamError::MissingField("Subscription URL not found in response").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_messages() {
        let err = UpstreamError::Status {
            action: "Authentication request failed",
            status: 401,
        };
        assert_eq!(
            err.to_string(),
            "Authentication request failed, server return status code 401."
        );
        assert_eq!(
            UpstreamError::InvalidJson(UpstreamService::Authentication).to_string(),
            "Invalid JSON response from authentication service"
        );
    }

    #[test]
    fn board_error_status() {
        assert_eq!(
            BoardError::Locked.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BoardError::from(TransformError::MissingProxies).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BoardError::from(UpstreamError::InvalidJson(UpstreamService::Subscription))
                .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn transform_resolve_message() {
        let err = TransformError::from(ResolveError::Rcode("rcode://refused".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to replace the domain with an IP address: Rcode type detected: rcode://refused, cannot resolve IP."
        );
    }

    #[test]
    fn missing_detail_names_param() {
        let detail = ErrorDetail::missing("email");
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["error"], "missing");
        assert_eq!(json["param"], "email");
        assert_eq!(json["message"], "parameter is required");
        assert!(json.get("value").is_none());
    }

    #[test]
    fn invalid_detail_lists_available() {
        let available = vec!["clash".to_string(), "surge".to_string()];
        let detail = ErrorDetail::invalid("flag", "qx", &available);
        assert_eq!(detail.error, ErrorCode::Invalid);
        assert_eq!(detail.message, "must be one of [clash, surge]");
        assert_eq!(detail.value.as_deref(), Some("qx"));
    }

    #[test]
    fn board_not_found_response_is_404() {
        let response = AppError::BoardNotFound {
            board: "nope".to_string(),
            available: vec!["xboard".to_string()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
