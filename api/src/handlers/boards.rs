//! Board handlers
//!
//! The root listing, per-board retrieval and the catch-all for unknown routes.

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::entities::{QueryParams, RequestContext};
use crate::error::AppError;
use crate::AppState;

/// Content type for subscriptions whose upstream did not name one
const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Response body for the board listing
#[derive(Debug, Serialize)]
pub struct BoardListResponse {
    pub code: u16,
    pub boards: Vec<String>,
}

/// GET /
///
/// Lists every registered board id in registration order.
pub async fn list_boards(State(state): State<AppState>) -> Json<BoardListResponse> {
    Json(BoardListResponse {
        code: StatusCode::OK.as_u16(),
        boards: state.registry.ids(),
    })
}

/// GET /board/:id
///
/// Validates the query against the board's schema and returns the subscription
/// verbatim, or the error envelope with the board's help on failure.
#[tracing::instrument(name = "get_board", skip_all, fields(board = tracing::field::Empty))]
pub async fn get_board(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = match path {
        Ok(Path(id)) => id,
        // An id that is not valid UTF-8 cannot name a board
        Err(rejection) => {
            let board = board_segment(&uri);
            tracing::debug!(board = %board, error = %rejection, "undecodable board id");
            return Err(AppError::BoardNotFound {
                board,
                available: state.registry.ids(),
            });
        }
    };
    tracing::Span::current().record("board", id.as_str());

    let ctx = RequestContext {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };

    let mut subscription = state
        .registry
        .retrieve(&id, &QueryParams::new(query), &ctx)
        .await?;

    subscription
        .headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    tracing::info!(bytes = subscription.body.len(), "subscription served");
    Ok((StatusCode::OK, subscription.headers, subscription.body).into_response())
}

/// The `:id` segment of a `/board/:id` path, percent-decoded lossily
fn board_segment(uri: &Uri) -> String {
    let raw = uri.path().strip_prefix("/board/").unwrap_or(uri.path());
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

/// Fallback for every route other than `/` and `/board/:id`
pub async fn not_found(State(state): State<AppState>, uri: Uri) -> AppError {
    AppError::RouteNotFound {
        path: uri.path().to_string(),
        available: state.registry.ids(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_segment_decodes_lossily() {
        let uri: Uri = "/board/x%FFboard".parse().unwrap();
        assert_eq!(board_segment(&uri), "x\u{FFFD}board");

        let uri: Uri = "/board/xboard".parse().unwrap();
        assert_eq!(board_segment(&uri), "xboard");
    }
}
