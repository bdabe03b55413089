//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod boards;

pub use boards::{get_board, list_boards, not_found};
