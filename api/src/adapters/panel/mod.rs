//! Panel adapter
//!
//! reqwest implementation of the XBoard panel API.

pub mod client;

pub use client::XBoardPanelClient;
