//! Domain entities
//!
//! Board descriptors, request parameters, nameservers and the subscription
//! content boards produce.

pub mod board;
pub mod nameserver;
pub mod params;
pub mod subscription;

pub use board::{BoardDescriptor, BoardHelp, ParamSpec};
pub use nameserver::Nameserver;
pub use params::{QueryParams, RequestContext, ValidatedParams};
pub use subscription::Subscription;
