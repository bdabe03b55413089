//! Board port trait
//!
//! The single capability every board provides: given validated parameters,
//! produce subscription content or fail.

use async_trait::async_trait;

use crate::domain::entities::{BoardDescriptor, RequestContext, Subscription, ValidatedParams};
use crate::error::BoardError;

#[async_trait]
pub trait SubscriptionBoard: Send + Sync {
    /// Static descriptor: id, description and parameter schema.
    fn descriptor(&self) -> &BoardDescriptor;

    /// Board-specific adjustments after schema validation.
    fn normalize(&self, _params: &mut ValidatedParams, _ctx: &RequestContext) {}

    /// Fetch or assemble the subscription.
    async fn construct(&self, params: &ValidatedParams) -> Result<Subscription, BoardError>;
}
