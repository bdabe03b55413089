//! Board registry
//!
//! Maps board ids to their handlers in registration order and runs the
//! validate -> normalize -> construct flow for a request.

use std::sync::Arc;

use indexmap::IndexMap;

use super::boards::{AladdinNetwork, Netsyo, XBoard};
use crate::domain::entities::{QueryParams, RequestContext, Subscription};
use crate::domain::ports::{DnsResolver, PanelClient, SubscriptionBoard};
use crate::error::AppError;

#[derive(Default, Clone)]
pub struct BoardRegistry {
    boards: IndexMap<String, Arc<dyn SubscriptionBoard>>,
}

impl BoardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every board this service ships, wired to the given adapters.
    pub fn standard<P, R>(panel: Arc<P>, resolver: Arc<R>) -> Self
    where
        P: PanelClient + 'static,
        R: DnsResolver + 'static,
    {
        Self::new()
            .with_board(Arc::new(XBoard::new(panel.clone())))
            .with_board(Arc::new(Netsyo::new(panel.clone())))
            .with_board(Arc::new(AladdinNetwork::new(panel, resolver)))
    }

    /// Register a board. A later board with the same id replaces the earlier one in place.
    pub fn with_board(mut self, board: Arc<dyn SubscriptionBoard>) -> Self {
        let id = board.descriptor().id.clone();
        if self.boards.insert(id.clone(), board).is_some() {
            tracing::warn!(board = %id, "board registered twice, keeping the last one");
        }
        self
    }

    /// Board ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.boards.keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn SubscriptionBoard>> {
        self.boards.get(id)
    }

    /// Validate the query against the board's schema and, if it passes, run the board.
    ///
    /// The board is never invoked when validation reports problems.
    pub async fn retrieve(
        &self,
        id: &str,
        query: &QueryParams,
        ctx: &RequestContext,
    ) -> Result<Subscription, AppError> {
        let board = self.get(id).ok_or_else(|| AppError::BoardNotFound {
            board: id.to_string(),
            available: self.ids(),
        })?;
        let descriptor = board.descriptor();

        let mut params = descriptor
            .validate(query)
            .map_err(|details| AppError::InvalidParams {
                details,
                help: descriptor.help(),
            })?;
        board.normalize(&mut params, ctx);

        tracing::debug!(
            board = %id,
            params = ?params.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            "constructing subscription"
        );

        board
            .construct(&params)
            .await
            .map_err(|source| AppError::Board {
                source,
                help: descriptor.help(),
            })
    }
}
