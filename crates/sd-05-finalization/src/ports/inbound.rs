//! Inbound port: what upload handlers and the retry sweeper call.

use crate::domain::TryFinalizeOutcome;
use async_trait::async_trait;
use shared_types::DeliveryId;

/// Finalization entry point.
///
/// Safe to call any number of times, concurrently, in any order relative
/// to artifact arrival.
#[async_trait]
pub trait FinalizationApi: Send + Sync {
    async fn try_finalize(&self, id: DeliveryId) -> TryFinalizeOutcome;
}
