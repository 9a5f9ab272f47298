//! # Retry Sweeper
//!
//! Periodically re-triggers finalization for every record that has both
//! artifacts but is not finalized. Covers transient failures after which no
//! further upload will arrive, and locks abandoned by crashed attempts once
//! they turn stale.
//!
//! Recently finalized records missing an access token, because issuance
//! failed after the commit, get the token reissued.

use sd_05_finalization::{DeliveryRepository, FinalizationCoordinator, TryFinalizeOutcome};
use shared_types::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Outcome counts of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub pending: usize,
    pub finalized: usize,
    pub lock_held: usize,
    pub failed: usize,
    /// Already finalized or no longer ready by the time it was tried.
    pub skipped: usize,
    /// Tokens issued for finalized records that were missing one.
    pub tokens_reissued: usize,
}

pub struct RetrySweeper {
    repository: Arc<dyn DeliveryRepository>,
    coordinator: Arc<FinalizationCoordinator>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl RetrySweeper {
    pub fn new(
        repository: Arc<dyn DeliveryRepository>,
        coordinator: Arc<FinalizationCoordinator>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            repository,
            coordinator,
            clock,
            interval,
        }
    }

    /// Try every pending record once, oldest first, then reissue missing
    /// tokens for records finalized within the email token lifetime.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        self.finalize_pending(&mut report).await;
        self.reissue_tokens(&mut report).await;
        report
    }

    async fn finalize_pending(&self, report: &mut SweepReport) {
        let pending = match self.repository.list_pending_finalization().await {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %e, "[sweeper] Failed to list pending deliveries");
                return;
            }
        };

        report.pending = pending.len();
        for record in pending {
            match self.coordinator.try_finalize(record.id).await {
                TryFinalizeOutcome::Finalized(_) => report.finalized += 1,
                TryFinalizeOutcome::LockHeld => report.lock_held += 1,
                TryFinalizeOutcome::Failed(_) => report.failed += 1,
                TryFinalizeOutcome::AlreadyFinalized | TryFinalizeOutcome::NotReady => {
                    report.skipped += 1
                }
            }
        }
    }

    async fn reissue_tokens(&self, report: &mut SweepReport) {
        let since = self.clock.now() - self.coordinator.config().email_token_ttl;
        let finalized = match self.repository.list_finalized_since(since).await {
            Ok(finalized) => finalized,
            Err(e) => {
                error!(error = %e, "[sweeper] Failed to list finalized deliveries");
                return;
            }
        };

        for record in finalized {
            match self.coordinator.reissue_missing_tokens(record.id).await {
                Ok(issued) => report.tokens_reissued += issued.len(),
                Err(e) => warn!(delivery_id = %record.id, error = %e, "[sweeper] Token reissue failed"),
            }
        }
    }

    /// Sweep every `interval` until `shutdown` flips to `true`.
    #[instrument(skip_all, name = "retry_sweeper")]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "[sweeper] Started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep_once().await;
                    if report.pending > 0 || report.tokens_reissued > 0 {
                        info!(
                            pending = report.pending,
                            finalized = report.finalized,
                            lock_held = report.lock_held,
                            failed = report.failed,
                            tokens_reissued = report.tokens_reissued,
                            "[sweeper] Sweep complete"
                        );
                    } else {
                        debug!("[sweeper] Nothing pending");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[sweeper] Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }
}
