use crate::error::NotificationError;
use crate::ports::{DeliveryNotifier, FinalizationNotice};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Notifier that only logs. Used when no outbound mail channel is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl DeliveryNotifier for TracingNotifier {
    async fn delivery_finalized(&self, notice: FinalizationNotice) -> Result<(), NotificationError> {
        info!(
            delivery_id = %notice.delivery_id,
            recipient = %notice.recipient,
            download_url = %notice.download_url,
            "[sd-05] Delivery notification"
        );
        Ok(())
    }
}

/// Notifier that keeps every notice, optionally failing each call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<FinalizationNotice>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call records the notice and then fails.
    pub fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn notices(&self) -> Vec<FinalizationNotice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl DeliveryNotifier for RecordingNotifier {
    async fn delivery_finalized(&self, notice: FinalizationNotice) -> Result<(), NotificationError> {
        self.notices.lock().push(notice);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError {
                reason: "mail relay unavailable".to_string(),
            });
        }
        Ok(())
    }
}
