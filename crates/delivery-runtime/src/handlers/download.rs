//! # Download Handlers
//!
//! Token-gated access to the final document.
//!
//! | Token state | Result |
//! |-------------|--------|
//! | unknown | `NOT_FOUND` (404) |
//! | revoked | `REVOKED` (410) |
//! | expired | `EXPIRED` (410) |
//! | valid | document bytes, first use recorded |

use super::record_audit;
use crate::container::DeliveryRuntime;
use crate::error::{HandlerError, HandlerResult};
use sd_01_artifact_store::ArtifactError;
use sd_03_access_tokens::{AccessToken, TokenValidation};
use sd_04_audit_log::AuditPayload;
use sd_05_finalization::RepositoryError;
use shared_types::{ActorKind, DeliveryId, DeliveryRecord, Timestamp};
use tracing::{info, warn};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A final document ready to be streamed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub body: Vec<u8>,
    pub content_type: String,
    pub content_disposition: String,
    pub content_length: u64,
}

impl DownloadResponse {
    fn pdf(body: Vec<u8>, stem: &str) -> Self {
        Self {
            content_length: body.len() as u64,
            body,
            content_type: PDF_CONTENT_TYPE.to_string(),
            content_disposition: format!("attachment; filename=\"{}.pdf\"", header_safe(stem)),
        }
    }
}

/// Quoted-string safe file name.
fn header_safe(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Public summary shown before downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySummary {
    pub delivery_id: DeliveryId,
    pub doc_number: Option<String>,
    pub business_name: String,
    pub signer_name: String,
    pub finalized_at: Option<Timestamp>,
    /// Expiry of the presented token.
    pub expires_at: Timestamp,
}

/// Handlers keyed by access token.
#[derive(Clone)]
pub struct DownloadHandlers {
    runtime: DeliveryRuntime,
}

impl DownloadHandlers {
    pub fn new(runtime: DeliveryRuntime) -> Self {
        Self { runtime }
    }

    /// Serve the final document for `token`.
    pub async fn download(&self, token: &str) -> HandlerResult<DownloadResponse> {
        let access = self.valid_token(token).await?;
        let record = self.delivery(&access).await?;
        let final_ref = record
            .final_doc_ref
            .as_ref()
            .ok_or(HandlerError::DocumentUnavailable { id: record.id })?;

        let body = match self.runtime.artifacts.get(final_ref).await {
            Ok(body) => body,
            Err(ArtifactError::NotFound { .. }) => {
                return Err(HandlerError::DocumentUnavailable { id: record.id })
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.runtime.tokens.record_download(token).await {
            warn!(delivery_id = %record.id, error = %e, "[runtime] Failed to record token use");
        }
        record_audit(
            &self.runtime,
            record.tenant_id,
            record.id,
            ActorKind::Client,
            AuditPayload::DocumentDownloaded {
                token_kind: access.kind.as_str().to_string(),
            },
        )
        .await;

        info!(delivery_id = %record.id, kind = %access.kind, size = body.len(), "[runtime] Document downloaded");
        Ok(DownloadResponse::pdf(body, &record.download_stem()))
    }

    /// Public summary for `token` without downloading.
    pub async fn info(&self, token: &str) -> HandlerResult<DeliverySummary> {
        let access = self.valid_token(token).await?;
        let record = self.delivery(&access).await?;
        Ok(DeliverySummary {
            delivery_id: record.id,
            doc_number: record.doc_number,
            business_name: record.business_name,
            signer_name: record.signer_name,
            finalized_at: record.finalized_at,
            expires_at: access.expires_at,
        })
    }

    /// Revoke `token` on behalf of an employee.
    pub async fn revoke(&self, token: &str) -> HandlerResult<AccessToken> {
        let revoked = self
            .runtime
            .tokens
            .revoke(token)
            .await?
            .ok_or(HandlerError::TokenRejected {
                code: sd_03_access_tokens::ValidationCode::NotFound,
            })?;

        record_audit(
            &self.runtime,
            revoked.tenant_id,
            revoked.delivery_id,
            ActorKind::Employee,
            AuditPayload::TokenRevoked {
                token_kind: revoked.kind.as_str().to_string(),
            },
        )
        .await;
        Ok(revoked)
    }

    async fn valid_token(&self, token: &str) -> HandlerResult<AccessToken> {
        match self.runtime.tokens.validate(token).await? {
            TokenValidation::Valid(access) => Ok(access),
            rejected => Err(HandlerError::TokenRejected {
                code: rejected.code(),
            }),
        }
    }

    async fn delivery(&self, access: &AccessToken) -> HandlerResult<DeliveryRecord> {
        match self.runtime.repository.load(access.delivery_id).await {
            Ok(record) => Ok(record),
            Err(RepositoryError::NotFound { id }) => Err(HandlerError::DeliveryNotFound { id }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::RuntimeConfig;
    use chrono::{Duration, TimeZone, Utc};
    use sd_02_document_composer::test_utils::{sample_pdf, sample_signature_png};
    use sd_03_access_tokens::{TokenKind, ValidationCode};
    use sd_05_finalization::TryFinalizeOutcome;
    use shared_types::{Clock, ManualClock, TenantId};
    use std::sync::Arc;

    struct Fixture {
        runtime: DeliveryRuntime,
        clock: Arc<ManualClock>,
        record: DeliveryRecord,
        pickup: AccessToken,
    }

    async fn finalized(doc_number: Option<&str>) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
        ));
        let runtime = DeliveryRuntime::in_memory(RuntimeConfig::default(), clock.clone());
        let mut record = DeliveryRecord::new(TenantId::new(), "Acme Supplies", "Jane Roe", clock.now());
        if let Some(doc) = doc_number {
            record = record.with_doc_number(doc);
        }
        runtime.repository.insert(record.clone()).await.unwrap();

        let handlers = runtime.upload_handlers();
        handlers
            .original_received(record.id, sample_pdf(3), "application/pdf")
            .await
            .unwrap();
        let receipt = handlers
            .signature_received(record.id, sample_signature_png(100, 40), "image/png")
            .await
            .unwrap();
        let pickup = match receipt.finalization {
            TryFinalizeOutcome::Finalized(report) => report.pickup_token.unwrap(),
            other => panic!("unexpected {:?}", other),
        };

        Fixture {
            runtime,
            clock,
            record,
            pickup,
        }
    }

    #[tokio::test]
    async fn test_download_headers_and_first_use() {
        let f = finalized(Some("ALB-2026-001")).await;
        let handlers = f.runtime.download_handlers();

        let response = handlers.download(&f.pickup.token).await.unwrap();
        assert_eq!(response.content_type, "application/pdf");
        assert_eq!(
            response.content_disposition,
            "attachment; filename=\"ALB-2026-001.pdf\""
        );
        assert_eq!(response.content_length, response.body.len() as u64);
        assert!(response.body.starts_with(b"%PDF-"));

        let used_at = f.runtime.tokens.tokens_for(f.record.id).await.unwrap()[0].used_at;
        assert_eq!(used_at, Some(f.clock.now()));

        f.clock.advance(Duration::hours(1));
        handlers.download(&f.pickup.token).await.unwrap();
        let tokens = f.runtime.tokens.tokens_for(f.record.id).await.unwrap();
        assert_eq!(tokens[0].used_at, used_at);
    }

    #[tokio::test]
    async fn test_filename_falls_back_to_delivery_id() {
        let f = finalized(None).await;
        let response = f
            .runtime
            .download_handlers()
            .download(&f.pickup.token)
            .await
            .unwrap();
        assert_eq!(
            response.content_disposition,
            format!("attachment; filename=\"{}.pdf\"", f.record.id)
        );
    }

    #[tokio::test]
    async fn test_expired_revoked_and_unknown_tokens() {
        let f = finalized(Some("ALB-2026-001")).await;
        let handlers = f.runtime.download_handlers();

        let unknown = handlers.download("deadbeef").await.unwrap_err();
        assert!(matches!(
            unknown,
            HandlerError::TokenRejected {
                code: ValidationCode::NotFound
            }
        ));

        f.clock.advance(Duration::hours(24));
        assert!(matches!(
            handlers.info(&f.pickup.token).await,
            Err(HandlerError::TokenRejected {
                code: ValidationCode::Expired
            })
        ));

        let email = f
            .runtime
            .tokens
            .issue(f.record.id, f.record.tenant_id, TokenKind::Email, Duration::days(7))
            .await
            .unwrap();
        let revoked = handlers.revoke(&email.token).await.unwrap();
        assert!(revoked.revoked_at.is_some());
        let err = handlers.download(&email.token).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::TokenRejected {
                code: ValidationCode::Revoked
            }
        ));
        assert_eq!(err.status_code(), 410);
    }

    #[tokio::test]
    async fn test_info_summary() {
        let f = finalized(Some("ALB-2026-001")).await;
        let summary = f
            .runtime
            .download_handlers()
            .info(&f.pickup.token)
            .await
            .unwrap();
        assert_eq!(summary.doc_number.as_deref(), Some("ALB-2026-001"));
        assert_eq!(summary.business_name, "Acme Supplies");
        assert_eq!(summary.signer_name, "Jane Roe");
        assert!(summary.finalized_at.is_some());
        assert_eq!(summary.expires_at, f.pickup.expires_at);
    }

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe("A\"B/C\\D\n"), "A_B_C_D_");
    }
}
