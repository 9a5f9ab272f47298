//! # Delivery After Finalization
//!
//! Token issuance, email notification, token-gated download and the
//! resulting audit trail.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, DOC_NUMBER};
    use chrono::Duration;
    use delivery_runtime::HandlerError;
    use sd_03_access_tokens::{TokenKind, ValidationCode};
    use sd_05_finalization::RecordingNotifier;
    use shared_types::Clock;

    async fn wait_for_notice(notifier: &RecordingNotifier) {
        for _ in 0..200 {
            if !notifier.notices().is_empty() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_email_delivery_end_to_end() {
        let f = Fixture::new();
        let record = f.finalized_delivery(Some("jane@example.com"), 3).await;

        let tokens = f.runtime.tokens.tokens_for(record.id).await.unwrap();
        assert_eq!(tokens.len(), 2);
        let pickup = tokens.iter().find(|t| t.kind == TokenKind::Pickup).unwrap();
        let email = tokens.iter().find(|t| t.kind == TokenKind::Email).unwrap();
        assert_ne!(pickup.token, email.token);
        assert_eq!(pickup.token.len(), 64);
        assert_eq!(pickup.expires_at - pickup.created_at, Duration::hours(24));
        assert_eq!(email.expires_at - email.created_at, Duration::days(7));

        wait_for_notice(&f.notifier).await;
        let notices = f.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].recipient, "jane@example.com");
        assert_eq!(notices[0].doc_number.as_deref(), Some(DOC_NUMBER));
        assert_eq!(
            notices[0].download_url,
            format!("http://localhost:3000/download/{}", email.token)
        );

        let downloads = f.runtime.download_handlers();
        let response = downloads.download(&email.token).await.unwrap();
        assert_eq!(
            response.content_disposition,
            format!("attachment; filename=\"{}.pdf\"", DOC_NUMBER)
        );
        let final_bytes = f
            .runtime
            .artifacts
            .get(record.final_doc_ref.as_ref().unwrap())
            .await
            .unwrap();
        assert_eq!(response.body, final_bytes);

        // The pickup token has expired; the emailed one still works.
        f.clock.advance(Duration::days(2));
        assert!(matches!(
            downloads.download(&pickup.token).await,
            Err(HandlerError::TokenRejected {
                code: ValidationCode::Expired
            })
        ));
        downloads.download(&email.token).await.unwrap();

        downloads.revoke(&email.token).await.unwrap();
        assert!(matches!(
            downloads.info(&email.token).await,
            Err(HandlerError::TokenRejected {
                code: ValidationCode::Revoked
            })
        ));

        let trail: Vec<&str> = f
            .audit
            .events_for(record.id)
            .iter()
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            trail,
            vec![
                "original_uploaded",
                "signature_uploaded",
                "finalization_started",
                "finalized",
                "document_downloaded",
                "document_downloaded",
                "token_revoked",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_email_means_pickup_only() {
        let f = Fixture::new();
        let record = f.finalized_delivery(None, 1).await;

        let tokens = f.runtime.tokens.tokens_for(record.id).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Pickup);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_used_at_set_once_and_token_stays_valid() {
        let f = Fixture::new();
        let record = f.finalized_delivery(None, 2).await;
        let pickup = f.runtime.tokens.tokens_for(record.id).await.unwrap().remove(0);
        let downloads = f.runtime.download_handlers();

        downloads.download(&pickup.token).await.unwrap();
        let first_use = f.clock.now();
        for _ in 0..3 {
            f.clock.advance(Duration::minutes(10));
            downloads.download(&pickup.token).await.unwrap();
        }

        let stored = f.runtime.tokens.tokens_for(record.id).await.unwrap().remove(0);
        assert_eq!(stored.used_at, Some(first_use));
        assert!(stored.revoked_at.is_none());
        assert_eq!(f.audit.count(record.id, "document_downloaded"), 4);
    }
}
