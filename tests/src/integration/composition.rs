//! # Composition Properties
//!
//! Page-count law, hash fidelity and the three-page `ALB-2026-001`
//! delivery, checked on the artifacts the runtime actually stored.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, BUSINESS, DOC_NUMBER, SIGNER};
    use lopdf::Document;
    use sd_02_document_composer::domain::layout::{BANNER, FOOTER_PREFIX};
    use sd_02_document_composer::test_utils::{page_texts, sample_pdf, sample_signature_png};
    use sd_02_document_composer::{
        integrity, page_count, CertificationMetadata, ComposeRequest, DocumentComposer,
        PdfComposer,
    };
    use shared_types::{DeliveryId, DeliveryRecord};

    async fn stored_pdfs(f: &Fixture, record: &DeliveryRecord) -> (Vec<u8>, Vec<u8>) {
        let original = f
            .runtime
            .artifacts
            .get(record.original_doc_ref.as_ref().unwrap())
            .await
            .unwrap();
        let final_pdf = f
            .runtime
            .artifacts
            .get(record.final_doc_ref.as_ref().unwrap())
            .await
            .unwrap();
        (original, final_pdf)
    }

    #[tokio::test]
    async fn test_three_page_delivery_scenario() {
        let f = Fixture::new();
        let record = f.finalized_delivery(None, 3).await;
        let (original, final_pdf) = stored_pdfs(&f, &record).await;
        let hash = record.original_hash.clone().unwrap();

        assert_eq!(page_count(&final_pdf).unwrap(), 4);

        let pages = page_texts(&final_pdf);
        let certification = &pages[3];
        assert!(certification.contains(BANNER));
        assert!(certification.contains(&hash));
        assert!(certification.contains(DOC_NUMBER));
        assert!(certification.contains(BUSINESS));
        assert!(certification.contains(SIGNER));
        assert!(certification.contains(&record.id.to_string()));
        assert!(certification.contains(FOOTER_PREFIX));

        let original_pages = page_texts(&original);
        assert_eq!(&pages[..3], &original_pages[..]);
        for (i, text) in pages[..3].iter().enumerate() {
            assert!(text.contains(&format!("Original page {}", i + 1)));
            assert!(!text.contains(BANNER));
        }
    }

    #[tokio::test]
    async fn test_hash_fidelity_against_stored_original() {
        let f = Fixture::new();
        let record = f.finalized_delivery(None, 2).await;
        let (original, _) = stored_pdfs(&f, &record).await;
        let recorded = record.original_hash.unwrap();

        assert_eq!(integrity::sha256_hex(&original), recorded);
        assert_eq!(integrity::sha256_hex(&sample_pdf(2)), recorded);
        assert!(integrity::verify(&original, &recorded.to_uppercase()));

        let mut tampered = original.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(!integrity::verify(&tampered, &recorded));
    }

    #[test]
    fn test_page_count_law() {
        let composer = PdfComposer::new();
        for pages in [1usize, 2, 5, 12] {
            let composed = composer
                .compose(&ComposeRequest {
                    original_pdf: sample_pdf(pages),
                    signature_image: sample_signature_png(300, 120),
                    metadata: CertificationMetadata {
                        business_name: BUSINESS.to_string(),
                        doc_number: Some(DOC_NUMBER.to_string()),
                        signer_name: SIGNER.to_string(),
                        delivery_id: DeliveryId::new(),
                        signed_at: chrono::Utc::now(),
                        generated_at: chrono::Utc::now(),
                    },
                })
                .unwrap();

            assert_eq!(composed.original_pages, pages);
            assert_eq!(composed.final_pages, pages + 1);
            assert_eq!(page_count(&composed.bytes).unwrap(), pages + 1);
            let texts = page_texts(&composed.bytes);
            assert!(texts[pages].contains(BANNER));
        }
    }

    #[tokio::test]
    async fn test_final_document_reopens_cleanly() {
        let f = Fixture::new();
        let record = f.finalized_delivery(None, 3).await;
        let (_, final_pdf) = stored_pdfs(&f, &record).await;

        let doc = Document::load_mem(&final_pdf).unwrap();
        assert!(doc.trailer.get(b"Encrypt").is_err());
        for page_id in doc.get_pages().into_values() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert!(page.get(b"MediaBox").is_ok());
            assert!(page.get(b"Resources").is_ok());
        }
    }
}
