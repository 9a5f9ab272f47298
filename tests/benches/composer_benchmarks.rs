//! # Signed-Delivery Composition Benchmarks
//!
//! | Operation | Input | Target |
//! |-----------|-------|--------|
//! | sd-02 compose | 1 to 100 page original | < 50ms at 10 pages |
//! | sd-02 sha256 | 20 MiB original (upload limit) | < 100ms |
//! | sd-02 page_count | 100 page final | < 10ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sd_02_document_composer::test_utils::{sample_pdf, sample_signature_png};
use sd_02_document_composer::{
    integrity, page_count, CertificationMetadata, ComposeRequest, DocumentComposer, PdfComposer,
};
use shared_types::DeliveryId;
use std::time::Duration;

fn request(pages: usize) -> ComposeRequest {
    ComposeRequest {
        original_pdf: sample_pdf(pages),
        signature_image: sample_signature_png(600, 240),
        metadata: CertificationMetadata {
            business_name: "Acme Supplies".to_string(),
            doc_number: Some("ALB-2026-001".to_string()),
            signer_name: "Jane Roe".to_string(),
            delivery_id: DeliveryId::new(),
            signed_at: chrono::Utc::now(),
            generated_at: chrono::Utc::now(),
        },
    }
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("sd-02-compose");
    group.measurement_time(Duration::from_secs(10));
    let composer = PdfComposer::new();

    for pages in [1usize, 10, 100] {
        let req = request(pages);
        group.throughput(Throughput::Elements(pages as u64));
        group.bench_with_input(BenchmarkId::new("compose", pages), &req, |b, req| {
            b.iter(|| black_box(composer.compose(req).map(|d| d.final_pages)))
        });
    }
    group.finish();
}

fn bench_integrity(c: &mut Criterion) {
    let mut group = c.benchmark_group("sd-02-integrity");
    let original = vec![0x25u8; 20 * 1024 * 1024];
    group.throughput(Throughput::Bytes(original.len() as u64));
    group.bench_function("sha256_20mib", |b| {
        b.iter(|| black_box(integrity::sha256_hex(&original)))
    });
    group.finish();
}

fn bench_page_count(c: &mut Criterion) {
    let composed = PdfComposer::new()
        .compose(&request(100))
        .map(|d| d.bytes)
        .unwrap_or_default();
    c.bench_function("sd-02-page-count-100", |b| {
        b.iter(|| black_box(page_count(&composed).ok()))
    });
}

criterion_group!(benches, bench_compose, bench_integrity, bench_page_count);
criterion_main!(benches);
