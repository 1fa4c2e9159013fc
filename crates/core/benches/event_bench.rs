//! 이벤트 벤치마크
//!
//! LogEvent 식별자 계산, 직렬화, 복제 성능을 측정합니다.

use chrono::{TimeZone, Utc};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tailguard_core::event::LogEvent;
use tailguard_core::types::{AnalysisResult, Severity};

fn create_log_event() -> LogEvent {
    LogEvent::new(
        "PaymentService.Checkout",
        "Error",
        "Payment provider returned {StatusCode} for order {OrderId}",
        "System.TimeoutException: The operation has timed out.\n   at Checkout.Pay() in Checkout.cs:line 42",
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
    )
}

fn bench_fingerprint(c: &mut Criterion) {
    let event = create_log_event();

    let mut group = c.benchmark_group("log_event");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fingerprint", |b| {
        b.iter(|| black_box(&event).fingerprint())
    });

    group.bench_function("display", |b| {
        b.iter(|| {
            let _s = format!("{}", black_box(&event));
        })
    });

    group.bench_function("clone", |b| {
        b.iter(|| {
            let _ = black_box(&event).clone();
        })
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let event = create_log_event();
    let analysis = AnalysisResult::alert(Severity::High, "payment provider timeout")
        .with_suggested_fix("increase the provider timeout")
        .with_analyzer("rules");

    let mut group = c.benchmark_group("serialization");
    group.throughput(Throughput::Elements(1));

    group.bench_function("log_event_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&event)).unwrap())
    });

    group.bench_function("analysis_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&analysis)).unwrap())
    });

    let raw = serde_json::to_string(&analysis).unwrap();
    group.bench_function("analysis_from_json", |b| {
        b.iter(|| serde_json::from_str::<AnalysisResult>(black_box(&raw)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_serialization);
criterion_main!(benches);
