//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 구성 요소는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tailguard_`
//! - 구성 요소: `tailer_`, `parser_`, `analyzer_`, `dispatcher_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 알림 채널 레이블 키
pub const LABEL_SINK: &str = "sink";

/// 결과 레이블 키 (delivered, failed, timed_out)
pub const LABEL_RESULT: &str = "result";

/// 건너뛴 사유 레이블 키 (below_threshold, unrecognized)
pub const LABEL_REASON: &str = "reason";

/// 심각도 레이블 키
pub const LABEL_SEVERITY: &str = "severity";

// ─── Tailer / Parser 메트릭 ─────────────────────────────────────────

/// Tailer: 읽은 전체 라인 수 (counter)
pub const TAILER_LINES_READ_TOTAL: &str = "tailguard_tailer_lines_read_total";

/// Tailer: 파일 재열기 횟수 (counter)
pub const TAILER_REOPENS_TOTAL: &str = "tailguard_tailer_reopens_total";

/// Parser: 생성된 이벤트 수 (counter)
pub const PARSER_EVENTS_TOTAL: &str = "tailguard_parser_events_total";

/// Parser: 건너뛴 라인 수 (counter, label: reason)
pub const PARSER_LINES_SKIPPED_TOTAL: &str = "tailguard_parser_lines_skipped_total";

// ─── Analyzer 메트릭 ────────────────────────────────────────────────

/// Analyzer: 분석 실패 수 (counter)
pub const ANALYZER_FAILURES_TOTAL: &str = "tailguard_analyzer_failures_total";

/// Analyzer: 분석 소요 시간 (histogram, 초)
pub const ANALYZER_DURATION_SECONDS: &str = "tailguard_analyzer_duration_seconds";

// ─── Dispatcher 메트릭 ──────────────────────────────────────────────

/// Dispatcher: 발송된 알림 수 (counter, label: severity)
pub const DISPATCHER_ALERTS_TOTAL: &str = "tailguard_dispatcher_alerts_total";

/// Dispatcher: 채널별 전송 결과 (counter, labels: sink, result)
pub const DISPATCHER_DELIVERIES_TOTAL: &str = "tailguard_dispatcher_deliveries_total";

/// 분석 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (외부 AI 엔진 호출 포함)
pub const ANALYZER_DURATION_BUCKETS: [f64; 9] = [0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0];

/// 전체 메트릭 이름 목록
pub const ALL_METRIC_NAMES: &[&str] = &[
    TAILER_LINES_READ_TOTAL,
    TAILER_REOPENS_TOTAL,
    PARSER_EVENTS_TOTAL,
    PARSER_LINES_SKIPPED_TOTAL,
    ANALYZER_FAILURES_TOTAL,
    ANALYZER_DURATION_SECONDS,
    DISPATCHER_ALERTS_TOTAL,
    DISPATCHER_DELIVERIES_TOTAL,
];

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        TAILER_LINES_READ_TOTAL,
        "Total number of complete lines read from the watched file"
    );
    describe_counter!(
        TAILER_REOPENS_TOTAL,
        "Number of times the watched file was reopened after truncation or rotation"
    );
    describe_counter!(
        PARSER_EVENTS_TOTAL,
        "Number of lines that produced a qualifying log event"
    );
    describe_counter!(
        PARSER_LINES_SKIPPED_TOTAL,
        "Number of lines dropped by the parser, by reason"
    );
    describe_counter!(
        ANALYZER_FAILURES_TOTAL,
        "Number of events whose analysis failed or timed out"
    );
    describe_histogram!(
        ANALYZER_DURATION_SECONDS,
        "Latency of a single analysis call in seconds"
    );
    describe_counter!(
        DISPATCHER_ALERTS_TOTAL,
        "Number of alerts fanned out to the sinks, by severity"
    );
    describe_counter!(
        DISPATCHER_DELIVERIES_TOTAL,
        "Per-sink delivery outcomes"
    );
}
