//! 구조화 (compact JSON) 형식 파싱
//!
//! 한 줄에 JSON 객체 하나가 있는 형식입니다.
//!
//! | 키 | 의미 |
//! |---|---|
//! | `@t` | 타임스탬프 |
//! | `@l` | 레벨 (없으면 `"Information"`) |
//! | `@mt` | 메시지 템플릿 (없으면 `@m`) |
//! | `@x` | 예외/스택 트레이스 |
//! | `SourceContext` | 소스 컴포넌트 (없으면 `"Unknown"`) |
//!
//! 알려진 키의 값은 문자열 또는 `null`이어야 하며, 그 외 타입은 해석 실패로 취급합니다.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tailguard_core::event::{DEFAULT_LEVEL, LEVEL_ERROR, LEVEL_FATAL, LogEvent, UNKNOWN_SOURCE};

/// 구조화 형식 해석 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredOutcome {
    /// 알림 기준을 만족하는 레코드
    Qualified(LogEvent),
    /// 해석은 성공했지만 알림 기준 미달 (구분자 형식으로 재시도하지 않음)
    BelowThreshold,
    /// JSON 해석 실패 (구분자 형식으로 재시도)
    Malformed,
}

#[derive(Debug, Deserialize)]
struct CompactRecord {
    #[serde(rename = "@t", default)]
    timestamp: Option<String>,
    #[serde(rename = "@l", default)]
    level: Option<String>,
    #[serde(rename = "@mt", default)]
    message_template: Option<String>,
    #[serde(rename = "@m", default)]
    message: Option<String>,
    #[serde(rename = "@x", default)]
    exception: Option<String>,
    #[serde(rename = "SourceContext", default)]
    source_context: Option<String>,
}

impl CompactRecord {
    fn qualifies(&self, level: &str) -> bool {
        self.exception.as_deref().is_some_and(|x| !x.is_empty())
            || level == LEVEL_ERROR
            || level == LEVEL_FATAL
    }
}

/// 라인을 구조화 레코드로 해석합니다.
pub fn decode(line: &str, ingested_at: DateTime<Utc>) -> StructuredOutcome {
    let record: CompactRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
            tracing::trace!(error = %e, "structured decode failed, falling back to delimited");
            return StructuredOutcome::Malformed;
        }
    };

    let level = record
        .level
        .clone()
        .unwrap_or_else(|| DEFAULT_LEVEL.to_owned());

    if !record.qualifies(&level) {
        return StructuredOutcome::BelowThreshold;
    }

    let timestamp = super::timestamp_or(record.timestamp.as_deref(), ingested_at);
    let message = record
        .message_template
        .or(record.message)
        .unwrap_or_default();

    StructuredOutcome::Qualified(LogEvent {
        source: record
            .source_context
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_owned()),
        level,
        message,
        stack_trace: record.exception.unwrap_or_default(),
        timestamp,
    })
}
