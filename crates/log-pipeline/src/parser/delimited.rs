//! 구분자 (pipe-delimited) 형식 파싱
//!
//! `timestamp|level|source|message|detail` 형식의 레거시 로그입니다.
//! 5개 미만의 필드는 해석하지 않으며, 6번째 이후 필드는 무시합니다.
//! 빈 필드도 기본값으로 바꾸지 않고 그대로 둡니다.

use chrono::{DateTime, Utc};
use tailguard_core::event::LogEvent;

/// 필드 구분자
pub const DELIMITER: char = '|';

/// 최소 필드 수
pub const MIN_FIELDS: usize = 5;

/// 라인을 구분자 형식으로 해석합니다.
pub fn decode(line: &str, ingested_at: DateTime<Utc>) -> Option<LogEvent> {
    let mut fields = line.split(DELIMITER);
    let (Some(timestamp), Some(level), Some(source), Some(message), Some(detail)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return None;
    };

    Some(LogEvent {
        source: source.to_owned(),
        level: level.to_owned(),
        message: message.to_owned(),
        stack_trace: detail.to_owned(),
        timestamp: super::timestamp_or(Some(timestamp), ingested_at),
    })
}
