//! 라인 파서 -- 원시 로그 라인 하나를 [`LogEvent`]로 분류/해석합니다.
//!
//! 두 형식을 외부 설정 없이 라인의 첫 글자로 구분합니다.
//!
//! 1. 구조화 형식 ([`structured`]): 공백을 제외한 첫 글자가 `{`인 라인.
//!    compact JSON 레코드(`@t`, `@l`, `@mt`, `@m`, `@x`, `SourceContext`)로 해석합니다.
//!    JSON 해석에 실패하면 구분자 형식으로 넘어갑니다.
//! 2. 구분자 형식 ([`delimited`]): `timestamp|level|source|message|detail`.
//!
//! 해석할 수 없거나 알림 기준에 못 미치는 라인은 에러가 아니라
//! [`ParseOutcome::Skipped`]로 조용히 버려집니다.
//!
//! # 사용 예시
//! ```ignore
//! use tailguard_log_pipeline::parser::{LineParser, ParseOutcome};
//!
//! let parser = LineParser::new();
//! match parser.parse("2024-01-01T00:00:00Z|Fatal|PaymentService|Crash|at line 10") {
//!     ParseOutcome::Event(event) => assert_eq!(event.source, "PaymentService"),
//!     ParseOutcome::Skipped(reason) => unreachable!("{reason}"),
//! }
//! ```

pub mod delimited;
pub mod structured;

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tailguard_core::event::LogEvent;

use self::structured::StructuredOutcome;

/// 라인을 건너뛴 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 구조화 레코드로 해석되었지만 에러/치명 레벨이 아니고 예외도 없음
    BelowThreshold,
    /// 어느 형식으로도 해석할 수 없음
    Unrecognized,
}

impl SkipReason {
    /// 메트릭 레이블 값
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelowThreshold => "below_threshold",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 라인 하나의 파싱 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// 알림 대상 이벤트
    Event(LogEvent),
    /// 버려진 라인
    Skipped(SkipReason),
}

impl ParseOutcome {
    /// 이벤트를 꺼냅니다.
    pub fn into_event(self) -> Option<LogEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Skipped(_) => None,
        }
    }

    /// 이벤트가 생성되었는지 확인합니다.
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }
}

/// 두 전략을 순서대로 적용하는 라인 파서
///
/// 상태가 없으므로 여러 테일러에서 공유해도 됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser;

impl LineParser {
    /// 새 라인 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 라인을 파싱합니다. 타임스탬프가 없으면 현재 시각을 사용합니다.
    pub fn parse(&self, line: &str) -> ParseOutcome {
        self.parse_at(line, Utc::now())
    }

    /// 수집 시각을 지정하여 라인을 파싱합니다.
    ///
    /// 같은 라인과 같은 `ingested_at`에 대해 항상 같은 결과를 반환합니다.
    pub fn parse_at(&self, line: &str, ingested_at: DateTime<Utc>) -> ParseOutcome {
        if line.trim_start().starts_with('{') {
            match structured::decode(line, ingested_at) {
                StructuredOutcome::Qualified(event) => return ParseOutcome::Event(event),
                StructuredOutcome::BelowThreshold => {
                    return ParseOutcome::Skipped(SkipReason::BelowThreshold);
                }
                // 깨진 JSON은 구분자 형식으로 재시도
                StructuredOutcome::Malformed => {}
            }
        }

        match delimited::decode(line, ingested_at) {
            Some(event) => ParseOutcome::Event(event),
            None => ParseOutcome::Skipped(SkipReason::Unrecognized),
        }
    }
}

/// 타임스탬프 문자열을 최대한 해석합니다.
///
/// 지원 형식:
/// - RFC 3339: `2024-01-15T12:00:00Z`, `2024-01-15T12:00:00.123+09:00`
/// - 시간대 없는 날짜/시각 (UTC로 간주): `2024-01-15 12:00:00`, `2024-01-15T12:00:00.5`
/// - 날짜만: `2024-01-15` (UTC 자정)
/// - Unix timestamp (초 또는 밀리초)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
    ];

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if let Ok(ts_num) = raw.parse::<i64>() {
        // 10자리 = 초, 13자리 = 밀리초
        return if ts_num > 9_999_999_999 {
            DateTime::from_timestamp_millis(ts_num)
        } else {
            DateTime::from_timestamp(ts_num, 0)
        };
    }

    None
}

/// 타임스탬프를 해석하고, 실패하면 수집 시각을 사용합니다.
pub(crate) fn timestamp_or(raw: Option<&str>, ingested_at: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(parse_timestamp).unwrap_or(ingested_at)
}
