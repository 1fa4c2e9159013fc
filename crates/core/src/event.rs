//! 로그 이벤트 -- 파이프라인 단계 간 전달되는 기본 단위
//!
//! [`LogEvent`]는 라인 파서가 두 파싱 전략 중 하나를 통과한 라인에 대해서만 생성합니다.
//! 생성 이후에는 변경되지 않으며, 원본 라인에 대한 참조를 갖지 않습니다.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 소스 식별자가 없을 때 사용하는 기본값
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// 레벨이 없을 때 사용하는 기본값
pub const DEFAULT_LEVEL: &str = "Information";

/// 에러 레벨 라벨
pub const LEVEL_ERROR: &str = "Error";

/// 치명적 에러 레벨 라벨
pub const LEVEL_FATAL: &str = "Fatal";

/// 파싱된 로그 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// 로그를 남긴 컴포넌트 (없으면 `"Unknown"`)
    pub source: String,
    /// 심각도 라벨 (예: "Error", "Fatal")
    pub level: String,
    /// 메시지 (비어 있을 수 있음)
    pub message: String,
    /// 예외/스택 트레이스 등 상세 정보 (비어 있을 수 있음)
    pub stack_trace: String,
    /// 로그 시각 (원본에 없거나 해석 불가하면 수집 시각)
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// 새 로그 이벤트를 생성합니다.
    pub fn new(
        source: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            level: level.into(),
            message: message.into(),
            stack_trace: stack_trace.into(),
            timestamp,
        }
    }

    /// 스택 트레이스가 있는지 확인합니다.
    pub fn has_stack_trace(&self) -> bool {
        !self.stack_trace.is_empty()
    }

    /// 이벤트 식별자를 반환합니다.
    ///
    /// 필드 값에서 결정적으로 계산되므로 같은 이벤트는 항상 같은 식별자를 가집니다.
    /// 진단 로그에서 이벤트를 연결하는 용도로 사용합니다.
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl Hash for LogEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.level.hash(state);
        self.message.hash(state);
        self.stack_trace.hash(state);
        self.timestamp.timestamp_nanos_opt().hash(state);
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.source,
            self.message,
        )
    }
}
