//! 규칙 기반 심각도 분석기
//!
//! | 조건 | 심각도 |
//! |---|---|
//! | 레벨 `Fatal` | critical |
//! | 레벨 `Error` + 스택 트레이스 | high |
//! | 레벨 `Error` | medium |
//! | 그 외 레벨 + 스택 트레이스 | low |
//! | 그 외 | info |
//!
//! 레벨 비교는 대소문자를 구분하지 않습니다.

use tailguard_core::error::AnalysisError;
use tailguard_core::event::{LEVEL_ERROR, LEVEL_FATAL, LogEvent};
use tailguard_core::pipeline::Analyzer;
use tailguard_core::types::{AnalysisResult, Severity};
use tokio_util::sync::CancellationToken;

/// 규칙 기반 분석기
#[derive(Debug, Clone, Copy)]
pub struct SeverityAnalyzer {
    min_severity: Severity,
}

impl SeverityAnalyzer {
    /// 알림 최소 심각도를 지정하여 생성합니다.
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    /// 알림 최소 심각도
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// 이벤트의 심각도를 판정합니다.
    pub fn classify(event: &LogEvent) -> Severity {
        let level = event.level.trim();
        if level.eq_ignore_ascii_case(LEVEL_FATAL) {
            Severity::Critical
        } else if level.eq_ignore_ascii_case(LEVEL_ERROR) {
            if event.has_stack_trace() {
                Severity::High
            } else {
                Severity::Medium
            }
        } else if event.has_stack_trace() {
            Severity::Low
        } else {
            Severity::Info
        }
    }

    fn evaluate(&self, event: &LogEvent) -> AnalysisResult {
        let severity = Self::classify(event);
        let summary = if event.message.is_empty() {
            format!("{} reported {}", event.source, event.level)
        } else {
            format!("{}: {}", event.source, event.message)
        };

        let result = if severity >= self.min_severity {
            AnalysisResult::alert(severity, summary)
        } else {
            AnalysisResult::no_alert(severity, summary)
        };
        result.with_analyzer("rules")
    }
}

impl Default for SeverityAnalyzer {
    fn default() -> Self {
        Self::new(Severity::Medium)
    }
}

impl Analyzer for SeverityAnalyzer {
    fn name(&self) -> &str {
        "rules"
    }

    async fn analyze(
        &self,
        event: &LogEvent,
        _cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.evaluate(event))
    }
}
