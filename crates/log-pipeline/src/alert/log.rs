//! 로그 알림 채널
//!
//! 알림을 `tracing` 레코드로 기록합니다. 외부 채널 없이도 항상 사용할 수 있습니다.

use tailguard_core::error::SinkError;
use tailguard_core::event::LogEvent;
use tailguard_core::pipeline::AlertSink;
use tailguard_core::types::{AnalysisResult, Severity};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// `tracing` 기반 알림 채널
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl LogSink {
    /// 새 로그 채널을 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(
        &self,
        event: &LogEvent,
        analysis: &AnalysisResult,
        _cancel: &CancellationToken,
    ) -> Result<(), SinkError> {
        let fix = analysis.suggested_fix.as_deref().unwrap_or("");

        if analysis.severity >= Severity::High {
            error!(
                target: "tailguard::alert",
                source = %event.source,
                level = %event.level,
                severity = %analysis.severity,
                fingerprint = %event.fingerprint(),
                timestamp = %event.timestamp.to_rfc3339(),
                suggested_fix = fix,
                has_stack_trace = event.has_stack_trace(),
                "{}",
                analysis.summary
            );
        } else {
            warn!(
                target: "tailguard::alert",
                source = %event.source,
                level = %event.level,
                severity = %analysis.severity,
                fingerprint = %event.fingerprint(),
                timestamp = %event.timestamp.to_rfc3339(),
                suggested_fix = fix,
                has_stack_trace = event.has_stack_trace(),
                "{}",
                analysis.summary
            );
        }

        Ok(())
    }
}
