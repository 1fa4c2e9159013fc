//! capability trait -- 분석기와 알림 채널의 확장 지점
//!
//! [`Analyzer`]와 [`AlertSink`]는 RPITIT(`impl Future`)를 사용하므로 `dyn`으로 쓸 수 없습니다.
//! [`DynAnalyzer`]와 [`DynAlertSink`]는 [`BoxFuture`]를 반환하는 dyn-compatible 버전이며,
//! 원본 trait을 구현한 타입에 대해 자동으로 구현됩니다.
//!
//! # 구현 예시
//! ```ignore
//! struct StdoutSink;
//!
//! impl AlertSink for StdoutSink {
//!     fn name(&self) -> &str { "stdout" }
//!
//!     async fn send(
//!         &self,
//!         event: &LogEvent,
//!         analysis: &AnalysisResult,
//!         _cancel: &CancellationToken,
//!     ) -> Result<(), SinkError> {
//!         println!("{event} -> {}", analysis.summary);
//!         Ok(())
//!     }
//! }
//!
//! let sinks: Vec<Arc<dyn DynAlertSink>> = vec![Arc::new(StdoutSink)];
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::{AnalysisError, SinkError};
use crate::event::LogEvent;
use crate::types::AnalysisResult;

/// `Send` 박스 future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 로그 이벤트를 분석하여 알림 여부를 판단하는 trait
///
/// AI/LLM 백엔드나 규칙 엔진 등 외부 분석 엔진을 감쌉니다.
/// 실패는 파이프라인을 멈추지 않습니다.
pub trait Analyzer: Send + Sync {
    /// 분석기 이름
    fn name(&self) -> &str;

    /// 이벤트를 분석합니다.
    ///
    /// 장시간 걸리는 구현은 `cancel`을 관찰해야 합니다.
    fn analyze(
        &self,
        event: &LogEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<AnalysisResult, AnalysisError>> + Send;
}

/// 외부 알림 채널 하나로 알림을 전달하는 trait
///
/// 재시도가 필요하면 구현 내부에서 처리합니다.
pub trait AlertSink: Send + Sync {
    /// 채널 이름 (진단 로그에 사용)
    fn name(&self) -> &str;

    /// 이벤트와 분석 결과를 전달합니다.
    fn send(
        &self,
        event: &LogEvent,
        analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// dyn-compatible 분석기 trait
pub trait DynAnalyzer: Send + Sync {
    /// 분석기 이름
    fn name(&self) -> &str;

    /// 이벤트를 분석합니다.
    fn analyze<'a>(
        &'a self,
        event: &'a LogEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>>;
}

impl<T: Analyzer> DynAnalyzer for T {
    fn name(&self) -> &str {
        Analyzer::name(self)
    }

    fn analyze<'a>(
        &'a self,
        event: &'a LogEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>> {
        Box::pin(Analyzer::analyze(self, event, cancel))
    }
}

/// dyn-compatible 알림 채널 trait
pub trait DynAlertSink: Send + Sync {
    /// 채널 이름
    fn name(&self) -> &str;

    /// 이벤트와 분석 결과를 전달합니다.
    fn send<'a>(
        &'a self,
        event: &'a LogEvent,
        analysis: &'a AnalysisResult,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SinkError>>;
}

impl<T: AlertSink> DynAlertSink for T {
    fn name(&self) -> &str {
        AlertSink::name(self)
    }

    fn send<'a>(
        &'a self,
        event: &'a LogEvent,
        analysis: &'a AnalysisResult,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(AlertSink::send(self, event, analysis, cancel))
    }
}
