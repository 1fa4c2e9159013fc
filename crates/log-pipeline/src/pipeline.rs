//! 파이프라인 오케스트레이션 -- 테일링/분석/알림의 전체 흐름을 관리합니다.
//!
//! # 흐름
//! ```text
//! LogTailer -> LogEvent -> Analyzer -> (should_alert) -> CompositeDispatcher -> sinks
//! ```
//!
//! 이벤트는 한 번에 하나씩 순서대로 처리됩니다.
//! 분석 실패와 시간 초과는 기록 후 다음 이벤트로 넘어가며,
//! 테일러 실패만 파이프라인을 종료시킵니다.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tailguard_core::error::AnalysisError;
use tailguard_core::event::LogEvent;
use tailguard_core::metrics as m;
use tailguard_core::pipeline::DynAnalyzer;
use tailguard_core::types::AnalysisResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alert::CompositeDispatcher;
use crate::error::LogPipelineError;
use crate::tailer::LogTailer;

/// 실행 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// 처리한 이벤트 수
    pub events: u64,
    /// 디스패치한 알림 수
    pub alerts_dispatched: u64,
    /// 분석 실패(시간 초과 포함) 수
    pub analysis_failures: u64,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events={} alerts={} analysis_failures={}",
            self.events, self.alerts_dispatched, self.analysis_failures
        )
    }
}

/// 로그 파이프라인
///
/// [`LogPipelineBuilder`]로 생성하고 [`run`](Self::run)으로 실행합니다.
pub struct LogPipeline {
    tailer: LogTailer,
    analyzer: Arc<dyn DynAnalyzer>,
    dispatcher: CompositeDispatcher,
    cancel: CancellationToken,
    analyzer_timeout: Option<Duration>,
    summary: PipelineSummary,
}

impl LogPipeline {
    /// 새 빌더를 생성합니다.
    pub fn builder() -> LogPipelineBuilder {
        LogPipelineBuilder::new()
    }

    /// 취소되거나 테일러가 실패할 때까지 실행합니다.
    ///
    /// 취소로 끝나면 `Ok(summary)`, 테일러 실패는 `Err`를 반환합니다.
    pub async fn run(mut self) -> Result<PipelineSummary, LogPipelineError> {
        info!(
            path = %self.tailer.path().display(),
            analyzer = self.analyzer.name(),
            sinks = ?self.dispatcher.sink_names(),
            "log pipeline started"
        );

        loop {
            let event = match self.tailer.next_event().await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, summary = %self.summary, "log source lost, pipeline stopping");
                    return Err(e);
                }
            };

            self.summary.events += 1;
            self.process(&event).await;
        }

        info!(
            summary = %self.summary,
            lines_read = self.tailer.lines_read(),
            "log pipeline stopped"
        );
        Ok(self.summary)
    }

    async fn process(&mut self, event: &LogEvent) {
        let fingerprint = event.fingerprint();
        debug!(fingerprint = %fingerprint, level = %event.level, source = %event.source, "event received");

        let Some(analysis) = self.analyze(event, &fingerprint).await else {
            return;
        };

        if !analysis.should_alert {
            debug!(fingerprint = %fingerprint, severity = %analysis.severity, "no alert required");
            return;
        }

        let report = self.dispatcher.dispatch(event, &analysis).await;
        self.summary.alerts_dispatched += 1;
        info!(
            fingerprint = %fingerprint,
            severity = %analysis.severity,
            delivered = report.delivered(),
            failed = report.failed(),
            "alert dispatched"
        );
    }

    async fn analyze(&mut self, event: &LogEvent, fingerprint: &str) -> Option<AnalysisResult> {
        let started = Instant::now();
        let analysis = self.analyzer.analyze(event, &self.cancel);
        let limited = async {
            match self.analyzer_timeout {
                Some(limit) => tokio::time::timeout(limit, analysis)
                    .await
                    .unwrap_or(Err(AnalysisError::Timeout {
                        secs: limit.as_secs(),
                    })),
                None => analysis.await,
            }
        };

        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(AnalysisError::Cancelled),
            outcome = limited => outcome,
        };
        metrics::histogram!(m::ANALYZER_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(analysis) => Some(analysis),
            Err(AnalysisError::Cancelled) => {
                debug!(fingerprint, "analysis cancelled");
                None
            }
            Err(e) => {
                self.summary.analysis_failures += 1;
                metrics::counter!(m::ANALYZER_FAILURES_TOTAL).increment(1);
                warn!(fingerprint, analyzer = self.analyzer.name(), error = %e, "analysis failed, event skipped");
                None
            }
        }
    }
}

impl fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogPipeline")
            .field("tailer", &self.tailer)
            .field("analyzer", &self.analyzer.name())
            .field("dispatcher", &self.dispatcher)
            .field("analyzer_timeout", &self.analyzer_timeout)
            .finish()
    }
}

/// 로그 파이프라인 빌더
///
/// 구성 요소를 외부에서 주입받습니다. 설정 파일은 읽지 않습니다.
pub struct LogPipelineBuilder {
    tailer: Option<LogTailer>,
    analyzer: Option<Arc<dyn DynAnalyzer>>,
    dispatcher: Option<CompositeDispatcher>,
    cancel: CancellationToken,
    analyzer_timeout: Option<Duration>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            tailer: None,
            analyzer: None,
            dispatcher: None,
            cancel: CancellationToken::new(),
            analyzer_timeout: None,
        }
    }

    /// 입력 테일러를 지정합니다.
    pub fn tailer(mut self, tailer: LogTailer) -> Self {
        self.tailer = Some(tailer);
        self
    }

    /// 분석기를 지정합니다.
    pub fn analyzer(mut self, analyzer: Arc<dyn DynAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// 알림 디스패처를 지정합니다.
    pub fn dispatcher(mut self, dispatcher: CompositeDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// 취소 토큰을 지정합니다. 테일러와 같은 토큰을 사용해야 합니다.
    ///
    /// 빌드 시 디스패처의 토큰도 이 토큰으로 교체됩니다.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 분석 시간 제한을 지정합니다. `None`이면 제한 없음.
    pub fn analyzer_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        let tailer = self.tailer.ok_or_else(|| missing("tailer"))?;
        let analyzer = self.analyzer.ok_or_else(|| missing("analyzer"))?;
        // 채널에도 같은 토큰을 전달
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| missing("dispatcher"))?
            .with_cancellation(self.cancel.clone());

        Ok(LogPipeline {
            tailer,
            analyzer,
            dispatcher,
            cancel: self.cancel,
            analyzer_timeout: self.analyzer_timeout,
            summary: PipelineSummary::default(),
        })
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(component: &str) -> LogPipelineError {
    LogPipelineError::Config {
        field: component.to_owned(),
        reason: "not provided".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Mutex;

    use tailguard_core::error::SinkError;
    use tailguard_core::pipeline::{AlertSink, Analyzer};
    use tailguard_core::types::Severity;

    use crate::analyzer::SeverityAnalyzer;
    use crate::tailer::TailerConfig;

    #[derive(Default)]
    struct RecordingSink {
        received: Arc<Mutex<Vec<(String, Severity)>>>,
    }

    impl AlertSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(
            &self,
            event: &LogEvent,
            analysis: &AnalysisResult,
            _cancel: &CancellationToken,
        ) -> Result<(), SinkError> {
            self.received
                .lock()
                .unwrap()
                .push((event.message.clone(), analysis.severity));
            Ok(())
        }
    }

    /// 메시지가 "bad"이면 실패하는 분석기
    struct PickyAnalyzer;

    impl Analyzer for PickyAnalyzer {
        fn name(&self) -> &str {
            "picky"
        }

        async fn analyze(
            &self,
            event: &LogEvent,
            _cancel: &CancellationToken,
        ) -> Result<AnalysisResult, AnalysisError> {
            if event.message == "bad" {
                Err(AnalysisError::Request("engine unavailable".to_owned()))
            } else {
                Ok(AnalysisResult::alert(Severity::High, event.message.clone()))
            }
        }
    }

    struct StuckAnalyzer;

    impl Analyzer for StuckAnalyzer {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn analyze(
            &self,
            _event: &LogEvent,
            _cancel: &CancellationToken,
        ) -> Result<AnalysisResult, AnalysisError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(AnalysisResult::alert(Severity::Critical, "late"))
        }
    }

    fn append(path: &Path, content: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    async fn tailer(path: &Path, cancel: &CancellationToken) -> LogTailer {
        let config = TailerConfig::new(path).with_poll_interval(Duration::from_millis(10));
        LogTailer::open(config, cancel.clone()).await.unwrap()
    }

    async fn wait_for(received: &Arc<Mutex<Vec<(String, Severity)>>>, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while received.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("alerts were not delivered in time");
    }

    #[tokio::test]
    async fn builder_shares_token_with_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let pipeline = LogPipeline::builder()
            .tailer(tailer(&dir.path().join("a.log"), &cancel).await)
            .analyzer(Arc::new(SeverityAnalyzer::default()))
            .dispatcher(CompositeDispatcher::new(vec![Arc::new(RecordingSink::default())]))
            .cancellation(cancel.clone())
            .build()
            .unwrap();

        assert!(!pipeline.dispatcher.cancellation().is_cancelled());
        cancel.cancel();
        assert!(pipeline.dispatcher.cancellation().is_cancelled());
    }

    #[tokio::test]
    async fn builder_requires_components() {
        let err = LogPipelineBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("tailer"));

        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let err = LogPipeline::builder()
            .tailer(tailer(&dir.path().join("a.log"), &cancel).await)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("analyzer"));
    }

    #[tokio::test]
    async fn analyzer_failure_skips_only_that_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cancel = CancellationToken::new();
        let sink = RecordingSink::default();
        let received = Arc::clone(&sink.received);

        let pipeline = LogPipeline::builder()
            .tailer(tailer(&path, &cancel).await)
            .analyzer(Arc::new(PickyAnalyzer))
            .dispatcher(CompositeDispatcher::new(vec![Arc::new(sink)]))
            .cancellation(cancel.clone())
            .build()
            .unwrap();
        let handle = tokio::spawn(pipeline.run());

        append(&path, "t|Error|Svc|first|\nt|Error|Svc|bad|\nt|Error|Svc|third|\n");
        wait_for(&received, 2).await;
        cancel.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.alerts_dispatched, 2);
        assert_eq!(summary.analysis_failures, 1);

        let messages: Vec<String> = received.lock().unwrap().iter().map(|(m, _)| m.clone()).collect();
        assert_eq!(messages, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn below_threshold_verdict_is_not_dispatched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cancel = CancellationToken::new();
        let sink = RecordingSink::default();
        let received = Arc::clone(&sink.received);

        let pipeline = LogPipeline::builder()
            .tailer(tailer(&path, &cancel).await)
            .analyzer(Arc::new(SeverityAnalyzer::new(Severity::Critical)))
            .dispatcher(CompositeDispatcher::new(vec![Arc::new(sink)]))
            .cancellation(cancel.clone())
            .build()
            .unwrap();
        let handle = tokio::spawn(pipeline.run());

        append(&path, "t|Error|Svc|ignored|\nt|Fatal|Svc|crash|\n");
        wait_for(&received, 1).await;
        cancel.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.events, 2);
        assert_eq!(summary.alerts_dispatched, 1);
        assert_eq!(received.lock().unwrap()[0], ("crash".to_owned(), Severity::Critical));
    }

    #[tokio::test]
    async fn analyzer_timeout_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cancel = CancellationToken::new();

        let pipeline = LogPipeline::builder()
            .tailer(tailer(&path, &cancel).await)
            .analyzer(Arc::new(StuckAnalyzer))
            .dispatcher(CompositeDispatcher::new(Vec::new()))
            .cancellation(cancel.clone())
            .analyzer_timeout(Some(Duration::from_millis(20)))
            .build()
            .unwrap();
        let handle = tokio::spawn(pipeline.run());

        append(&path, "t|Fatal|Svc|hang|\n");
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(summary.analysis_failures, 1);
        assert_eq!(summary.alerts_dispatched, 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_stuck_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cancel = CancellationToken::new();

        let pipeline = LogPipeline::builder()
            .tailer(tailer(&path, &cancel).await)
            .analyzer(Arc::new(StuckAnalyzer))
            .dispatcher(CompositeDispatcher::new(Vec::new()))
            .cancellation(cancel.clone())
            .build()
            .unwrap();
        let handle = tokio::spawn(pipeline.run());

        append(&path, "t|Fatal|Svc|hang|\n");
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("pipeline must stop promptly")
            .unwrap()
            .unwrap();
        assert_eq!(summary.analysis_failures, 0);
    }

    #[test]
    fn summary_display() {
        let summary = PipelineSummary {
            events: 3,
            alerts_dispatched: 2,
            analysis_failures: 1,
        };
        assert_eq!(summary.to_string(), "events=3 alerts=2 analysis_failures=1");
    }
}
