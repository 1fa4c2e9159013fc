//! 복합 디스패처
//!
//! 이벤트 하나를 등록된 모든 채널로 동시에 전달합니다.
//! 각 채널은 별도 tokio 태스크에서 실행되므로 한 채널의 실패, 시간 초과, panic이
//! 다른 채널이나 파이프라인에 영향을 주지 않습니다. 재시도는 하지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tailguard_core::event::LogEvent;
use tailguard_core::metrics as m;
use tailguard_core::pipeline::DynAlertSink;
use tailguard_core::types::AnalysisResult;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 채널 하나의 전달 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// 전달 성공
    Delivered,
    /// 전달 실패 (사유)
    Failed(String),
    /// 시간 초과
    TimedOut,
}

impl DeliveryResult {
    /// 메트릭 레이블 값
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// 채널별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOutcome {
    /// 채널 이름
    pub sink: String,
    /// 결과
    pub result: DeliveryResult,
}

/// 디스패치 한 번의 결과 모음
///
/// 순서는 채널 등록 순서를 따릅니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 채널별 결과
    pub outcomes: Vec<SinkOutcome>,
}

impl DispatchReport {
    /// 성공한 채널 수
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result == DeliveryResult::Delivered)
            .count()
    }

    /// 실패하거나 시간 초과된 채널 수
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }

    /// 이름으로 채널 결과를 찾습니다.
    pub fn outcome(&self, sink: &str) -> Option<&DeliveryResult> {
        self.outcomes
            .iter()
            .find(|o| o.sink == sink)
            .map(|o| &o.result)
    }
}

/// 복합 디스패처
///
/// 채널 목록은 생성 시점에 고정됩니다.
pub struct CompositeDispatcher {
    sinks: Vec<Arc<dyn DynAlertSink>>,
    sink_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl CompositeDispatcher {
    /// 채널 목록으로 디스패처를 생성합니다. 시간 제한은 없습니다.
    ///
    /// 취소 토큰은 취소되지 않는 새 토큰입니다. [`LogPipelineBuilder`](crate::LogPipelineBuilder)로
    /// 빌드하면 파이프라인 토큰으로 교체되고, 단독으로 쓸 때는
    /// [`with_cancellation`](Self::with_cancellation)으로 지정합니다.
    pub fn new(sinks: Vec<Arc<dyn DynAlertSink>>) -> Self {
        Self {
            sinks,
            sink_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// 채널별 시간 제한을 설정합니다. `None`이면 제한 없음.
    pub fn with_sink_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sink_timeout = timeout;
        self
    }

    /// 채널에 전달할 취소 토큰을 설정합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 채널에 전달되는 취소 토큰
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 등록된 채널 수
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// 등록된 채널 이름 목록
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_owned()).collect()
    }

    /// 모든 채널로 전달하고, 모든 채널이 끝날 때까지 기다립니다.
    ///
    /// 채널 에러는 전파되지 않고 [`DispatchReport`]에 기록됩니다.
    pub async fn dispatch(&self, event: &LogEvent, analysis: &AnalysisResult) -> DispatchReport {
        let fingerprint = event.fingerprint();
        metrics::counter!(m::DISPATCHER_ALERTS_TOTAL, m::LABEL_SEVERITY => analysis.severity.to_string())
            .increment(1);

        if self.sinks.is_empty() {
            warn!(fingerprint = %fingerprint, "no alert sinks registered, alert dropped");
            return DispatchReport::default();
        }

        let event = Arc::new(event.clone());
        let analysis = Arc::new(analysis.clone());
        let mut tasks = JoinSet::new();

        for (index, sink) in self.sinks.iter().enumerate() {
            let sink = Arc::clone(sink);
            let event = Arc::clone(&event);
            let analysis = Arc::clone(&analysis);
            let cancel = self.cancel.clone();
            let timeout = self.sink_timeout;

            tasks.spawn(async move {
                let send = sink.send(&event, &analysis, &cancel);
                let result = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, send).await {
                        Ok(result) => result,
                        Err(_) => return (index, DeliveryResult::TimedOut),
                    },
                    None => send.await,
                };
                match result {
                    Ok(()) => (index, DeliveryResult::Delivered),
                    Err(e) => (index, DeliveryResult::Failed(e.to_string())),
                }
            });
        }

        let mut results: Vec<Option<DeliveryResult>> = vec![None; self.sinks.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    // panic한 태스크는 인덱스를 알 수 없으므로 아래에서 빈 칸으로 처리
                    debug!(error = %e, "sink task did not complete");
                }
            }
        }

        let outcomes = self
            .sinks
            .iter()
            .zip(results)
            .map(|(sink, result)| {
                let sink = sink.name().to_owned();
                let result =
                    result.unwrap_or_else(|| DeliveryResult::Failed("sink task panicked".to_owned()));
                record(&sink, &result, &fingerprint);
                SinkOutcome { sink, result }
            })
            .collect();

        DispatchReport { outcomes }
    }
}

fn record(sink: &str, result: &DeliveryResult, fingerprint: &str) {
    match result {
        DeliveryResult::Delivered => {
            debug!(sink, fingerprint, "alert delivered");
        }
        DeliveryResult::Failed(reason) => {
            error!(sink, fingerprint, reason = %reason, "alert delivery failed");
        }
        DeliveryResult::TimedOut => {
            warn!(sink, fingerprint, "alert delivery timed out");
        }
    }

    metrics::counter!(
        m::DISPATCHER_DELIVERIES_TOTAL,
        m::LABEL_SINK => sink.to_owned(),
        m::LABEL_RESULT => result.as_str()
    )
    .increment(1);
}

impl fmt::Debug for CompositeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDispatcher")
            .field("sinks", &self.sink_names())
            .field("sink_timeout", &self.sink_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use tailguard_core::error::SinkError;
    use tailguard_core::pipeline::AlertSink;
    use tailguard_core::types::Severity;

    struct CountingSink {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl AlertSink for CountingSink {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(
            &self,
            _event: &LogEvent,
            _analysis: &AnalysisResult,
            _cancel: &CancellationToken,
        ) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl AlertSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn send(
            &self,
            _event: &LogEvent,
            _analysis: &AnalysisResult,
            _cancel: &CancellationToken,
        ) -> Result<(), SinkError> {
            Err(SinkError::Delivery("smtp unreachable".to_owned()))
        }
    }

    struct SlowSink;

    impl AlertSink for SlowSink {
        fn name(&self) -> &str {
            "slow"
        }

        async fn send(
            &self,
            _event: &LogEvent,
            _analysis: &AnalysisResult,
            _cancel: &CancellationToken,
        ) -> Result<(), SinkError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    struct PanickingSink;

    impl AlertSink for PanickingSink {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn send(
            &self,
            _event: &LogEvent,
            _analysis: &AnalysisResult,
            _cancel: &CancellationToken,
        ) -> Result<(), SinkError> {
            panic!("sink exploded");
        }
    }

    fn event() -> LogEvent {
        LogEvent::new("PaymentService", "Fatal", "Crash", "at line 10", Utc::now())
    }

    fn verdict() -> AnalysisResult {
        AnalysisResult::alert(Severity::Critical, "payment crash")
    }

    fn counting(name: &'static str) -> (Arc<dyn DynAlertSink>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            name,
            calls: Arc::clone(&calls),
        };
        (Arc::new(sink), calls)
    }

    #[tokio::test]
    async fn every_sink_receives_the_alert() {
        let (a, a_calls) = counting("a");
        let (b, b_calls) = counting("b");
        let dispatcher = CompositeDispatcher::new(vec![a, b]);

        let report = dispatcher.dispatch(&event(), &verdict()).await;
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_others() {
        let (ok, calls) = counting("ok");
        let dispatcher = CompositeDispatcher::new(vec![Arc::new(FailingSink), ok]);

        let report = dispatcher.dispatch(&event(), &verdict()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.outcome("ok"), Some(&DeliveryResult::Delivered));
        assert!(matches!(
            report.outcome("failing"),
            Some(DeliveryResult::Failed(reason)) if reason.contains("smtp unreachable")
        ));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_sink_times_out() {
        let (ok, calls) = counting("ok");
        let dispatcher = CompositeDispatcher::new(vec![Arc::new(SlowSink), ok])
            .with_sink_timeout(Some(Duration::from_secs(10)));

        let report = dispatcher.dispatch(&event(), &verdict()).await;
        assert_eq!(report.outcome("slow"), Some(&DeliveryResult::TimedOut));
        assert_eq!(report.outcome("ok"), Some(&DeliveryResult::Delivered));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_sink_is_isolated() {
        let (ok, calls) = counting("ok");
        let dispatcher = CompositeDispatcher::new(vec![Arc::new(PanickingSink), ok]);

        let report = dispatcher.dispatch(&event(), &verdict()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            report.outcome("panicking"),
            Some(DeliveryResult::Failed(_))
        ));
        assert_eq!(report.delivered(), 1);
    }

    #[tokio::test]
    async fn no_sinks_yields_empty_report() {
        let dispatcher = CompositeDispatcher::new(Vec::new());
        let report = dispatcher.dispatch(&event(), &verdict()).await;
        assert!(report.outcomes.is_empty());
        assert_eq!(dispatcher.sink_count(), 0);
    }

    #[tokio::test]
    async fn report_preserves_registration_order() {
        let (a, _) = counting("first");
        let (b, _) = counting("second");
        let dispatcher = CompositeDispatcher::new(vec![a, Arc::new(FailingSink), b]);

        let report = dispatcher.dispatch(&event(), &verdict()).await;
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.sink.as_str()).collect();
        assert_eq!(names, vec!["first", "failing", "second"]);
        assert_eq!(dispatcher.sink_names(), vec!["first", "failing", "second"]);
    }

    #[test]
    fn delivery_result_labels() {
        assert_eq!(DeliveryResult::Delivered.to_string(), "delivered");
        assert_eq!(DeliveryResult::TimedOut.as_str(), "timed_out");
        assert_eq!(
            DeliveryResult::Failed("boom".to_owned()).to_string(),
            "failed: boom"
        );
    }
}
