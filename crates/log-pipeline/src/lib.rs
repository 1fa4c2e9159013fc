//! # tailguard-log-pipeline
//!
//! 애플리케이션 로그 파일을 실시간으로 테일링하여 에러/치명 이벤트를 분석기에 넘기고,
//! 알림이 필요한 이벤트를 여러 알림 채널로 동시에 전달합니다.
//!
//! # 모듈 구성
//!
//! - [`parser`]: 라인 하나를 [`LogEvent`](tailguard_core::LogEvent)로 해석 (구조화 JSON / 구분자 형식)
//! - [`tailer`]: 파일 끝에서부터 새 라인을 읽는 테일러 (잘림/로테이션 감지)
//! - [`analyzer`]: 규칙 기반 / HTTP 분석기
//! - [`alert`]: 복합 디스패처와 알림 채널 (웹훅, 로그)
//! - [`pipeline`]: 전체 흐름 오케스트레이션
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! file -> LogTailer -> LineParser -> Analyzer -> CompositeDispatcher -> [WebhookSink, LogSink, ...]
//!            |                           |                |
//!      truncation/rotation        timeout + cancel    JoinSet fan-out
//! ```

pub mod alert;
pub mod analyzer;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod tailer;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder, PipelineSummary};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{LineParser, ParseOutcome, SkipReason};

// 테일러
pub use tailer::{LogTailer, TailerConfig};

// 분석기
pub use analyzer::{HttpAnalyzer, SeverityAnalyzer};

// 알림
pub use alert::{
    CompositeDispatcher, DeliveryResult, DispatchReport, LogSink, SinkOutcome, WebhookFormat,
    WebhookSink,
};
