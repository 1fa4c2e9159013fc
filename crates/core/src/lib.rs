//! tailguard 공통 크레이트
//!
//! 로그 감시 에이전트의 모든 크레이트가 공유하는 타입과 확장 지점을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`event`]: 파싱된 로그 이벤트 ([`LogEvent`])
//! - [`types`]: 분석 결과와 심각도 ([`AnalysisResult`], [`Severity`])
//! - [`pipeline`]: 외부 capability trait ([`Analyzer`], [`AlertSink`])
//! - [`config`]: `tailguard.toml` 설정
//! - [`error`]: 도메인 에러 타입
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AnalysisError, ConfigError, PipelineError, SinkError, TailguardError};

// 설정
pub use config::TailguardConfig;

// 이벤트
pub use event::LogEvent;

// capability trait
pub use pipeline::{AlertSink, Analyzer, BoxFuture, DynAlertSink, DynAnalyzer};

// 도메인 타입
pub use types::{AnalysisResult, Severity};
