//! 알림 전달 -- 분석 결과를 여러 알림 채널로 동시에 전달합니다.
//!
//! - [`CompositeDispatcher`]: 등록된 모든 채널로 팬아웃 (채널 실패 격리)
//! - [`WebhookSink`]: Discord/JSON 웹훅
//! - [`LogSink`]: `tracing` 레코드로 기록

pub mod dispatcher;
pub mod log;
pub mod webhook;

pub use dispatcher::{CompositeDispatcher, DeliveryResult, DispatchReport, SinkOutcome};
pub use log::LogSink;
pub use webhook::{WebhookFormat, WebhookSink};
