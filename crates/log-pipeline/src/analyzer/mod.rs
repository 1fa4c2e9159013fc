//! 분석기 구현
//!
//! - [`SeverityAnalyzer`]: 레벨과 스택 트레이스로 심각도를 판정하는 결정적 규칙
//! - [`HttpAnalyzer`]: 외부 분석 엔진(AI 등) HTTP 엔드포인트 호출

pub mod http;
pub mod severity;

pub use http::HttpAnalyzer;
pub use severity::SeverityAnalyzer;
