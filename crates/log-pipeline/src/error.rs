//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 에러를 표현합니다.
//! `From<LogPipelineError> for TailguardError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 파싱 실패는 에러가 아닙니다. 해석할 수 없는 라인은
//! [`ParseOutcome::Skipped`](crate::parser::ParseOutcome::Skipped)로 버려집니다.

use tailguard_core::error::{PipelineError, TailguardError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 감시 대상 파일을 읽을 수 없음 (테일러 종료)
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 감시 대상 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// HTTP 클라이언트 생성 에러
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogPipelineError {
    /// 테일러 에러를 생성합니다.
    pub fn tail(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Tail {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// 입력 소스를 잃어버린 치명적 에러인지 확인합니다.
    pub fn is_source_lost(&self) -> bool {
        matches!(self, Self::Tail { .. })
    }
}

impl From<LogPipelineError> for TailguardError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Tail { .. } => {
                TailguardError::Pipeline(PipelineError::SourceLost(err.to_string()))
            }
            LogPipelineError::Io(e) => TailguardError::Io(e),
            other => TailguardError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
