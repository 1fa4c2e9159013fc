//! 에러 타입 -- 도메인별 에러 정의

/// tailguard 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TailguardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 분석 에러
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// 알림 전송 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 감시 대상 파일을 더 이상 읽을 수 없음
    #[error("log source lost: {0}")]
    SourceLost(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

/// 분석기 에러
///
/// 파이프라인은 이 에러를 기록하고 다음 이벤트로 넘어갑니다.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 외부 분석 엔진 요청 실패
    #[error("analyzer request failed: {0}")]
    Request(String),

    /// 분석 엔진 응답 해석 실패
    #[error("invalid analyzer response: {0}")]
    InvalidResponse(String),

    /// 시간 초과
    #[error("analysis timed out after {secs}s")]
    Timeout { secs: u64 },

    /// 취소됨
    #[error("analysis cancelled")]
    Cancelled,
}

/// 알림 채널 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 전송 요청 실패 (네트워크, 인증 등)
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// 채널이 거부 응답을 반환함
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// 페이로드 생성 실패
    #[error("payload error: {0}")]
    Payload(String),

    /// 취소됨
    #[error("delivery cancelled")]
    Cancelled,
}
