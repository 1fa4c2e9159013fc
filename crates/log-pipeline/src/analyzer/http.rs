//! HTTP 분석기
//!
//! 이벤트를 JSON으로 외부 분석 엔드포인트에 POST하고, 응답 본문을
//! [`AnalysisResult`]로 해석합니다.
//!
//! 응답 예시:
//! ```json
//! {"should_alert": true, "severity": "high", "summary": "DB pool exhausted",
//!  "suggested_fix": "increase max connections"}
//! ```

use reqwest::Client;
use tailguard_core::error::AnalysisError;
use tailguard_core::event::LogEvent;
use tailguard_core::pipeline::Analyzer;
use tailguard_core::types::AnalysisResult;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::LogPipelineError;

/// HTTP 분석기
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpAnalyzer {
    /// 엔드포인트를 지정하여 생성합니다.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LogPipelineError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "analyzer.endpoint".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        let client = Client::builder()
            .user_agent(concat!("tailguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint,
            api_key: None,
            client,
        })
    }

    /// Bearer 토큰을 설정합니다. 빈 문자열이면 인증 헤더를 보내지 않습니다.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// 분석 엔드포인트
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, event: &LogEvent) -> Result<AnalysisResult, AnalysisError> {
        let mut request = self.client.post(&self.endpoint).json(event);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(AnalysisError::Request(format!(
                "status {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let mut result: AnalysisResult = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
        if result.analyzer.is_empty() {
            result.analyzer = "http".to_owned();
        }

        debug!(
            should_alert = result.should_alert,
            severity = %result.severity,
            "analysis received"
        );
        Ok(result)
    }
}

impl Analyzer for HttpAnalyzer {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze(
        &self,
        event: &LogEvent,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AnalysisError::Cancelled),
            result = self.request(event) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_endpoint_is_rejected() {
        let err = HttpAnalyzer::new("").unwrap_err();
        assert!(err.to_string().contains("analyzer.endpoint"));
    }

    #[test]
    fn empty_api_key_is_ignored() {
        let analyzer = HttpAnalyzer::new("http://127.0.0.1:9/analyze")
            .unwrap()
            .with_api_key("");
        assert!(analyzer.api_key.is_none());
        assert_eq!(analyzer.endpoint(), "http://127.0.0.1:9/analyze");
    }

    #[tokio::test]
    async fn cancelled_analysis() {
        let analyzer = HttpAnalyzer::new("http://127.0.0.1:9/analyze").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let event = LogEvent::new("Svc", "Error", "m", "", Utc::now());
        let result = analyzer.analyze(&event, &cancel).await;
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }
}
