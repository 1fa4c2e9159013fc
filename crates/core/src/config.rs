//! 설정 관리 -- tailguard.toml 파싱 및 런타임 설정
//!
//! [`TailguardConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//! 파이프라인 크레이트는 설정을 직접 읽지 않고, 데몬이 이 설정으로 생성한
//! 분석기/알림 채널/테일러를 주입받습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TAILGUARD_WATCHER_PATH=/var/log/app.log` 형식)
//! 3. 설정 파일 (`tailguard.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tailguard_core::error::TailguardError> {
//! use tailguard_core::config::TailguardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TailguardConfig::load("tailguard.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TailguardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TailguardError};
use crate::types::Severity;

/// tailguard 통합 설정
///
/// `tailguard.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailguardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 파일 감시 설정
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// 분석기 설정
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl TailguardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TailguardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TailguardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TailguardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TailguardError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TailguardError> {
        toml::from_str(toml_str).map_err(|e| {
            TailguardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TAILGUARD_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TAILGUARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TAILGUARD_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "TAILGUARD_GENERAL_PID_FILE");

        // Watcher
        override_string(&mut self.watcher.path, "TAILGUARD_WATCHER_PATH");
        override_u64(
            &mut self.watcher.poll_interval_ms,
            "TAILGUARD_WATCHER_POLL_INTERVAL_MS",
        );
        override_usize(
            &mut self.watcher.max_line_length,
            "TAILGUARD_WATCHER_MAX_LINE_LENGTH",
        );
        override_bool(
            &mut self.watcher.reopen_on_truncate,
            "TAILGUARD_WATCHER_REOPEN_ON_TRUNCATE",
        );

        // Analyzer
        override_string(&mut self.analyzer.kind, "TAILGUARD_ANALYZER_KIND");
        override_string(&mut self.analyzer.endpoint, "TAILGUARD_ANALYZER_ENDPOINT");
        override_string(&mut self.analyzer.api_key, "TAILGUARD_ANALYZER_API_KEY");
        override_string(
            &mut self.analyzer.min_severity,
            "TAILGUARD_ANALYZER_MIN_SEVERITY",
        );
        override_u64(
            &mut self.analyzer.timeout_secs,
            "TAILGUARD_ANALYZER_TIMEOUT_SECS",
        );

        // Alerts
        override_u64(
            &mut self.alerts.sink_timeout_secs,
            "TAILGUARD_ALERTS_SINK_TIMEOUT_SECS",
        );
        override_bool(&mut self.alerts.log_enabled, "TAILGUARD_ALERTS_LOG_ENABLED");
        override_bool(
            &mut self.alerts.webhook.enabled,
            "TAILGUARD_ALERTS_WEBHOOK_ENABLED",
        );
        override_string(&mut self.alerts.webhook.url, "TAILGUARD_ALERTS_WEBHOOK_URL");
        override_string(
            &mut self.alerts.webhook.format,
            "TAILGUARD_ALERTS_WEBHOOK_FORMAT",
        );
        override_string(
            &mut self.alerts.webhook.username,
            "TAILGUARD_ALERTS_WEBHOOK_USERNAME",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "TAILGUARD_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "TAILGUARD_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "TAILGUARD_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TailguardError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000;
        const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.watcher.path.trim().is_empty() {
            return Err(invalid("watcher.path", "must not be empty"));
        }

        if self.watcher.poll_interval_ms == 0 || self.watcher.poll_interval_ms > MAX_POLL_INTERVAL_MS
        {
            return Err(invalid(
                "watcher.poll_interval_ms",
                format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            ));
        }

        if self.watcher.max_line_length == 0 || self.watcher.max_line_length > MAX_LINE_LENGTH {
            return Err(invalid(
                "watcher.max_line_length",
                format!("must be 1-{}", MAX_LINE_LENGTH),
            ));
        }

        let valid_kinds = ["rules", "http"];
        if !valid_kinds.contains(&self.analyzer.kind.as_str()) {
            return Err(invalid(
                "analyzer.kind",
                format!("must be one of: {}", valid_kinds.join(", ")),
            ));
        }

        if self.analyzer.kind == "http" && self.analyzer.endpoint.is_empty() {
            return Err(invalid(
                "analyzer.endpoint",
                "endpoint must not be empty when analyzer.kind is 'http'",
            ));
        }

        if Severity::from_str_loose(&self.analyzer.min_severity).is_none() {
            return Err(invalid(
                "analyzer.min_severity",
                "must be one of: info, low, medium, high, critical",
            ));
        }

        if self.alerts.webhook.enabled {
            if self.alerts.webhook.url.is_empty() {
                return Err(invalid(
                    "alerts.webhook.url",
                    "url must not be empty when the webhook is enabled",
                ));
            }
            let valid_webhook_formats = ["discord", "json"];
            let format = self.alerts.webhook.format.trim().to_lowercase();
            if !valid_webhook_formats.contains(&format.as_str()) {
                return Err(invalid(
                    "alerts.webhook.format",
                    format!("must be one of: {}", valid_webhook_formats.join(", ")),
                ));
            }
        }

        if !self.alerts.webhook.enabled && !self.alerts.log_enabled {
            return Err(invalid(
                "alerts",
                "at least one alert sink must be enabled",
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> TailguardError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 0을 "제한 없음"으로 해석하여 Duration으로 변환합니다.
fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 파일 감시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// 감시할 로그 파일 경로
    pub path: String,
    /// 새 내용이 없을 때 대기 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 최대 라인 길이 (바이트), 초과 라인은 버림
    pub max_line_length: usize,
    /// 파일이 잘리거나 교체되면 처음부터 다시 읽을지 여부
    pub reopen_on_truncate: bool,
}

impl WatcherConfig {
    /// 대기 간격을 Duration으로 반환합니다.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            path: "app_logs.txt".to_owned(),
            poll_interval_ms: 1000,
            max_line_length: 64 * 1024, // 64KB
            reopen_on_truncate: true,
        }
    }
}

/// 분석기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// 분석기 종류 (rules, http)
    pub kind: String,
    /// HTTP 분석 엔진 엔드포인트
    pub endpoint: String,
    /// HTTP 분석 엔진 API 키 (Bearer)
    pub api_key: String,
    /// 규칙 분석기의 알림 최소 심각도
    pub min_severity: String,
    /// 분석 제한 시간 (초, 0이면 제한 없음)
    pub timeout_secs: u64,
}

impl AnalyzerConfig {
    /// 분석 제한 시간을 반환합니다.
    pub fn timeout(&self) -> Option<Duration> {
        optional_secs(self.timeout_secs)
    }

    /// 알림 최소 심각도를 반환합니다. 검증 전 값이 잘못되었으면 `Medium`.
    pub fn min_severity(&self) -> Severity {
        Severity::from_str_loose(&self.min_severity).unwrap_or(Severity::Medium)
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            kind: "rules".to_owned(),
            endpoint: String::new(),
            api_key: String::new(),
            min_severity: "medium".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// 알림 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// 채널별 전송 제한 시간 (초, 0이면 제한 없음)
    pub sink_timeout_secs: u64,
    /// 구조화 로그 채널 활성화
    pub log_enabled: bool,
    /// 웹훅 채널 설정
    pub webhook: WebhookConfig,
}

impl AlertsConfig {
    /// 채널별 전송 제한 시간을 반환합니다.
    pub fn sink_timeout(&self) -> Option<Duration> {
        optional_secs(self.sink_timeout_secs)
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            sink_timeout_secs: 10,
            log_enabled: true,
            webhook: WebhookConfig::default(),
        }
    }
}

/// 웹훅 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 웹훅 URL
    pub url: String,
    /// 페이로드 형식 (discord, json)
    pub format: String,
    /// 표시 이름 (discord 형식에서 사용)
    pub username: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            format: "discord".to_owned(),
            username: "tailguard".to_owned(),
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = TailguardConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.watcher.poll_interval_ms, 1000);
        assert!(config.watcher.reopen_on_truncate);
        assert_eq!(config.analyzer.kind, "rules");
        assert!(config.alerts.log_enabled);
        assert!(!config.alerts.webhook.enabled);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        TailguardConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = TailguardConfig::parse("").unwrap();
        assert_eq!(config.watcher.path, "app_logs.txt");
        assert_eq!(config.alerts.sink_timeout_secs, 10);
    }

    #[test]
    fn partial_toml_merges_with_defaults() {
        let toml = r#"
[watcher]
path = "/var/log/app/app.log"

[alerts.webhook]
enabled = true
url = "https://discord.example/api/webhooks/1/abc"
"#;
        let config = TailguardConfig::parse(toml).unwrap();
        assert_eq!(config.watcher.path, "/var/log/app/app.log");
        assert_eq!(config.watcher.poll_interval_ms, 1000);
        assert!(config.alerts.webhook.enabled);
        assert_eq!(config.alerts.webhook.format, "discord");
        config.validate().unwrap();
    }

    #[test]
    fn invalid_toml_fails_to_parse() {
        let err = TailguardConfig::parse("[watcher\npath = 1").unwrap_err();
        assert!(matches!(
            err,
            TailguardError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let mut config = TailguardConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = TailguardConfig::default();
        config.watcher.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_http_analyzer_without_endpoint() {
        let mut config = TailguardConfig::default();
        config.analyzer.kind = "http".to_owned();
        assert!(config.validate().is_err());
        config.analyzer.endpoint = "http://127.0.0.1:8080/analyze".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_enabled_webhook_without_url() {
        let mut config = TailguardConfig::default();
        config.alerts.webhook.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_webhook_format_in_any_case() {
        let mut config = TailguardConfig::default();
        config.alerts.webhook.enabled = true;
        config.alerts.webhook.url = "https://example.com/hook".to_owned();
        config.alerts.webhook.format = " Discord ".to_owned();
        config.validate().unwrap();

        config.alerts.webhook.format = "JSON".to_owned();
        config.validate().unwrap();

        config.alerts.webhook.format = "Slack".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_at_least_one_sink() {
        let mut config = TailguardConfig::default();
        config.alerts.log_enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeouts_disable_limits() {
        let mut config = TailguardConfig::default();
        assert_eq!(config.analyzer.timeout(), Some(Duration::from_secs(30)));
        config.analyzer.timeout_secs = 0;
        config.alerts.sink_timeout_secs = 0;
        assert!(config.analyzer.timeout().is_none());
        assert!(config.alerts.sink_timeout().is_none());
    }

    #[test]
    fn min_severity_parses() {
        let mut config = TailguardConfig::default();
        config.analyzer.min_severity = "HIGH".to_owned();
        assert_eq!(config.analyzer.min_severity(), Severity::High);
    }
}
