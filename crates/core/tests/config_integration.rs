//! tailguard.toml 통합 설정 테스트
//!
//! - tailguard.toml.example 파싱 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 에러 테스트

use serial_test::serial;
use tailguard_core::config::TailguardConfig;
use tailguard_core::error::{ConfigError, TailguardError};

// =============================================================================
// tailguard.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../tailguard.toml.example");
    let config = TailguardConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.watcher.path, "/var/log/app/app_logs.txt");
    assert_eq!(config.watcher.poll_interval_ms, 1000);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../tailguard.toml.example");
    let config = TailguardConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_alert_defaults() {
    let content = include_str!("../../../tailguard.toml.example");
    let config = TailguardConfig::parse(content).expect("should parse");

    assert!(config.alerts.log_enabled);
    assert!(!config.alerts.webhook.enabled);
    assert_eq!(config.alerts.webhook.format, "discord");
    assert_eq!(config.alerts.sink_timeout_secs, 10);
    assert_eq!(config.analyzer.timeout_secs, 30);
}

// =============================================================================
// 환경변수 오버라이드 테스트
// =============================================================================

#[test]
#[serial]
fn env_overrides_take_precedence_over_file() {
    let mut config = TailguardConfig::parse("[watcher]\npath = \"/tmp/from-file.log\"").unwrap();

    // SAFETY: serial 테스트에서만 환경변수를 변경합니다.
    unsafe {
        std::env::set_var("TAILGUARD_WATCHER_PATH", "/tmp/from-env.log");
        std::env::set_var("TAILGUARD_ALERTS_SINK_TIMEOUT_SECS", "3");
    }
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("TAILGUARD_WATCHER_PATH");
        std::env::remove_var("TAILGUARD_ALERTS_SINK_TIMEOUT_SECS");
    }

    assert_eq!(config.watcher.path, "/tmp/from-env.log");
    assert_eq!(config.alerts.sink_timeout_secs, 3);
}

#[test]
#[serial]
fn unparsable_env_value_is_ignored() {
    let mut config = TailguardConfig::default();

    unsafe {
        std::env::set_var("TAILGUARD_WATCHER_POLL_INTERVAL_MS", "soon");
    }
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("TAILGUARD_WATCHER_POLL_INTERVAL_MS");
    }

    assert_eq!(config.watcher.poll_interval_ms, 1000);
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_missing_file_returns_not_found() {
    let err = TailguardConfig::load("/nonexistent/tailguard.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TailguardError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn load_from_file_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tailguard.toml");
    tokio::fs::write(&path, "[general]\nlog_format = \"yaml\"\n")
        .await
        .unwrap();

    let err = TailguardConfig::load(&path).await.unwrap_err();
    assert!(matches!(
        err,
        TailguardError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
#[serial]
async fn load_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tailguard.toml");
    tokio::fs::write(
        &path,
        "[watcher]\npath = \"/tmp/app.log\"\npoll_interval_ms = 250\n",
    )
    .await
    .unwrap();

    let config = TailguardConfig::load(&path).await.unwrap();
    assert_eq!(config.watcher.poll_interval_ms, 250);
}
