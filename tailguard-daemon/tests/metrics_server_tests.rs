//! Integration tests for metrics server functionality.
//!
//! The global recorder can only be installed once per process. The
//! failure cases are rejected before installation, so only one test
//! here actually installs it.

use serial_test::serial;
use tailguard_core::config::MetricsConfig;
use tailguard_daemon::metrics_server;

fn config(listen_addr: &str, port: u16, endpoint: &str) -> MetricsConfig {
    MetricsConfig {
        enabled: true,
        listen_addr: listen_addr.to_owned(),
        port,
        endpoint: endpoint.to_owned(),
    }
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: An invalid IP address
    let config = config("999.999.999.999", 9100, "/metrics");

    // When/Then: Installation fails before binding
    let result = metrics_server::install_metrics_recorder(&config);
    assert!(result.is_err(), "invalid address should be rejected");
}

#[test]
#[serial]
fn test_install_metrics_recorder_rejects_unsupported_endpoint() {
    let config = config("127.0.0.1", 19101, "/custom");

    let err = metrics_server::install_metrics_recorder(&config)
        .expect_err("custom endpoint should be rejected");
    assert!(err.to_string().contains("/custom"));
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_succeeds_with_valid_config() {
    // Given: A valid metrics configuration on a non-standard port
    let config = config("127.0.0.1", 19100, "/metrics");

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should succeed
    assert!(
        result.is_ok(),
        "install_metrics_recorder should succeed with valid config: {:?}",
        result.err()
    );
}
