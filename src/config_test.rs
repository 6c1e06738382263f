use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.polling.attempts, DEFAULT_REPORT_POLL_ATTEMPTS);
    assert_eq!(cfg.download_dir, PathBuf::from("."));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("RISKCHAT_API_BASE_URL", "https://assess.example.test/api/"),
        ("RISKCHAT_REQUEST_TIMEOUT_SECS", "42"),
        ("RISKCHAT_CONNECT_TIMEOUT_SECS", "7"),
        ("RISKCHAT_REPORT_POLL_ATTEMPTS", "3"),
        ("RISKCHAT_REPORT_POLL_INTERVAL_MS", "250"),
        ("RISKCHAT_REPORT_POLL_MAX_INTERVAL_MS", "600"),
        ("RISKCHAT_DOWNLOAD_DIR", "/tmp/reports"),
    ]))
    .unwrap();

    assert_eq!(cfg.base_url, "https://assess.example.test/api");
    assert_eq!(cfg.timeouts, Timeouts { request: Duration::from_secs(42), connect: Duration::from_secs(7) });
    assert_eq!(
        cfg.polling,
        ReportPolling {
            attempts: 3,
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_millis(600),
        }
    );
    assert_eq!(cfg.download_dir, PathBuf::from("/tmp/reports"));
}

#[test]
fn unparseable_numbers_fall_back_to_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("RISKCHAT_REQUEST_TIMEOUT_SECS", "soon"),
        ("RISKCHAT_REPORT_POLL_ATTEMPTS", "-2"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts.request, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    assert_eq!(cfg.polling.attempts, DEFAULT_REPORT_POLL_ATTEMPTS);
}

#[test]
fn zero_poll_attempts_clamped_to_one() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("RISKCHAT_REPORT_POLL_ATTEMPTS", "0")])).unwrap();
    assert_eq!(cfg.polling.attempts, 1);
}

#[test]
fn invalid_base_url_errors() {
    for bad in ["", "   ", "localhost:5000", "ftp://example.test", "http://"] {
        let err = ClientConfig::from_lookup(lookup_from(&[("RISKCHAT_API_BASE_URL", bad)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)), "{bad:?} should be rejected");
    }
}

#[test]
fn normalize_base_url_trims_trailing_slashes() {
    assert_eq!(normalize_base_url("http://127.0.0.1:5000/api//").unwrap(), "http://127.0.0.1:5000/api");
}

// =============================================================
// ReportPolling
// =============================================================

#[test]
fn polling_first_attempt_is_immediate() {
    let polling = ReportPolling::default();
    assert_eq!(polling.delay_before(0), Duration::ZERO);
}

#[test]
fn polling_backoff_doubles_then_caps() {
    let polling = ReportPolling {
        attempts: 10,
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_millis(500),
    };
    assert_eq!(polling.delay_before(1), Duration::from_millis(100));
    assert_eq!(polling.delay_before(2), Duration::from_millis(200));
    assert_eq!(polling.delay_before(3), Duration::from_millis(400));
    assert_eq!(polling.delay_before(4), Duration::from_millis(500));
    assert_eq!(polling.delay_before(40), Duration::from_millis(500));
}

#[test]
fn single_shot_polls_once() {
    let polling = ReportPolling::single_shot();
    assert_eq!(polling.attempts, 1);
    assert_eq!(polling.delay_before(1), Duration::ZERO);
}

#[test]
fn zero_timeouts_clamped_to_one_second() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("RISKCHAT_REQUEST_TIMEOUT_SECS", "0"),
        ("RISKCHAT_CONNECT_TIMEOUT_SECS", "0"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts, Timeouts { request: Duration::from_secs(1), connect: Duration::from_secs(1) });
}
