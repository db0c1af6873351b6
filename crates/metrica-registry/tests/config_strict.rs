#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrica_core::time::{DAY_MS, HOUR_MS};
use metrica_registry::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
windows:
  dayly: 1000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.refresh.interval_ms().unwrap(), 10_000);
    assert_eq!(
        cfg.window_table().unwrap(),
        metrica_registry::WindowTable::default()
    );
}

#[test]
fn unsupported_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn bad_window_expression_is_invalid_argument() {
    let bad = r#"
version: 1
windows:
  weekly: "a fortnight"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    assert!(err.to_string().contains("windows.weekly"), "{err}");
}

#[test]
fn zero_window_is_invalid_argument() {
    let err = config::load_from_str("version: 1\nwindows:\n  daily: 0\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    assert!(err.to_string().contains("windows.daily"), "{err}");
}

#[test]
fn refresh_below_floor_is_rejected() {
    let err = config::load_from_str("version: 1\nrefresh:\n  interval: 5\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
}

#[test]
fn window_overrides_apply() {
    let ok = r#"
version: 1
windows:
  daily: "2 hours"
  yearly: 172800000
refresh:
  interval: "30s"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let t = cfg.window_table().unwrap();
    assert_eq!(t.daily, 2 * HOUR_MS);
    assert_eq!(t.weekly, DAY_MS);
    assert_eq!(t.yearly, 2 * DAY_MS);
    assert_eq!(cfg.refresh.interval_ms().unwrap(), 30_000);
}
