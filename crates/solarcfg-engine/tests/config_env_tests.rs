//! Environment overrides. Kept in its own test binary since it mutates the
//! process environment.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use solarcfg_core::CascadePolicy;
use solarcfg_engine::ClientConfig;

#[test]
fn test_environment_overrides_file_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solarcfg.toml");
    std::fs::write(&path, "base_url = \"http://from-file\"\nrequest_timeout_ms = 500\n").unwrap();
    std::env::set_var("SOLARCFG_BASE_URL", "http://from-env:9000");
    std::env::set_var("SOLARCFG_CASCADE_POLICY", "always");

    let config = ClientConfig::load(Some(&path)).unwrap();

    std::env::remove_var("SOLARCFG_BASE_URL");
    std::env::remove_var("SOLARCFG_CASCADE_POLICY");
    assert_eq!(config.base_url, "http://from-env:9000");
    assert_eq!(config.cascade_policy, CascadePolicy::Always);
    assert_eq!(config.request_timeout_ms, 500);
}
