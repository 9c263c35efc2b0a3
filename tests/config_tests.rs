//! Tests for environment-driven configuration.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use tokenward::config::{
    ClientConfig, ENV_BASE_URL, ENV_REFRESH_PATH, ENV_REFRESH_TIMEOUT_SECS,
    ENV_REQUEST_TIMEOUT_SECS, ENV_STORAGE_DIR,
};
use tokenward::error::ClientError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 5] = [
    ENV_BASE_URL,
    ENV_REFRESH_PATH,
    ENV_REQUEST_TIMEOUT_SECS,
    ENV_REFRESH_TIMEOUT_SECS,
    ENV_STORAGE_DIR,
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }

    fn cleared() -> Self {
        let guard = Self::capture(&CONFIG_ENV_VARS);
        for key in CONFIG_ENV_VARS {
            std::env::remove_var(key);
        }
        guard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn from_env_requires_base_url() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::cleared();

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ClientError::Configuration(ref msg) if msg.contains(ENV_BASE_URL)));
}

#[test]
fn from_env_reads_every_setting() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::cleared();
    std::env::set_var(ENV_BASE_URL, "https://api.example.com/api");
    std::env::set_var(ENV_REFRESH_PATH, "/token/refresh/");
    std::env::set_var(ENV_REQUEST_TIMEOUT_SECS, "12");
    std::env::set_var(ENV_REFRESH_TIMEOUT_SECS, " 4 ");
    std::env::set_var(ENV_STORAGE_DIR, "/tmp/tokenward-test");

    let config = ClientConfig::from_env().unwrap();

    assert_eq!(config.base_url, "https://api.example.com/api");
    assert_eq!(
        config.refresh_url().unwrap(),
        "https://api.example.com/api/token/refresh/"
    );
    assert_eq!(config.request_timeout, Duration::from_secs(12));
    assert_eq!(config.refresh_timeout, Duration::from_secs(4));
    assert_eq!(config.storage_dir, PathBuf::from("/tmp/tokenward-test"));
}

#[test]
fn from_env_applies_defaults() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::cleared();
    std::env::set_var(ENV_BASE_URL, "http://localhost:8000/api");

    let config = ClientConfig::from_env().unwrap();

    assert_eq!(config.refresh_path, "/auth/refresh/");
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert_eq!(config.refresh_timeout, Duration::from_secs(30));
    assert!(config.storage_dir.ends_with(".tokenward"));
}

#[test]
fn malformed_timeout_is_configuration_error() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::cleared();
    std::env::set_var(ENV_BASE_URL, "http://localhost:8000/api");
    std::env::set_var(ENV_REFRESH_TIMEOUT_SECS, "soon");

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ClientError::Configuration(ref msg) if msg.contains(ENV_REFRESH_TIMEOUT_SECS)));
}

#[test]
fn unsupported_scheme_is_rejected() {
    let _lock = env_lock_guard();
    let _env = EnvGuard::cleared();
    std::env::set_var(ENV_BASE_URL, "ftp://files.example.com");

    assert!(matches!(
        ClientConfig::from_env(),
        Err(ClientError::Configuration(_))
    ));
}

#[test]
fn builder_overrides_defaults() {
    let config = ClientConfig::builder()
        .base_url("https://api.example.com")
        .refresh_path("/jwt/refresh")
        .refresh_timeout(Duration::from_millis(1500))
        .storage_dir(PathBuf::from("/var/lib/tokenward"))
        .build();

    assert_eq!(
        config.refresh_url().unwrap(),
        "https://api.example.com/jwt/refresh"
    );
    assert_eq!(config.refresh_timeout, Duration::from_millis(1500));
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert_eq!(
        config.store_config().base_dir,
        PathBuf::from("/var/lib/tokenward")
    );
}
