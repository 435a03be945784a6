use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Context, Result};

use super::{validator, Config};

pub const ENV_BASE_URL: &str = "PLAYLIST_EXPORT_BASE_URL";
pub const ENV_DOWNLOAD_DIR: &str = "PLAYLIST_EXPORT_DOWNLOAD_DIR";
pub const ENV_SESSION_COOKIE: &str = "PLAYLIST_EXPORT_SESSION_COOKIE";

/// Values supplied on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub session_cookie: Option<String>,
}

/// Build the effective configuration: builtin defaults, then the optional JSON
/// file, then the process environment, then CLI overrides. The result is validated.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = Config::builtin();

    if let Some(path) = path {
        let raw = read_raw_config(path)?;
        raw.apply(&mut config);
    }

    apply_env(&mut config, |name| std::env::var(name).ok());
    apply_overrides(&mut config, overrides);

    validator::validate_config(&config)?;
    Ok(config)
}

fn read_raw_config(path: &Path) -> Result<RawConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;
    let raw: RawConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;
    Ok(raw)
}

pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()) {
        config.server.base_url = url;
    }
    if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|value| !value.trim().is_empty()) {
        config.download_dir = PathBuf::from(dir);
    }
    if let Some(cookie) = lookup(ENV_SESSION_COOKIE).filter(|value| !value.trim().is_empty()) {
        config.server.session_cookie = Some(cookie);
    }
}

pub fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(url) = &overrides.base_url {
        config.server.base_url = url.clone();
    }
    if let Some(dir) = &overrides.download_dir {
        config.download_dir = dir.clone();
    }
    if let Some(cookie) = &overrides.session_cookie {
        config.server.session_cookie = Some(cookie.clone());
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: RawServerConfig,
    #[serde(default)]
    animation: RawAnimationConfig,
    #[serde(default)]
    timings: RawTimingConfig,
    download_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawServerConfig {
    base_url: Option<String>,
    status_path: Option<String>,
    login_path: Option<String>,
    logout_path: Option<String>,
    export_path: Option<String>,
    session_cookie: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawAnimationConfig {
    easing_factor: Option<f64>,
    snap_threshold: Option<f64>,
    frame_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawTimingConfig {
    reset_delay_ms: Option<u64>,
    result_status_ttl_ms: Option<u64>,
    notice_ttl_ms: Option<u64>,
}

impl RawConfig {
    fn apply(self, config: &mut Config) {
        let server = &mut config.server;
        if let Some(value) = self.server.base_url {
            server.base_url = value;
        }
        if let Some(value) = self.server.status_path {
            server.status_path = value;
        }
        if let Some(value) = self.server.login_path {
            server.login_path = value;
        }
        if let Some(value) = self.server.logout_path {
            server.logout_path = value;
        }
        if let Some(value) = self.server.export_path {
            server.export_path = value;
        }
        if self.server.session_cookie.is_some() {
            server.session_cookie = self.server.session_cookie;
        }
        if let Some(ms) = self.server.request_timeout_ms {
            server.request_timeout = Duration::from_millis(ms);
        }

        let animation = &mut config.animation;
        if let Some(value) = self.animation.easing_factor {
            animation.easing_factor = value;
        }
        if let Some(value) = self.animation.snap_threshold {
            animation.snap_threshold = value;
        }
        if let Some(ms) = self.animation.frame_interval_ms {
            animation.frame_interval = Duration::from_millis(ms);
        }

        let timings = &mut config.timings;
        if let Some(ms) = self.timings.reset_delay_ms {
            timings.reset_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timings.result_status_ttl_ms {
            timings.result_status_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timings.notice_ttl_ms {
            timings.notice_ttl = Duration::from_millis(ms);
        }

        if let Some(dir) = self.download_dir {
            config.download_dir = dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_values_overlay_builtin_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "server": { "base_url": "https://export.example.org", "request_timeout_ms": 2500 },
                "animation": { "easing_factor": 0.3 },
                "timings": { "reset_delay_ms": 500 },
                "download_dir": "out"
            }"#,
        )
        .expect("write config");

        let config = load_config(Some(&path), &ConfigOverrides::default()).expect("load config");

        assert_eq!(config.server.base_url, "https://export.example.org");
        assert_eq!(config.server.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.server.export_path, "/api/export/progress");
        assert_eq!(config.animation.easing_factor, 0.3);
        assert_eq!(config.animation.snap_threshold, 0.5);
        assert_eq!(config.timings.reset_delay, Duration::from_millis(500));
        assert_eq!(config.download_dir, PathBuf::from("out"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "server": { "port": 10 } }"#).expect("write config");

        let err = load_config(Some(&path), &ConfigOverrides::default())
            .expect_err("unknown key should fail");
        assert!(
            err.to_string().contains("failed to parse config JSON"),
            "unexpected error message: {err}"
        );
    }

    #[test]
    fn environment_then_overrides_take_precedence() {
        let env = HashMap::from([
            (ENV_BASE_URL, "http://env.local:9000"),
            (ENV_DOWNLOAD_DIR, "env-dir"),
            (ENV_SESSION_COOKIE, ""),
        ]);
        let mut config = Config::builtin();
        apply_env(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.base_url, "http://env.local:9000");
        assert_eq!(config.download_dir, PathBuf::from("env-dir"));
        assert!(config.server.session_cookie.is_none());

        let overrides = ConfigOverrides {
            base_url: Some("http://cli.local".to_string()),
            download_dir: None,
            session_cookie: Some("session=abc".to_string()),
        };
        apply_overrides(&mut config, &overrides);

        assert_eq!(config.server.base_url, "http://cli.local");
        assert_eq!(config.download_dir, PathBuf::from("env-dir"));
        assert_eq!(config.server.session_cookie.as_deref(), Some("session=abc"));
    }
}
