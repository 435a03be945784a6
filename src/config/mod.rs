use std::path::PathBuf;
use std::time::Duration;

pub mod loader;
pub mod validator;

pub use loader::{load_config, ConfigOverrides};

/// Where the export server lives and which routes it exposes.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    pub status_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub export_path: String,
    /// Raw `Cookie` header value reused from a browser session, if any.
    pub session_cookie: Option<String>,
    /// Applies to the JSON auth calls only; the progress stream is long-lived.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    pub easing_factor: f64,
    pub snap_threshold: f64,
    pub frame_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Delay between a completed export and the progress panel reset.
    pub reset_delay: Duration,
    /// Lifetime of success/error statuses.
    pub result_status_ttl: Duration,
    /// Lifetime of short notices such as "Signed out".
    pub notice_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub animation: AnimationConfig,
    pub timings: TimingConfig,
    pub download_dir: PathBuf,
}

impl Config {
    pub fn builtin() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8000".to_string(),
                status_path: "/api/auth/status".to_string(),
                login_path: "/api/auth/login".to_string(),
                logout_path: "/api/auth/logout".to_string(),
                export_path: "/api/export/progress".to_string(),
                session_cookie: None,
                request_timeout: Duration::from_secs(10),
            },
            animation: AnimationConfig {
                easing_factor: 0.15,
                snap_threshold: 0.5,
                frame_interval: Duration::from_millis(16),
            },
            timings: TimingConfig {
                reset_delay: Duration::from_millis(2000),
                result_status_ttl: Duration::from_millis(5000),
                notice_ttl: Duration::from_millis(3000),
            },
            download_dir: PathBuf::from("."),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}
