use url::Url;

use crate::error::{AppError, Result};

use super::{AnimationConfig, Config, ServerConfig, TimingConfig};

/// Validate the effective configuration, listing every problem found.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_server(&config.server, &mut issues);
    validate_animation(&config.animation, &mut issues);
    validate_timings(&config.timings, &mut issues);

    if config.download_dir.as_os_str().is_empty() {
        issues.push("download_dir must not be empty".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "configuration invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_server(server: &ServerConfig, issues: &mut Vec<String>) {
    match Url::parse(&server.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => issues.push(format!(
            "server.base_url must use http or https, found `{}`",
            url.scheme()
        )),
        Err(err) => issues.push(format!(
            "server.base_url `{}` is not a valid URL: {err}",
            server.base_url
        )),
    }

    for (name, path) in [
        ("server.status_path", &server.status_path),
        ("server.login_path", &server.login_path),
        ("server.logout_path", &server.logout_path),
        ("server.export_path", &server.export_path),
    ] {
        if !path.starts_with('/') {
            issues.push(format!("{name} must start with `/`, found `{path}`"));
        }
    }

    if server.request_timeout.is_zero() {
        issues.push("server.request_timeout_ms must be positive".to_string());
    }
}

fn validate_animation(animation: &AnimationConfig, issues: &mut Vec<String>) {
    let factor = animation.easing_factor;
    if !(factor > 0.0 && factor < 1.0) {
        issues.push(format!(
            "animation.easing_factor must lie strictly between 0 and 1, found {factor}"
        ));
    }
    if !(animation.snap_threshold > 0.0) {
        issues.push(format!(
            "animation.snap_threshold must be positive, found {}",
            animation.snap_threshold
        ));
    }
    if animation.frame_interval.is_zero() {
        issues.push("animation.frame_interval_ms must be positive".to_string());
    }
}

fn validate_timings(timings: &TimingConfig, issues: &mut Vec<String>) {
    if timings.result_status_ttl.is_zero() {
        issues.push("timings.result_status_ttl_ms must be positive".to_string());
    }
    if timings.notice_ttl.is_zero() {
        issues.push("timings.notice_ttl_ms must be positive".to_string());
    }
}
