use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REPLACE_IMAGE_URL: &str = "https://cfp.is-a.dev/wplace/api/replaceImage";
pub const USER_AGENT: &str = "wplace-tracker/0.1";

pub const DEFAULT_PROFILES: &str = "place2023,place2022";
pub const DEFAULT_FONT_DIR: &str = "assets";
pub const DEFAULT_PROGRESS_LOG_DIR: &str = ".";

pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_FETCH_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_FETCH_BACKOFF_MS: u64 = 500;

/// Bearer token for the replace-image endpoint. Blank values count as missing.
pub fn api_key() -> Option<String> {
    non_empty_var("API_KEY")
}

pub fn replace_image_url() -> String {
    non_empty_var("REPLACE_IMAGE_URL").unwrap_or_else(|| DEFAULT_REPLACE_IMAGE_URL.to_string())
}

/// Profile names to schedule, in order, without duplicates.
pub fn enabled_profiles() -> Vec<String> {
    let raw = non_empty_var("TRACKER_PROFILES").unwrap_or_else(|| DEFAULT_PROFILES.to_string());
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let name = name.to_ascii_lowercase();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

pub fn font_dir() -> PathBuf {
    non_empty_var("FONT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_DIR))
}

pub fn progress_log_dir() -> PathBuf {
    non_empty_var("PROGRESS_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRESS_LOG_DIR))
}

/// Directory receiving a local copy of every rendered label, if set.
pub fn label_dump_dir() -> Option<PathBuf> {
    non_empty_var("LABEL_DUMP_DIR").map(PathBuf::from)
}

pub fn run_once() -> bool {
    std::env::var("RUN_ONCE")
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn fetch_max_concurrency() -> usize {
    std::env::var("FETCH_MAX_CONCURRENCY")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_FETCH_MAX_CONCURRENCY)
}

pub fn fetch_max_attempts() -> u32 {
    std::env::var("FETCH_MAX_ATTEMPTS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_FETCH_MAX_ATTEMPTS)
}

pub fn fetch_backoff() -> Duration {
    std::env::var("FETCH_BACKOFF_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_FETCH_BACKOFF_MS))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
