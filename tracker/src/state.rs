use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use wplace_shared::GlyphTable;

use crate::config::{
    USER_AGENT, api_key, fetch_backoff, fetch_max_attempts, fetch_max_concurrency, font_dir,
    label_dump_dir, progress_log_dir, replace_image_url, upstream_connect_timeout,
    upstream_http_timeout,
};
use crate::profiles::JobProfile;

/// Limits applied to every tile request.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub max_concurrency: usize,
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further attempt.
    pub backoff: Duration,
}

impl FetchPolicy {
    pub fn from_env() -> Self {
        Self {
            max_concurrency: fetch_max_concurrency(),
            max_attempts: fetch_max_attempts(),
            backoff: fetch_backoff(),
        }
    }
}

/// Everything one scheduled job needs, built once at startup.
#[derive(Clone)]
pub struct JobContext {
    pub profile: Arc<JobProfile>,
    pub glyphs: Arc<GlyphTable>,
    pub http_client: reqwest::Client,
    pub fetch_policy: FetchPolicy,
    pub api_key: Option<String>,
    pub replace_image_url: String,
    pub font_dir: PathBuf,
    pub progress_log_dir: PathBuf,
    pub label_dump_dir: Option<PathBuf>,
}

impl JobContext {
    pub fn new(profile: JobProfile, http_client: reqwest::Client) -> Result<Self, String> {
        profile.validate()?;
        let glyphs = GlyphTable::build(&profile.font)
            .map_err(|e| format!("profile {}: {e}", profile.name))?;
        Ok(Self {
            profile: Arc::new(profile),
            glyphs: Arc::new(glyphs),
            http_client,
            fetch_policy: FetchPolicy::from_env(),
            api_key: api_key(),
            replace_image_url: replace_image_url(),
            font_dir: font_dir(),
            progress_log_dir: progress_log_dir(),
            label_dump_dir: label_dump_dir(),
        })
    }

    pub fn font_path(&self) -> PathBuf {
        self.font_dir.join(&self.profile.font_file)
    }

    pub fn progress_log_path(&self) -> Option<PathBuf> {
        self.profile
            .progress_log
            .as_ref()
            .map(|name| self.progress_log_dir.join(name))
    }
}

pub fn build_http_client() -> reqwest::Client {
    let request_timeout = upstream_http_timeout();
    let connect_timeout = upstream_connect_timeout();
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .build()
        .or_else(|e| {
            warn!(
                error = %e,
                "failed to build configured HTTP client, retrying without custom user-agent"
            );
            reqwest::Client::builder()
                .timeout(request_timeout)
                .connect_timeout(connect_timeout)
                .build()
        })
        .unwrap_or_else(|e| {
            panic!("failed to build timeout-configured HTTP client: {e}");
        })
}
