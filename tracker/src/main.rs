mod config;
mod pipeline;
mod profiles;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::{JobContext, build_http_client};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let http_client = build_http_client();
    let mut jobs = Vec::new();
    for name in config::enabled_profiles() {
        let ctx = match profiles::by_name(&name)
            .and_then(|profile| JobContext::new(profile, http_client.clone()))
        {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!(profile = %name, error = %e, "skipping profile");
                continue;
            }
        };
        if ctx.api_key.is_none() {
            tracing::warn!(profile = %name, "API_KEY is not set; labels will not be uploaded");
        }
        tracing::info!(
            profile = %name,
            tiles = ctx.profile.tiles.len(),
            font = %ctx.font_path().display(),
            "profile loaded"
        );
        jobs.push(ctx);
    }

    if jobs.is_empty() {
        tracing::error!("no usable profiles configured, nothing to do");
        return;
    }

    if config::run_once() {
        for ctx in &jobs {
            services::scheduler::run_tick(ctx).await;
        }
        return;
    }

    for ctx in jobs {
        tokio::spawn(services::scheduler::run(ctx));
    }

    shutdown_signal().await;
    tracing::info!("progress tracker shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
