use std::path::Path;

use chrono::Utc;
use image::RgbaImage;
use tracing::{debug, info, warn};
use wplace_shared::{TileCounts, completion_percentage, count_tile, render_label};

use crate::profiles::JobProfile;
use crate::services::progress_log;
use crate::services::publisher::{self, PublishOutcome, encode_png};
use crate::services::tile_fetcher::{self, FetchedTile, decode_rgba};
use crate::state::JobContext;

/// Result of one full measure-render-publish pass.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub counts: TileCounts,
    pub percentage: f64,
    pub label: String,
    pub image: RgbaImage,
    pub publish: PublishOutcome,
}

pub async fn run_once(ctx: &JobContext) -> Result<RunReport, String> {
    let profile = &ctx.profile;
    let (counts, percentage) = measure_progress(ctx).await?;
    info!(
        profile = %profile.name,
        total_pixels = counts.total,
        done_pixels = counts.done,
        percentage,
        "measured canvas progress"
    );

    if let Some(path) = ctx.progress_log_path()
        && let Err(e) = progress_log::append_record(&path, Utc::now(), percentage).await
    {
        warn!(profile = %profile.name, error = %e, "failed to append progress log record");
    }

    let label = profile.label_text(percentage);
    let font = load_font(&ctx.font_path()).await?;
    let image = render_label(&ctx.glyphs, &font, &label, &profile.label_style);
    debug!(
        profile = %profile.name,
        label = %label,
        width = image.width(),
        height = image.height(),
        "rendered progress label"
    );

    if let Some(dir) = &ctx.label_dump_dir
        && let Err(e) = dump_label(dir, &profile.name, &image).await
    {
        warn!(profile = %profile.name, error = %e, "failed to write local label copy");
    }

    let publish = publisher::publish(
        &ctx.http_client,
        &ctx.replace_image_url,
        ctx.api_key.as_deref(),
        &profile.slug,
        &image,
    )
    .await;

    Ok(RunReport {
        counts,
        percentage,
        label,
        image,
        publish,
    })
}

/// Fetch and count every tile; fails when no pixel at all was counted.
pub async fn measure_progress(ctx: &JobContext) -> Result<(TileCounts, f64), String> {
    let fetched =
        tile_fetcher::fetch_tiles(&ctx.http_client, &ctx.profile, ctx.fetch_policy).await?;
    let counts = count_fetched(&ctx.profile, &fetched)?;
    let percentage = completion_percentage(counts)
        .ok_or_else(|| format!("no pixels counted across {} tiles", fetched.len()))?;
    Ok((counts, percentage))
}

fn count_fetched(profile: &JobProfile, fetched: &[FetchedTile]) -> Result<TileCounts, String> {
    fetched
        .iter()
        .enumerate()
        .map(|(index, fetched)| {
            let counts = count_tile(
                &fetched.tile,
                fetched.reference.as_ref(),
                profile.crop_for(index),
                profile.predicate,
            )
            .map_err(|e| format!("count tile {}: {e}", fetched.coord))?;
            debug!(
                tile = %fetched.coord,
                total_pixels = counts.total,
                done_pixels = counts.done,
                "counted tile"
            );
            Ok(counts)
        })
        .sum()
}

async fn load_font(path: &Path) -> Result<RgbaImage, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("read font {}: {e}", path.display()))?;
    decode_rgba(&bytes).map_err(|e| format!("font {}: {e}", path.display()))
}

async fn dump_label(dir: &Path, name: &str, image: &RgbaImage) -> Result<(), String> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("create {}: {e}", dir.display()))?;
    let path = dir.join(format!("{name}.png"));
    tokio::fs::write(&path, encode_png(image)?)
        .await
        .map_err(|e| format!("write {}: {e}", path.display()))
}
