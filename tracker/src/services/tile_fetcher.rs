use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use image::RgbaImage;
use tracing::{debug, warn};
use wplace_shared::{TileCoord, tile_url};

use crate::profiles::JobProfile;
use crate::state::FetchPolicy;

/// One tile of a run, plus its reference image when the profile compares against one.
#[derive(Debug, Clone)]
pub struct FetchedTile {
    pub coord: TileCoord,
    pub tile: RgbaImage,
    pub reference: Option<RgbaImage>,
}

/// Fetch every tile of `profile`, in tile order. The first tile that still fails
/// after all retries aborts the whole batch.
pub async fn fetch_tiles(
    client: &reqwest::Client,
    profile: &JobProfile,
    policy: FetchPolicy,
) -> Result<Vec<FetchedTile>, String> {
    let max_concurrency = policy.max_concurrency.max(1);

    stream::iter(
        profile
            .tiles
            .iter()
            .copied()
            .map(|coord| fetch_tile(client, profile, coord, policy)),
    )
    .buffered(max_concurrency)
    .try_collect()
    .await
}

async fn fetch_tile(
    client: &reqwest::Client,
    profile: &JobProfile,
    coord: TileCoord,
    policy: FetchPolicy,
) -> Result<FetchedTile, String> {
    let tile = async {
        fetch_image(client, &tile_url(&profile.tile_url, coord), policy)
            .await
            .map_err(|e| format!("fetch tile {coord}: {e}"))
    };

    let (tile, reference) = match profile.reference_url.as_deref() {
        None => (tile.await?, None),
        Some(template) => {
            let reference = async {
                fetch_image(client, &tile_url(template, coord), policy)
                    .await
                    .map_err(|e| format!("fetch reference {coord}: {e}"))
            };
            let (tile, reference) = tokio::try_join!(tile, reference)?;
            (tile, Some(reference))
        }
    };

    debug!(tile = %coord, width = tile.width(), height = tile.height(), "fetched tile");
    Ok(FetchedTile {
        coord,
        tile,
        reference,
    })
}

/// GET and decode one image, retrying with exponential backoff.
pub async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
    policy: FetchPolicy,
) -> Result<RgbaImage, String> {
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.backoff;
    let mut attempt = 1;

    loop {
        match fetch_image_once(client, url).await {
            Ok(image) => return Ok(image),
            Err(e) if attempt < max_attempts => {
                warn!(
                    url,
                    attempt,
                    max_attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "image fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(format!("{e} (after {attempt} attempts)")),
        }
    }
}

async fn fetch_image_once(client: &reqwest::Client, url: &str) -> Result<RgbaImage, String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("unexpected status {status}"));
    }
    let body: Bytes = resp
        .bytes()
        .await
        .map_err(|e| format!("read body: {e}"))?;
    decode_rgba(&body)
}

pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|e| format!("decode image: {e}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use image::{Rgba, RgbaImage};
    use wplace_shared::TileCoord;

    use super::{decode_rgba, fetch_image, fetch_tiles};
    use crate::profiles::place2022;
    use crate::state::FetchPolicy;
    use crate::test_support::{png_response, spawn_test_server};

    fn fast_policy(max_attempts: u32) -> FetchPolicy {
        FetchPolicy {
            max_concurrency: 2,
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    /// Tile whose width encodes its x coordinate and whose color encodes y.
    async fn coded_tile(Path((x, y)): Path<(u32, u32)>) -> Response {
        png_response(&RgbaImage::from_pixel(x, 2, Rgba([y as u8, 0, 0, 255])))
    }

    async fn coded_reference(Path((x, y)): Path<(u32, u32)>) -> Response {
        png_response(&RgbaImage::from_pixel(x, 2, Rgba([0, y as u8, 0, 255])))
    }

    #[tokio::test]
    async fn fetches_tiles_and_references_in_tile_order() {
        let app = Router::new()
            .route("/tiles/{x}/{y}", get(coded_tile))
            .route("/reference/{x}/{y}", get(coded_reference));
        let (addr, server_handle) = spawn_test_server(app).await;

        let mut profile = place2022().expect("profile");
        profile.tiles = vec![
            TileCoord::new(5, 1),
            TileCoord::new(1, 2),
            TileCoord::new(3, 3),
        ];
        profile.tile_url = format!("http://{addr}/tiles/{{x}}/{{y}}");
        profile.reference_url = Some(format!("http://{addr}/reference/{{x}}/{{y}}"));

        let fetched = fetch_tiles(&reqwest::Client::new(), &profile, fast_policy(1))
            .await
            .expect("fetch tiles");

        let widths: Vec<u32> = fetched.iter().map(|f| f.tile.width()).collect();
        assert_eq!(widths, vec![5, 1, 3]);
        assert_eq!(fetched[1].coord, TileCoord::new(1, 2));
        assert_eq!(fetched[1].tile.get_pixel(0, 0).0, [2, 0, 0, 255]);
        let reference = fetched[2].reference.as_ref().expect("reference image");
        assert_eq!(reference.get_pixel(0, 0).0, [0, 3, 0, 255]);

        server_handle.abort();
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/flaky",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        StatusCode::SERVICE_UNAVAILABLE.into_response()
                    } else {
                        png_response(&RgbaImage::new(3, 3))
                    }
                }),
            )
            .with_state(Arc::clone(&hits));
        let (addr, server_handle) = spawn_test_server(app).await;

        let image = fetch_image(
            &reqwest::Client::new(),
            &format!("http://{addr}/flaky"),
            fast_policy(3),
        )
        .await
        .expect("third attempt should succeed");

        assert_eq!(image.dimensions(), (3, 3));
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        server_handle.abort();
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/tiles/{x}/{y}",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::NOT_FOUND
                }),
            )
            .with_state(Arc::clone(&hits));
        let (addr, server_handle) = spawn_test_server(app).await;

        let mut profile = place2022().expect("profile");
        profile.tiles = vec![TileCoord::new(7, 8)];
        profile.tile_url = format!("http://{addr}/tiles/{{x}}/{{y}}");
        profile.reference_url = None;

        let err = fetch_tiles(&reqwest::Client::new(), &profile, fast_policy(2))
            .await
            .expect_err("missing tile should abort the batch");

        assert!(err.contains("fetch tile 7/8"), "{err}");
        assert!(err.contains("404"), "{err}");
        assert!(err.contains("after 2 attempts"), "{err}");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        server_handle.abort();
    }

    #[test]
    fn decode_rejects_non_image_bytes() {
        assert!(decode_rgba(b"definitely not a png").is_err());
    }
}
