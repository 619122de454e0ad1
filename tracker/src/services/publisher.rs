use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use reqwest::multipart::{Form, Part};
use tracing::{error, info};

pub const UPLOAD_FILE_NAME: &str = "progress.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Uploaded,
    /// No API key configured; nothing was sent.
    SkippedNoToken,
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// Encoding or transport failed before a response arrived.
    Failed(String),
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| format!("encode png: {e}"))?;
    Ok(buf)
}

/// Upload `image` as the new version of `slug`. Never fails the caller; every
/// problem is logged and reported through the returned outcome.
pub async fn publish(
    client: &reqwest::Client,
    endpoint: &str,
    token: Option<&str>,
    slug: &str,
    image: &RgbaImage,
) -> PublishOutcome {
    let Some(token) = token else {
        error!(slug, "API_KEY is not set, skipping progress image upload");
        return PublishOutcome::SkippedNoToken;
    };

    let form = match build_form(slug, image) {
        Ok(form) => form,
        Err(e) => {
            error!(slug, error = %e, "failed to prepare progress image upload");
            return PublishOutcome::Failed(e);
        }
    };

    let resp = match client
        .post(endpoint)
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            error!(slug, error = %e, "progress image upload request failed");
            return PublishOutcome::Failed(e.to_string());
        }
    };

    let status = resp.status();
    if status.is_success() {
        info!(slug, "progress image uploaded");
        return PublishOutcome::Uploaded;
    }

    let body = resp
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable response body: {e}>"));
    error!(
        slug,
        status = %status,
        body = %body,
        "failed to upload progress image"
    );
    PublishOutcome::Rejected {
        status: status.as_u16(),
        body,
    }
}

fn build_form(slug: &str, image: &RgbaImage) -> Result<Form, String> {
    let file = Part::bytes(encode_png(image)?)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str("image/png")
        .map_err(|e| format!("file part: {e}"))?;
    Ok(Form::new().part("file", file).text("slug", slug.to_string()))
}
