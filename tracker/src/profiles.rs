use std::time::Duration;

use chrono::FixedOffset;
use wplace_shared::tile::parse_tile_list;
use wplace_shared::{
    CompletionPredicate, CropRect, FontSpec, GlyphTable, INDICATOR_FONT, LabelStyle, PLACE_FONT,
    PercentStyle, TileCoord, format_percentage,
};

const PLACE2023_TILES: &[&str] = &[
    "1088/652", "1088/653", "1089/652", "1089/653", "1090/652", "1090/653",
];
const PLACE2023_TILE_URL: &str =
    "https://cfp.is-a.dev/wplace/files/s0/tiles/{x}/{y}.png?blending=out&tag=WPLACEPLACE";

const PLACE2022_TILES: &[&str] = &["1087/651", "1087/652", "1088/651", "1088/652"];
/// Artwork bounds inside each tile, same order as [`PLACE2022_TILES`].
const PLACE2022_CROPS: &[CropRect] = &[
    CropRect::new(612, 744, 388, 256),
    CropRect::new(612, 0, 388, 131),
    CropRect::new(0, 744, 405, 256),
    CropRect::new(0, 0, 405, 131),
];
const PLACE2022_TILE_URL: &str = "https://backend.wplace.live/files/s0/tiles/{x}/{y}.png";
const PLACE2022_REFERENCE_URL: &str =
    "https://cfp.is-a.dev/wplace/files/s0/overlay/place2022/{x}/{y}.png";
/// Central European Time, without daylight saving.
const PLACE2022_UTC_OFFSET_SECS: i32 = 3600;

const HOUR: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// First run immediately, then one run every `Duration`.
    FixedDelay(Duration),
    /// First run immediately, then at every top of the hour in `offset`.
    Hourly { offset: FixedOffset },
}

/// Everything that differs between tracked canvases.
#[derive(Debug, Clone)]
pub struct JobProfile {
    pub name: String,
    /// Identifies the image replaced on the remote endpoint.
    pub slug: String,
    pub tiles: Vec<TileCoord>,
    /// One crop per tile, or `None` to count whole tiles.
    pub crops: Option<Vec<CropRect>>,
    pub tile_url: String,
    pub reference_url: Option<String>,
    pub predicate: CompletionPredicate,
    pub font: FontSpec,
    /// Font sheet file name, resolved against `FONT_DIR`.
    pub font_file: String,
    pub label_prefix: String,
    pub percent_style: PercentStyle,
    pub label_style: LabelStyle,
    /// CSV file name under `PROGRESS_LOG_DIR`.
    pub progress_log: Option<String>,
    pub schedule: Schedule,
}

impl JobProfile {
    pub fn crop_for(&self, index: usize) -> Option<CropRect> {
        self.crops.as_ref().and_then(|crops| crops.get(index).copied())
    }

    pub fn label_text(&self, percentage: f64) -> String {
        format!(
            "{}{}%",
            self.label_prefix,
            format_percentage(percentage, self.percent_style)
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tiles.is_empty() {
            return Err(format!("profile {} has no tiles", self.name));
        }
        if let Some(crops) = &self.crops
            && crops.len() != self.tiles.len()
        {
            return Err(format!(
                "profile {} has {} crops for {} tiles",
                self.name,
                crops.len(),
                self.tiles.len()
            ));
        }
        if self.predicate == CompletionPredicate::MatchesReference && self.reference_url.is_none()
        {
            return Err(format!(
                "profile {} compares against a reference but has no reference URL",
                self.name
            ));
        }
        self.check_label_glyphs()
    }

    /// Every character a label can contain must exist in the profile font.
    fn check_label_glyphs(&self) -> Result<(), String> {
        let glyphs = GlyphTable::build(&self.font)
            .map_err(|e| format!("profile {} font: {e}", self.name))?;
        for sample in [0.0, 5.55, 42.0, 100.0, 199.9] {
            let label = self.label_text(sample);
            if let Some(ch) = label.chars().find(|ch| glyphs.glyph(*ch).is_none()) {
                return Err(format!(
                    "profile {} label {label:?} uses {ch:?}, which is missing from its font",
                    self.name
                ));
            }
        }
        Ok(())
    }
}

pub fn by_name(name: &str) -> Result<JobProfile, String> {
    match name {
        "place2023" => place2023(),
        "place2022" => place2022(),
        other => Err(format!("unknown profile {other:?}")),
    }
}

/// Counts blended-out (transparent) pixels and posts a framed label hourly.
pub fn place2023() -> Result<JobProfile, String> {
    Ok(JobProfile {
        name: "place2023".to_string(),
        slug: "place2023-progress".to_string(),
        tiles: parse_tile_list(PLACE2023_TILES)?,
        crops: None,
        tile_url: PLACE2023_TILE_URL.to_string(),
        reference_url: None,
        predicate: CompletionPredicate::Transparent,
        font: PLACE_FONT,
        font_file: "font.png".to_string(),
        label_prefix: "R/PLACE ²⁰²³: ".to_string(),
        percent_style: PercentStyle::Rounded,
        label_style: LabelStyle::FRAMED,
        progress_log: None,
        schedule: Schedule::FixedDelay(HOUR),
    })
}

/// Compares cropped live tiles against the overlay and logs every run to CSV.
pub fn place2022() -> Result<JobProfile, String> {
    let offset = FixedOffset::east_opt(PLACE2022_UTC_OFFSET_SECS)
        .ok_or_else(|| "place2022 UTC offset is out of range".to_string())?;
    Ok(JobProfile {
        name: "place2022".to_string(),
        slug: "place2022-progress".to_string(),
        tiles: parse_tile_list(PLACE2022_TILES)?,
        crops: Some(PLACE2022_CROPS.to_vec()),
        tile_url: PLACE2022_TILE_URL.to_string(),
        reference_url: Some(PLACE2022_REFERENCE_URL.to_string()),
        predicate: CompletionPredicate::MatchesReference,
        font: INDICATOR_FONT,
        font_file: "font-indicator.png".to_string(),
        label_prefix: "R/PLACE ²⁰²²: ".to_string(),
        percent_style: PercentStyle::Indicator,
        label_style: LabelStyle::TIGHT,
        progress_log: Some("place2022-progress.csv".to_string()),
        schedule: Schedule::Hourly { offset },
    })
}

#[cfg(test)]
mod tests {
    use wplace_shared::{GlyphTable, PLACE_FONT};

    use super::{by_name, place2022, place2023};

    #[test]
    fn builtin_profiles_are_valid() {
        for profile in [place2023(), place2022()] {
            let profile = profile.expect("builtin profile");
            profile.validate().expect("builtin profile should validate");
        }
    }

    #[test]
    fn unknown_profile_names_are_rejected() {
        assert!(by_name("place2017").is_err());
        assert_eq!(by_name("place2022").expect("profile").slug, "place2022-progress");
    }

    #[test]
    fn every_label_character_exists_in_the_profile_font() {
        for profile in [place2023(), place2022()] {
            let profile = profile.expect("builtin profile");
            let table = GlyphTable::build(&profile.font).expect("glyph table");
            for value in [0.0, 3.45, 57.81, 100.0] {
                let text = profile.label_text(value);
                for ch in text.chars() {
                    assert!(
                        table.glyph(ch).is_some(),
                        "{} label {text:?} uses unknown glyph {ch:?}",
                        profile.name
                    );
                }
            }
        }
    }

    #[test]
    fn bundled_font_sheets_fit_their_glyph_tables() {
        let assets = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../assets");
        for profile in [place2023(), place2022()] {
            let profile = profile.expect("builtin profile");
            let table = GlyphTable::build(&profile.font).expect("glyph table");
            let sheet = image::open(assets.join(&profile.font_file))
                .expect("bundled font sheet")
                .to_rgba8();
            assert_eq!(sheet.width(), table.sheet_width(), "{}", profile.font_file);
            assert_eq!(sheet.height(), wplace_shared::CHAR_HEIGHT);
        }
    }

    #[test]
    fn label_text_uses_profile_percent_style() {
        let place2023 = place2023().expect("profile");
        assert_eq!(place2023.label_text(12.34), "R/PLACE ²⁰²³: 12.3%");

        let place2022 = place2022().expect("profile");
        assert_eq!(place2022.label_text(3.45), "R/PLACE ²⁰²²: ○◌3.4%");
        assert_eq!(place2022.label_text(123.7), "R/PLACE ²⁰²²: ●23.7%");
    }

    #[test]
    fn validation_catches_crop_count_and_missing_reference() {
        let mut profile = place2022().expect("profile");
        profile.crops.as_mut().expect("crops").pop();
        assert!(profile.validate().is_err());

        let mut profile = place2022().expect("profile");
        profile.reference_url = None;
        assert!(profile.validate().is_err());

        let mut profile = place2023().expect("profile");
        profile.tiles.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn validation_rejects_labels_the_font_cannot_draw() {
        let mut profile = place2023().expect("profile");
        profile.label_prefix = "R/PLACE ²⁰²³ (live): ".to_string();
        let err = profile.validate().expect_err("parentheses are not in the font");
        assert!(err.contains("'('"), "{err}");

        let mut profile = place2022().expect("profile");
        profile.font = PLACE_FONT;
        let err = profile.validate().expect_err("indicator glyphs are not in the place font");
        assert!(err.contains("missing from its font"), "{err}");
    }

    #[test]
    fn crop_lookup_follows_tile_order() {
        let profile = place2022().expect("profile");
        assert_eq!(profile.crop_for(0).map(|crop| crop.x), Some(612));
        assert_eq!(profile.crop_for(3).map(|crop| crop.x), Some(0));
        assert_eq!(profile.crop_for(4), None);
        assert_eq!(place2023().expect("profile").crop_for(0), None);
    }
}
