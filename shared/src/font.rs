use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::glyphs::{CHAR_HEIGHT, FontSpec, GAP};

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Location of one glyph inside the font sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Left edge of the glyph in the font sheet.
    pub offset: u32,
}

/// Immutable glyph lookup built once per font sheet.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: HashMap<char, Glyph>,
    order: Vec<char>,
    gap: u32,
}

impl GlyphTable {
    /// Lay out the font's characters left to right, each glyph followed by [`GAP`].
    pub fn build(font_spec: &FontSpec) -> Result<Self, String> {
        let widths: HashMap<char, u32> = font_spec.width_entries().into_iter().collect();
        let mut glyphs = HashMap::with_capacity(widths.len());
        let mut order = Vec::with_capacity(widths.len());
        let mut offset = 0u32;

        for ch in font_spec.chars() {
            let width = *widths
                .get(&ch)
                .ok_or_else(|| format!("font alphabet character {ch:?} has no width"))?;
            if glyphs.contains_key(&ch) {
                return Err(format!("font alphabet repeats character {ch:?}"));
            }
            glyphs.insert(
                ch,
                Glyph {
                    width,
                    height: CHAR_HEIGHT,
                    offset,
                },
            );
            order.push(ch);
            offset += width + GAP;
        }

        Ok(Self {
            glyphs,
            order,
            gap: GAP,
        })
    }

    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        self.glyphs.get(&ch).copied()
    }

    /// Characters in font-sheet order.
    pub fn alphabet(&self) -> &[char] {
        &self.order
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }

    /// Width of the font sheet needed to hold every glyph.
    pub fn sheet_width(&self) -> u32 {
        self.order
            .last()
            .and_then(|ch| self.glyph(*ch))
            .map(|glyph| glyph.offset + glyph.width)
            .unwrap_or(0)
    }

    /// Pixel width of `text`: every known glyph plus one gap between neighbours.
    pub fn measure_text(&self, text: &str) -> u32 {
        let mut width = 0u32;
        for ch in text.chars() {
            match self.glyph(ch) {
                Some(glyph) => {
                    width += glyph.width + self.gap;
                    debug!(character = %ch, glyph_width = glyph.width, width, "measured glyph");
                }
                None => warn!(character = %ch, "glyph missing from font table, skipping"),
            }
        }
        width.saturating_sub(self.gap)
    }

    /// Blit `text` from `font` onto `target` with its top-left corner at `(x, y)`.
    ///
    /// The cursor advances by `width + gap - 1` per glyph, so `gap == 2` yields
    /// one blank column between glyphs. Pixels falling outside either image are
    /// clipped. Returns the number of glyphs drawn.
    pub fn render_text(
        &self,
        text: &str,
        font: &RgbaImage,
        target: &mut RgbaImage,
        x: u32,
        y: u32,
        gap: u32,
    ) -> usize {
        let mut cursor = x;
        let mut drawn = 0;

        for ch in text.chars() {
            let Some(glyph) = self.glyph(ch) else {
                warn!(character = %ch, "glyph missing from font table, skipping");
                continue;
            };
            if glyph.offset + glyph.width > font.width() || glyph.height > font.height() {
                warn!(
                    character = %ch,
                    font_width = font.width(),
                    font_height = font.height(),
                    "font sheet is smaller than the glyph table expects"
                );
            }

            blit(font, glyph, target, cursor, y);
            drawn += 1;
            cursor = cursor.saturating_add((glyph.width + gap).saturating_sub(1));
        }

        drawn
    }
}

fn blit(font: &RgbaImage, glyph: Glyph, target: &mut RgbaImage, dst_x: u32, dst_y: u32) {
    for gy in 0..glyph.height {
        for gx in 0..glyph.width {
            let (sx, sy) = (glyph.offset + gx, gy);
            let (tx, ty) = (dst_x.saturating_add(gx), dst_y.saturating_add(gy));
            if sx >= font.width() || sy >= font.height() {
                continue;
            }
            if tx >= target.width() || ty >= target.height() {
                continue;
            }
            target.put_pixel(tx, ty, *font.get_pixel(sx, sy));
        }
    }
}

/// Fill a rectangle, clipped to the image bounds.
pub fn draw_rect(image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(width).min(image.width());
    let y_end = y.saturating_add(height).min(image.height());
    for yy in y..y_end {
        for xx in x..x_end {
            image.put_pixel(xx, yy, color);
        }
    }
}

/// Two-tone box drawn behind the label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub border: Rgba<u8>,
    pub fill: Rgba<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelStyle {
    /// Space on each side of the text.
    pub padding: u32,
    /// Gap passed to [`GlyphTable::render_text`].
    pub text_gap: u32,
    /// Color of pixels not covered by the frame or glyphs.
    pub background: Rgba<u8>,
    pub frame: Option<Frame>,
}

impl LabelStyle {
    /// Black-bordered white box with 2px padding.
    pub const FRAMED: Self = Self {
        padding: 2,
        text_gap: GAP + 1,
        background: TRANSPARENT,
        frame: Some(Frame {
            border: BLACK,
            fill: WHITE,
        }),
    };

    /// Glyphs only, no padding, transparent background.
    pub const TIGHT: Self = Self {
        padding: 0,
        text_gap: GAP + 1,
        background: TRANSPARENT,
        frame: None,
    };
}

/// Allocate a fresh image sized to `text` and draw the label into it.
pub fn render_label(
    table: &GlyphTable,
    font: &RgbaImage,
    text: &str,
    style: &LabelStyle,
) -> RgbaImage {
    let width = table.measure_text(text) + style.padding * 2;
    let height = CHAR_HEIGHT + style.padding * 2;
    let mut image = RgbaImage::from_pixel(width, height, style.background);

    if let Some(frame) = style.frame {
        draw_rect(&mut image, 0, 0, width, height, frame.border);
        draw_rect(
            &mut image,
            1,
            1,
            width.saturating_sub(2),
            height.saturating_sub(2),
            frame.fill,
        );
    }

    table.render_text(
        text,
        font,
        &mut image,
        style.padding,
        style.padding,
        style.text_gap,
    );
    image
}
