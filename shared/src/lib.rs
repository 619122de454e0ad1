pub mod font;
pub mod glyphs;
pub mod percent;
pub mod pixels;
pub mod tile;

pub use font::{Frame, Glyph, GlyphTable, LabelStyle, draw_rect, render_label};
pub use glyphs::{CHAR_HEIGHT, FontSpec, GAP, INDICATOR_FONT, PLACE_FONT};
pub use percent::{PercentStyle, format_percentage};
pub use pixels::{CompletionPredicate, TileCounts, completion_percentage, count_tile};
pub use tile::{CropRect, TileCoord, tile_url};
