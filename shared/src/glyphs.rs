use crate::percent::{INDICATOR_OFF, INDICATOR_OFF_ZERO, INDICATOR_ON};

/// Height of every glyph row in the font sheets.
pub const CHAR_HEIGHT: u32 = 7;
/// Horizontal spacing between glyphs in the font sheet and in measured text.
pub const GAP: u32 = 1;

/// Describes a font sheet: glyphs laid out left to right in `alphabet` order,
/// each `width` pixels wide and separated by [`GAP`]. A font with a `base`
/// starts with every glyph of the base and appends its own.
#[derive(Debug, Clone, Copy)]
pub struct FontSpec {
    pub base: Option<&'static FontSpec>,
    pub alphabet: &'static str,
    pub widths: &'static [(char, u32)],
}

impl FontSpec {
    /// Sheet order, base glyphs first.
    pub fn chars(&self) -> Vec<char> {
        let mut chars = self.base.map(FontSpec::chars).unwrap_or_default();
        chars.extend(self.alphabet.chars());
        chars
    }

    pub fn width_entries(&self) -> Vec<(char, u32)> {
        let mut entries = self.base.map(FontSpec::width_entries).unwrap_or_default();
        entries.extend_from_slice(self.widths);
        entries
    }
}

const PLACE_WIDTHS: &[(char, u32)] = &[
    ('#', 6),
    ('¹', 3),
    ('²', 5),
    ('³', 4),
    ('⁴', 6),
    ('⁵', 4),
    ('⁶', 5),
    ('⁷', 4),
    ('⁸', 5),
    ('⁹', 5),
    ('⁰', 5),
    ('R', 5),
    ('/', 4),
    ('P', 5),
    ('L', 4),
    ('A', 5),
    ('C', 4),
    ('E', 4),
    (':', 2),
    ('%', 6),
    (' ', 2),
    ('.', 2),
    ('1', 4),
    ('2', 4),
    ('3', 4),
    ('4', 4),
    ('5', 4),
    ('6', 4),
    ('7', 4),
    ('8', 4),
    ('9', 4),
    ('0', 4),
];

// Indicator glyphs share the digit width so labels never change size.
const INDICATOR_WIDTHS: &[(char, u32)] = &[
    (INDICATOR_ON, 4),
    (INDICATOR_OFF, 4),
    (INDICATOR_OFF_ZERO, 4),
];

/// `font.png`: title letters, superscript year digits and plain digits.
pub const PLACE_FONT: FontSpec = FontSpec {
    base: None,
    alphabet: "#¹²³⁴⁵⁶⁷⁸⁹⁰R/PLACE:% .1234567890",
    widths: PLACE_WIDTHS,
};

/// `font-indicator.png`: [`PLACE_FONT`] with the three indicator glyphs appended.
pub const INDICATOR_FONT: FontSpec = FontSpec {
    base: Some(&PLACE_FONT),
    alphabet: "●○◌",
    widths: INDICATOR_WIDTHS,
};
