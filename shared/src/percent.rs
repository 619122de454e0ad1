use tracing::warn;

/// Lit hundreds digit (value is 100% or more).
pub const INDICATOR_ON: char = '●';
/// Unlit hundreds digit.
pub const INDICATOR_OFF: char = '○';
/// Unlit tens digit following an unlit hundreds digit.
pub const INDICATOR_OFF_ZERO: char = '◌';

const MAX_TENTHS: f64 = 1999.0;

/// How a completion percentage is turned into label text (without the `%`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentStyle {
    /// Rounded half away from zero to one decimal, natural width:
    /// `"3.5"`, `"12.3"` for 12.25, `"100.0"`.
    Rounded,
    /// Truncated to one decimal, fixed width, leading digits swapped for
    /// indicator glyphs: `"○◌3.4"`, `"●23.7"`.
    Indicator,
}

pub fn format_percentage(percentage: f64, style: PercentStyle) -> String {
    let percentage = finite_or_zero(percentage);
    match style {
        PercentStyle::Rounded => format!("{:.1}", (percentage * 10.0).round() / 10.0),
        PercentStyle::Indicator => encode_indicator(&pad_tenths(truncated_tenths(percentage))),
    }
}

fn finite_or_zero(percentage: f64) -> f64 {
    if percentage.is_finite() {
        percentage
    } else {
        warn!(percentage, "non-finite percentage, formatting as 0");
        0.0
    }
}

/// `floor(percentage * 10)`, clamped to what five characters can hold.
/// NaN maps to 0.
pub fn truncated_tenths(percentage: f64) -> u32 {
    (percentage * 10.0)
        .floor()
        .clamp(0.0, MAX_TENTHS) as u32
}

/// `34` -> `"003.4"`.
pub fn pad_tenths(tenths: u32) -> String {
    format!("{:03}.{}", tenths / 10, tenths % 10)
}

/// Swap the first two characters of a zero-padded value for indicator glyphs.
///
/// The first character becomes [`INDICATOR_ON`] when it is `'1'` and
/// [`INDICATOR_OFF`] otherwise. A `'0'` in second position then becomes
/// [`INDICATOR_OFF_ZERO`]. Everything after is left as is.
pub fn encode_indicator(padded: &str) -> String {
    let mut chars = padded.chars();
    let mut encoded = String::with_capacity(padded.len() + 4);

    match chars.next() {
        Some('1') => encoded.push(INDICATOR_ON),
        Some(_) => encoded.push(INDICATOR_OFF),
        None => return encoded,
    }
    match chars.next() {
        Some('0') => encoded.push(INDICATOR_OFF_ZERO),
        Some(ch) => encoded.push(ch),
        None => return encoded,
    }
    encoded.extend(chars);
    encoded
}
