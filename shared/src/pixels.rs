use std::iter::Sum;
use std::ops::{Add, AddAssign};

use image::RgbaImage;

use crate::tile::CropRect;

/// Rule deciding whether a counted pixel is "done".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPredicate {
    /// Pixel alpha is zero. Used with tiles served with the template blended out.
    Transparent,
    /// All four channels equal the reference pixel at the same position.
    MatchesReference,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounts {
    pub total: u64,
    pub done: u64,
}

impl Add for TileCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total + rhs.total,
            done: self.done + rhs.done,
        }
    }
}

impl AddAssign for TileCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for TileCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Count the pixels of one tile, optionally limited to `crop`.
pub fn count_tile(
    tile: &RgbaImage,
    reference: Option<&RgbaImage>,
    crop: Option<CropRect>,
    predicate: CompletionPredicate,
) -> Result<TileCounts, String> {
    let reference = match predicate {
        CompletionPredicate::Transparent => None,
        CompletionPredicate::MatchesReference => {
            let reference =
                reference.ok_or_else(|| "match predicate requires a reference image".to_string())?;
            if reference.dimensions() != tile.dimensions() {
                return Err(format!(
                    "reference is {:?} but tile is {:?}",
                    reference.dimensions(),
                    tile.dimensions()
                ));
            }
            Some(reference)
        }
    };

    let mut counts = TileCounts::default();
    for (x, y, pixel) in tile.enumerate_pixels() {
        if let Some(crop) = crop
            && !crop.contains(x, y)
        {
            continue;
        }
        counts.total += 1;

        let done = match reference {
            None => pixel.0[3] == 0,
            Some(reference) => reference.get_pixel(x, y).0 == pixel.0,
        };
        if done {
            counts.done += 1;
        }
    }

    Ok(counts)
}

/// `done / total` as a percentage in `[0, 100]`, or `None` when nothing was counted.
pub fn completion_percentage(counts: TileCounts) -> Option<f64> {
    if counts.total == 0 {
        return None;
    }
    Some(counts.done as f64 / counts.total as f64 * 100.0)
}
