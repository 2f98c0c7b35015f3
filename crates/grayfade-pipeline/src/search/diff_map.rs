//! Sparse per-pixel intensity deltas: the canonical search state.
//!
//! A [`DiffMap`] records, for every pixel touched along a path, the
//! cumulative signed change relative to the original start image.
//! Applying it to the start image reproduces the node's image without
//! materializing a frame.
//!
//! Entries whose cumulative delta returns to zero are dropped, so two
//! paths that arrive at the same image always carry structurally
//! identical maps.

use std::collections::BTreeMap;

use image::GrayImage;

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    /// Column, from the left edge.
    pub x: u32,
    /// Row, from the top edge.
    pub y: u32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Iterate the sampled coordinates of a `width x height` grid.
///
/// A coordinate is sampled when both `x` and `y` are multiples of
/// `scale`. Columns are the outer loop.
pub fn sampled_coords(width: u32, height: u32, scale: u32) -> impl Iterator<Item = Coord> {
    let step = scale.max(1) as usize;
    (0..width)
        .step_by(step)
        .flat_map(move |x| (0..height).step_by(step).map(move |y| Coord::new(x, y)))
}

/// Sum of absolute intensity differences between two images over the
/// sampled coordinates.
#[must_use]
pub fn sampled_distance(a: &GrayImage, b: &GrayImage, scale: u32) -> u64 {
    sampled_coords(a.width(), a.height(), scale)
        .map(|c| u64::from(a.get_pixel(c.x, c.y).0[0].abs_diff(b.get_pixel(c.x, c.y).0[0])))
        .sum()
}

/// Sparse mapping from pixel coordinate to cumulative intensity delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffMap(BTreeMap<Coord, i32>);

impl DiffMap {
    /// An empty map (the start image itself).
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Cumulative delta at `coord`, or 0 if untouched.
    #[must_use]
    pub fn get(&self, coord: Coord) -> i32 {
        self.0.get(&coord).copied().unwrap_or(0)
    }

    /// Intensity at `coord` after applying this map to `base`.
    #[must_use]
    pub fn value_at(&self, coord: Coord, base: &GrayImage) -> i32 {
        i32::from(base.get_pixel(coord.x, coord.y).0[0]) + self.get(coord)
    }

    /// This map with one more step of `delta` merged in at `coord`.
    #[must_use]
    pub fn stepped(&self, coord: Coord, delta: i32) -> Self {
        let mut next = self.clone();
        let merged = next.get(coord) + delta;
        if merged == 0 {
            next.0.remove(&coord);
        } else {
            next.0.insert(coord, merged);
        }
        next
    }

    /// Whether this map equals `base.stepped(coord, delta)`, without
    /// building the stepped map.
    #[must_use]
    pub fn matches_step(&self, base: &Self, coord: Coord, delta: i32) -> bool {
        let base_entry = base.0.get(&coord).copied();
        let merged = base_entry.unwrap_or(0) + delta;

        let expected_len = match (base_entry.is_some(), merged == 0) {
            (true, true) => base.len() - 1,
            (true, false) | (false, true) => base.len(),
            (false, false) => base.len() + 1,
        };
        if self.len() != expected_len || self.get(coord) != merged {
            return false;
        }

        base.0
            .iter()
            .filter(|(k, _)| **k != coord)
            .all(|(k, v)| self.0.get(k) == Some(v))
    }

    /// Number of touched pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no pixel differs from the start image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(coord, cumulative delta)` pairs in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, i32)> + '_ {
        self.0.iter().map(|(c, d)| (*c, *d))
    }

    /// Materialize the full image this map describes.
    ///
    /// Values are clamped to `0..=255`; deltas produced by the search
    /// never leave that range.
    #[must_use]
    pub fn apply(&self, base: &GrayImage) -> GrayImage {
        let mut out = base.clone();
        for (coord, _) in self.iter() {
            let value = self.value_at(coord, base).clamp(0, 255);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            out.put_pixel(coord.x, coord.y, image::Luma([value as u8]));
        }
        out
    }
}
