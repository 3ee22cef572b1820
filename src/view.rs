use serde::{Deserialize, Serialize};

use crate::{bounds::Aabb, chunk::Voxel, selection::Selection};

pub const MIN_SLICE: f64 = 0.01;
pub const MAX_SLICE: f64 = 1.0;

/// Size of the screen area the selection is drawn into, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Viewport {
        Viewport { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Viewport {
        Viewport::new(1280.0, 720.0)
    }
}

/// Where the camera looks and how far it is zoomed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPlacement {
    pub center: [f64; 3],
    /// `log2` of screen pixels per block along the longest axis.
    pub zoom: f64,
}

impl ViewPlacement {
    /// Centers on `bounds` and zooms so its longest axis fills the shorter
    /// side of the viewport.
    ///
    /// A box that is flat along its longest axis (a single block) gives an
    /// infinite zoom; the renderer clamps it to whatever range it supports.
    pub fn from_bounds(bounds: &Aabb, viewport: Viewport) -> Option<ViewPlacement> {
        let [dx, dy, dz] = bounds.extent()?;
        let center = bounds.center()?;
        let longest = dx.max(dy).max(dz) as f64;
        let scale = viewport.width.min(viewport.height) / longest;
        Some(ViewPlacement {
            center,
            zoom: scale.log2(),
        })
    }
}

/// Pulls a slice fraction into `[0.01, 1.0]`. NaN shows everything.
pub fn clamp_slice(fraction: f64) -> f64 {
    if fraction.is_nan() {
        MAX_SLICE
    } else {
        fraction.clamp(MIN_SLICE, MAX_SLICE)
    }
}

/// Highest world y still drawn for a slice fraction: the fraction blends
/// from the bottom of `bounds` (near 0) to its top (1).
pub fn slice_level(bounds: &Aabb, fraction: f64) -> Option<i32> {
    if bounds.is_empty() {
        return None;
    }
    let f = clamp_slice(fraction);
    Some((f * bounds.max_y as f64 + (1.0 - f) * bounds.min_y as f64).floor() as i32)
}

/// Voxels of `selection` at or below the slice level.
pub fn visible_voxels(selection: &Selection, fraction: f64) -> impl Iterator<Item = &Voxel> {
    let level = slice_level(&selection.bounds(), fraction).unwrap_or(i32::MAX);
    selection.data().iter().filter(move |v| v.y <= level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tall_box() -> Aabb {
        Aabb {
            min_x: 0,
            max_x: 15,
            min_y: 0,
            max_y: 100,
            min_z: 0,
            max_z: 15,
        }
    }

    #[test]
    fn placement_centers_and_zooms() {
        let placement = ViewPlacement::from_bounds(&tall_box(), Viewport::new(800.0, 400.0)).unwrap();
        assert_eq!(placement.center, [7.5, 50.0, 7.5]);
        assert!((placement.zoom - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_block_zoom_is_infinite() {
        let placement = ViewPlacement::from_bounds(&Aabb::point(0, 64, 0), Viewport::default()).unwrap();
        assert_eq!(placement.center, [0.0, 64.0, 0.0]);
        assert!(placement.zoom.is_infinite());
    }

    #[test]
    fn empty_bounds_have_no_placement() {
        assert_eq!(ViewPlacement::from_bounds(&Aabb::EMPTY, Viewport::default()), None);
    }

    #[test]
    fn slice_levels_blend_between_bottom_and_top() {
        let b = tall_box();
        assert_eq!(slice_level(&b, 1.0), Some(100));
        assert_eq!(slice_level(&b, 0.5), Some(50));
        assert_eq!(slice_level(&b, 0.0), Some(1));
        assert_eq!(slice_level(&b, 7.0), Some(100));
        assert_eq!(slice_level(&Aabb::EMPTY, 0.5), None);
    }

    #[test]
    fn slice_fractions_are_clamped() {
        assert_eq!(clamp_slice(-1.0), MIN_SLICE);
        assert_eq!(clamp_slice(2.0), MAX_SLICE);
        assert_eq!(clamp_slice(f64::NAN), MAX_SLICE);
        assert_eq!(clamp_slice(0.3), 0.3);
    }
}
