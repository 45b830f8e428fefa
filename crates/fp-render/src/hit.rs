//! Hit testing: screen point → stand marker.
//!
//! Markers keep a constant on-screen size, so the test runs in screen space
//! after projecting each marker through the surface transform. Markers are
//! walked in reverse render order (last painted = topmost).

use crate::markers::Marker;
use fp_core::id::StandId;
use fp_core::surface::MapSurface;
use kurbo::Point;

/// Find the topmost stand marker within `radius_px` of `screen`.
/// The transient placement marker is never hit.
pub fn hit_test(
    markers: &[Marker],
    surface: &MapSurface,
    screen: Point,
    radius_px: f64,
) -> Option<StandId> {
    markers.iter().rev().find_map(|marker| {
        let id = marker.stand_id()?;
        let at = surface.image_to_screen(marker.position);
        let radius = radius_px * marker.style().radius_scale;
        (at.distance(screen) <= radius).then_some(id)
    })
}
