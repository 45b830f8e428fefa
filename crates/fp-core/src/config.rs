//! Editor tuning knobs.
//!
//! Every field has a default, so hosts can pass a partial JSON object (or
//! nothing at all) and override only what they need.

use serde::{Deserialize, Serialize};

/// Configuration shared by the surface, the interaction state machine and
/// the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Lowest zoom level (scale = 2^zoom). Default: **-2**.
    pub min_zoom: f64,
    /// Highest zoom level. Default: **5**.
    pub max_zoom: f64,
    /// Zoom granularity; every zoom level is a multiple of this. Default: **0.1**.
    pub zoom_snap: f64,
    /// Zoom change per wheel notch or zoom shortcut. Default: **0.5**.
    pub wheel_zoom_step: f64,
    /// Pointer travel (screen px) below which a press-release is a click,
    /// not a pan. Default: **4**.
    pub click_slop_px: f64,
    /// Marker hit radius in screen px. Default: **12**.
    pub marker_radius_px: f64,
    /// A transient placement with no submitted form is discarded after this
    /// many ms. Default: **30 000**.
    pub abandon_placement_ms: f64,
    /// Side length (px) of the fallback space used when the image fails to
    /// load. Default: **500**.
    pub placeholder_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: -2.0,
            max_zoom: 5.0,
            zoom_snap: 0.1,
            wheel_zoom_step: 0.5,
            click_slop_px: 4.0,
            marker_radius_px: 12.0,
            abandon_placement_ms: 30_000.0,
            placeholder_size: 500.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config. Empty input yields defaults.
    ///
    /// # Errors
    /// Returns the serde error message if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(config.sanitized())
    }

    /// Repair inverted or degenerate ranges instead of failing later.
    pub fn sanitized(mut self) -> Self {
        if self.min_zoom > self.max_zoom {
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if self.zoom_snap.is_nan() || self.zoom_snap <= 0.0 {
            self.zoom_snap = Self::default().zoom_snap;
        }
        if self.placeholder_size.is_nan() || self.placeholder_size <= 0.0 {
            self.placeholder_size = Self::default().placeholder_size;
        }
        self
    }
}
