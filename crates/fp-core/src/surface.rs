//! Map surface: the coordinate system between hall-map image pixels and the
//! on-screen viewport.
//!
//! Image space has its origin at the top-left corner of the raster, `x`
//! growing right (column) and `y` growing down (row), so the loaded image
//! occupies `[[0, 0], [height, width]]` in row/column order. The viewport is
//! described by a zoom level (scale = 2^zoom) and the image point shown at the
//! viewport center. Both conversions are closed-form inverses of each other,
//! so a click converted to image space and drawn back lands on the same
//! screen pixel at any zoom.

use crate::config::EditorConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Extent of the image (or placeholder) space in native pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBounds {
    pub width: f64,
    pub height: f64,
}

impl ImageBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Square fallback space shown when there is no usable image.
    pub fn placeholder(side: f64) -> Self {
        Self::new(side, side)
    }

    /// Bounds as `[[0, 0], [height, width]]` (row, column order).
    pub fn as_lat_lng(&self) -> [[f64; 2]; 2] {
        [[0.0, 0.0], [self.height, self.width]]
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Inclusive containment test in image space.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }
}

// ─── Load lifecycle ──────────────────────────────────────────────────────

/// Identifies one `begin_load` call. Completions with an older ticket are
/// stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Image decode or fetch failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not load hall map image `{url}`: {reason}")]
pub struct LoadError {
    pub url: String,
    pub reason: String,
}

/// Where the surface is in loading its raster.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// No hall map yet; placeholder space is active.
    Empty,
    Loading { url: String, ticket: LoadTicket },
    Loaded { url: String },
    /// Load failed; placeholder space is active.
    Failed { url: String, reason: String },
}

impl LoadStatus {
    /// Whether the "no map yet" indicator should be shown.
    pub fn shows_placeholder(&self) -> bool {
        matches!(self, Self::Empty | Self::Failed { .. })
    }
}

/// Transient pan/zoom state. Reset whenever an image (re)loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub zoom: f64,
    /// Image-space point shown at the viewport center.
    pub center: Point,
}

// ─── Surface ─────────────────────────────────────────────────────────────

/// Owns the image↔viewport transform for one hall map.
#[derive(Debug, Clone)]
pub struct MapSurface {
    min_zoom: f64,
    max_zoom: f64,
    zoom_snap: f64,
    placeholder_side: f64,
    /// `None` until `initialize` (and again after `teardown`).
    viewport: Option<Size>,
    view: ViewportState,
    bounds: ImageBounds,
    status: LoadStatus,
    next_ticket: u64,
}

impl MapSurface {
    pub fn new(config: &EditorConfig) -> Self {
        let bounds = ImageBounds::placeholder(config.placeholder_size);
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_snap: config.zoom_snap,
            placeholder_side: config.placeholder_size,
            viewport: None,
            view: ViewportState {
                zoom: 0.0,
                center: bounds.center(),
            },
            bounds,
            status: LoadStatus::Empty,
            next_ticket: 0,
        }
    }

    /// Attach the surface to a viewport of the given CSS pixel size and fit
    /// the current bounds. Returns `false` if already attached to a viewport
    /// of this size (idempotent per container).
    pub fn initialize(&mut self, width: f64, height: f64) -> bool {
        let size = Size::new(width.max(1.0), height.max(1.0));
        if self.viewport == Some(size) {
            return false;
        }
        self.viewport = Some(size);
        self.fit_bounds();
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.viewport.is_some()
    }

    /// Change the viewport size, keeping zoom and center.
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.viewport.is_some() {
            self.viewport = Some(Size::new(width.max(1.0), height.max(1.0)));
        }
    }

    /// Release the viewport and invalidate any in-flight load. Safe to call
    /// repeatedly.
    pub fn teardown(&mut self) {
        if self.viewport.take().is_some() {
            log::debug!("map surface torn down");
        }
        self.next_ticket += 1;
        self.status = LoadStatus::Empty;
        self.bounds = ImageBounds::placeholder(self.placeholder_side);
        self.view = ViewportState {
            zoom: 0.0,
            center: self.bounds.center(),
        };
    }

    // ─── Image loading ───────────────────────────────────────────────────

    /// Start loading a raster. The caller decodes it and reports back via
    /// `finish_load` with the returned ticket.
    pub fn begin_load(&mut self, url: &str) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.status = LoadStatus::Loading {
            url: url.to_string(),
            ticket,
        };
        log::debug!("loading hall map image {url}");
        ticket
    }

    /// Complete a load started with `begin_load`.
    ///
    /// On success the bounds become `[[0,0],[height,width]]` of the decoded
    /// image; on failure the placeholder space is used. Either way the
    /// viewport is reset to fit. Returns `None` for stale tickets.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<(f64, f64), LoadError>,
    ) -> Option<Result<ImageBounds, LoadError>> {
        let url = match &self.status {
            LoadStatus::Loading { url, ticket: current } if *current == ticket => url.clone(),
            _ => {
                log::debug!("ignoring stale image load {ticket:?}");
                return None;
            }
        };

        let result = result.and_then(|(w, h)| {
            if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 {
                Ok((w, h))
            } else {
                Err(LoadError {
                    url: url.clone(),
                    reason: format!("image has no usable size ({w}×{h})"),
                })
            }
        });

        let outcome = match result {
            Ok((width, height)) => {
                self.bounds = ImageBounds::new(width, height);
                self.status = LoadStatus::Loaded { url };
                Ok(self.bounds)
            }
            Err(err) => {
                log::warn!("{err}");
                self.bounds = ImageBounds::placeholder(self.placeholder_side);
                self.status = LoadStatus::Failed {
                    url,
                    reason: err.reason.clone(),
                };
                Err(err)
            }
        };
        self.fit_bounds();
        Some(outcome)
    }

    /// Drop the current image (hall map without a URL).
    pub fn clear_image(&mut self) {
        self.next_ticket += 1;
        self.status = LoadStatus::Empty;
        self.bounds = ImageBounds::placeholder(self.placeholder_side);
        self.fit_bounds();
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn bounds(&self) -> ImageBounds {
        self.bounds
    }

    pub fn view(&self) -> ViewportState {
        self.view
    }

    pub fn viewport_size(&self) -> Option<Size> {
        self.viewport
    }

    /// Screen pixels per image pixel.
    pub fn scale(&self) -> f64 {
        2f64.powf(self.view.zoom)
    }

    pub fn is_within_bounds(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }

    fn half_viewport(&self) -> Vec2 {
        self.viewport
            .map(|s| Vec2::new(s.width / 2.0, s.height / 2.0))
            .unwrap_or(Vec2::ZERO)
    }

    // ─── Transform ───────────────────────────────────────────────────────

    /// Image space → screen space.
    pub fn image_to_screen(&self, p: Point) -> Point {
        let s = self.scale();
        let half = self.half_viewport();
        Point::new(
            (p.x - self.view.center.x) * s + half.x,
            (p.y - self.view.center.y) * s + half.y,
        )
    }

    /// Screen space → image space. Exact inverse of `image_to_screen`.
    pub fn screen_to_image(&self, p: Point) -> Point {
        let s = self.scale();
        let half = self.half_viewport();
        Point::new(
            (p.x - half.x) / s + self.view.center.x,
            (p.y - half.y) / s + self.view.center.y,
        )
    }

    /// The image→screen transform as an affine, for painting the raster.
    pub fn transform(&self) -> Affine {
        let half = self.half_viewport();
        Affine::translate(half)
            * Affine::scale(self.scale())
            * Affine::translate(-self.view.center.to_vec2())
    }

    // ─── Pan / zoom ──────────────────────────────────────────────────────

    /// Snap to the zoom granularity and clamp to the zoom range.
    pub fn snap_zoom(&self, zoom: f64) -> f64 {
        let steps = (zoom / self.zoom_snap).round();
        (steps * self.zoom_snap).clamp(self.min_zoom, self.max_zoom)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.view.zoom = self.snap_zoom(zoom);
    }

    /// Zoom by `delta` levels keeping the image point under `anchor`
    /// (screen space) fixed on screen.
    pub fn zoom_around(&mut self, delta: f64, anchor: Point) {
        let pinned = self.screen_to_image(anchor);
        let zoom = self.snap_zoom(self.view.zoom + delta);
        if zoom == self.view.zoom {
            return;
        }
        self.view.zoom = zoom;
        let s = self.scale();
        let half = self.half_viewport();
        self.view.center = Point::new(
            pinned.x - (anchor.x - half.x) / s,
            pinned.y - (anchor.y - half.y) / s,
        );
    }

    /// Zoom by `delta` levels around the viewport center.
    pub fn zoom_by(&mut self, delta: f64) {
        self.view.zoom = self.snap_zoom(self.view.zoom + delta);
    }

    /// Pan by a screen-space drag delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        let s = self.scale();
        self.view.center -= delta / s;
    }

    /// Center on the bounds at the largest zoom that shows all of them.
    pub fn fit_bounds(&mut self) {
        self.view.center = self.bounds.center();
        let Some(viewport) = self.viewport else {
            self.view.zoom = 0.0_f64.clamp(self.min_zoom, self.max_zoom);
            return;
        };
        let ratio = (viewport.width / self.bounds.width).min(viewport.height / self.bounds.height);
        let ideal = ratio.log2();
        // Round down so the whole image stays visible.
        let steps = (ideal / self.zoom_snap + 1e-9).floor();
        self.view.zoom = (steps * self.zoom_snap).clamp(self.min_zoom, self.max_zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    fn loaded(width: f64, height: f64) -> MapSurface {
        let mut surface = MapSurface::new(&EditorConfig::default());
        surface.initialize(800.0, 600.0);
        let ticket = surface.begin_load("hall.png");
        surface.finish_load(ticket, Ok((width, height))).unwrap().unwrap();
        surface
    }

    #[test]
    fn bounds_are_row_column_ordered() {
        let surface = loaded(1200.0, 900.0);
        assert_eq!(surface.bounds().as_lat_lng(), [[0.0, 0.0], [900.0, 1200.0]]);
        assert_eq!(surface.status(), &LoadStatus::Loaded { url: "hall.png".into() });
    }

    #[test]
    fn fit_centers_and_rounds_zoom_down() {
        let surface = loaded(1000.0, 800.0);
        // min(800/1000, 600/800) = 0.75 → log2 ≈ -0.415 → -0.5
        assert!((surface.view().zoom + 0.5).abs() < EPSILON);
        assert_eq!(surface.view().center, Point::new(500.0, 400.0));
        let top_left = surface.image_to_screen(Point::ZERO);
        let bottom_right = surface.image_to_screen(Point::new(1000.0, 800.0));
        assert!(top_left.x >= 0.0 && top_left.y >= 0.0);
        assert!(bottom_right.x <= 800.0 && bottom_right.y <= 600.0);
    }

    #[test]
    fn click_round_trips_at_every_zoom() {
        let mut surface = loaded(2000.0, 1500.0);
        surface.pan_by(Vec2::new(37.0, -12.5));
        let click = Point::new(321.0, 123.0);
        for tenth in -20..=50 {
            surface.set_zoom(tenth as f64 / 10.0);
            let image = surface.screen_to_image(click);
            assert!(approx(surface.image_to_screen(image), click), "zoom {}", surface.view().zoom);
        }
    }

    #[test]
    fn affine_matches_closed_form() {
        let mut surface = loaded(640.0, 480.0);
        surface.zoom_around(1.3, Point::new(100.0, 100.0));
        let p = Point::new(200.0, 150.0);
        let via_affine = surface.transform() * p;
        assert!((via_affine - surface.image_to_screen(p)).hypot() < 1e-6);
    }

    #[test]
    fn zoom_around_keeps_anchor_fixed() {
        let mut surface = loaded(1000.0, 1000.0);
        let anchor = Point::new(600.0, 200.0);
        let before = surface.screen_to_image(anchor);
        surface.zoom_around(1.0, anchor);
        let after = surface.screen_to_image(anchor);
        assert!(approx(before, after));
    }

    #[test]
    fn zoom_is_snapped_and_clamped() {
        let mut surface = loaded(100.0, 100.0);
        surface.set_zoom(9.0);
        assert_eq!(surface.view().zoom, 5.0);
        surface.set_zoom(-7.0);
        assert_eq!(surface.view().zoom, -2.0);
        surface.set_zoom(1.234);
        assert!((surface.view().zoom - 1.2).abs() < EPSILON);
    }

    #[test]
    fn failed_load_falls_back_to_placeholder() {
        let mut surface = MapSurface::new(&EditorConfig::default());
        surface.initialize(800.0, 600.0);
        let ticket = surface.begin_load("broken.png");
        let err = LoadError {
            url: "broken.png".into(),
            reason: "decode error".into(),
        };
        let outcome = surface.finish_load(ticket, Err(err)).unwrap();
        assert!(outcome.is_err());
        assert_eq!(surface.bounds().as_lat_lng(), [[0.0, 0.0], [500.0, 500.0]]);
        assert!(surface.status().shows_placeholder());
        let center = surface.screen_to_image(Point::new(400.0, 300.0));
        assert!(approx(center, Point::new(250.0, 250.0)));
    }

    #[test]
    fn zero_sized_image_counts_as_failure() {
        let mut surface = MapSurface::new(&EditorConfig::default());
        let ticket = surface.begin_load("empty.png");
        let outcome = surface.finish_load(ticket, Ok((0.0, 0.0))).unwrap();
        assert!(outcome.is_err());
        assert_eq!(surface.bounds(), ImageBounds::placeholder(500.0));
    }

    #[test]
    fn stale_load_is_ignored() {
        let mut surface = MapSurface::new(&EditorConfig::default());
        let first = surface.begin_load("a.png");
        let second = surface.begin_load("b.png");
        assert!(surface.finish_load(first, Ok((10.0, 10.0))).is_none());
        assert!(surface.finish_load(second, Ok((20.0, 10.0))).is_some());
        assert_eq!(surface.bounds(), ImageBounds::new(20.0, 10.0));
    }

    #[test]
    fn initialize_is_idempotent_and_teardown_repeatable() {
        let mut surface = MapSurface::new(&EditorConfig::default());
        assert!(surface.initialize(800.0, 600.0));
        assert!(!surface.initialize(800.0, 600.0));
        let ticket = surface.begin_load("a.png");
        surface.teardown();
        surface.teardown();
        assert!(!surface.is_initialized());
        assert!(surface.finish_load(ticket, Ok((10.0, 10.0))).is_none());
        assert!(surface.initialize(800.0, 600.0));
    }
}
