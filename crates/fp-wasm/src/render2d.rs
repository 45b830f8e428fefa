//! Canvas2D renderer.
//!
//! Paints the hall map raster (or the "no map yet" placeholder) through the
//! surface transform, then the stand markers at a constant on-screen size.

use fp_core::surface::{ImageBounds, LoadStatus, MapSurface};
use fp_render::markers::{Marker, MarkerKind};
use std::f64::consts::TAU;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub placeholder_border: &'static str,
    pub placeholder_bg: &'static str,
    pub placeholder_text: &'static str,
    pub label_bg: &'static str,
    pub label_text: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            placeholder_border: "#86868B",
            placeholder_bg: "rgba(142, 142, 147, 0.06)",
            placeholder_text: "#86868B",
            label_bg: "rgba(255, 255, 255, 0.9)",
            label_text: "#1D1D1F",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            placeholder_border: "#636366",
            placeholder_bg: "rgba(99, 99, 102, 0.08)",
            placeholder_text: "#98989D",
            label_bg: "rgba(44, 44, 46, 0.9)",
            label_text: "#F5F5F7",
        }
    }
}

/// Paint one frame.
pub fn render_map(
    ctx: &CanvasRenderingContext2d,
    surface: &MapSurface,
    image: Option<&HtmlImageElement>,
    markers: &[Marker],
    marker_radius: f64,
    theme: &CanvasTheme,
) {
    let Some(viewport) = surface.viewport_size() else {
        return;
    };

    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);

    // Image space, under the pan/zoom transform.
    ctx.save();
    let [a, b, c, d, e, f] = surface.transform().as_coeffs();
    let _ = ctx.set_transform(a, b, c, d, e, f);
    let bounds = surface.bounds();
    match (surface.status(), image) {
        (LoadStatus::Loaded { .. }, Some(img)) => {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                0.0,
                0.0,
                bounds.width,
                bounds.height,
            );
        }
        (LoadStatus::Loading { .. }, _) => {
            draw_placeholder(ctx, &bounds, "Loading map…", surface.scale(), theme);
        }
        _ => draw_placeholder(ctx, &bounds, "No hall map yet", surface.scale(), theme),
    }
    ctx.restore();

    // Screen space: markers keep their size at every zoom.
    for marker in markers {
        draw_marker(ctx, surface, marker, marker_radius, theme);
    }
}

fn draw_placeholder(
    ctx: &CanvasRenderingContext2d,
    bounds: &ImageBounds,
    text: &str,
    scale: f64,
    theme: &CanvasTheme,
) {
    let (w, h) = (bounds.width, bounds.height);

    // Dashed border, one screen pixel wide.
    ctx.set_stroke_style_str(theme.placeholder_border);
    ctx.set_line_width(1.0 / scale);
    let dash = 4.0 / scale;
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(dash),
        &wasm_bindgen::JsValue::from_f64(dash),
    ));
    rounded_rect_path(ctx, 0.0, 0.0, w, h, 6.0 / scale);
    ctx.stroke();

    ctx.set_fill_style_str(theme.placeholder_bg);
    ctx.fill();

    ctx.set_font(&format!("{}px Inter, system-ui, sans-serif", 13.0 / scale));
    ctx.set_fill_style_str(theme.placeholder_text);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(text, w / 2.0, h / 2.0);
}

fn draw_marker(
    ctx: &CanvasRenderingContext2d,
    surface: &MapSurface,
    marker: &Marker,
    base_radius: f64,
    theme: &CanvasTheme,
) {
    let at = surface.image_to_screen(marker.position);
    let style = marker.style();
    let radius = base_radius * style.radius_scale;

    ctx.save();
    ctx.set_global_alpha(style.opacity);

    ctx.begin_path();
    let _ = ctx.arc(at.x, at.y, radius, 0.0, TAU);
    ctx.set_fill_style_str(style.fill);
    ctx.fill();
    ctx.set_stroke_style_str(style.outline);
    ctx.set_line_width(style.outline_width);
    if matches!(marker.kind, MarkerKind::Transient) {
        let _ = ctx.set_line_dash(&js_sys::Array::of2(
            &wasm_bindgen::JsValue::from_f64(3.0),
            &wasm_bindgen::JsValue::from_f64(3.0),
        ));
    }
    ctx.stroke();

    if !marker.label.is_empty() {
        draw_label(ctx, &marker.label, at.x, at.y + radius + 4.0, theme);
    }

    ctx.restore();
}

/// Stand number in a pill below the marker.
fn draw_label(ctx: &CanvasRenderingContext2d, label: &str, cx: f64, top: f64, theme: &CanvasTheme) {
    ctx.set_font("600 11px Inter, system-ui, sans-serif");
    let text_w = ctx
        .measure_text(label)
        .map(|m| m.width())
        .unwrap_or(label.len() as f64 * 6.5);
    let (pad_x, h) = (5.0, 16.0);
    let w = text_w + pad_x * 2.0;

    let _ = ctx.set_line_dash(&js_sys::Array::new());
    rounded_rect_path(ctx, cx - w / 2.0, top, w, h, h / 2.0);
    ctx.set_fill_style_str(theme.label_bg);
    ctx.fill();

    ctx.set_fill_style_str(theme.label_text);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, cx, top + h / 2.0);
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
