//! Stand registry → on-surface markers.
//!
//! A pure function of registry state plus the transient placement and the
//! hover/selection focus. The whole marker list is rebuilt on every change;
//! hall maps carry tens of stands, not thousands.

use fp_core::id::StandId;
use fp_core::model::{PendingPlacement, Stand, StandStatus};
use kurbo::Point;

// ─── Colors ──────────────────────────────────────────────────────────────

/// Status color of a stand marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Green,
    Red,
    Amber,
    /// Transient placement marker (not a stand yet).
    Blue,
}

impl MarkerColor {
    /// Booked → red, maintenance → amber, everything else → green.
    ///
    /// Pending and unknown statuses share the available look; the click
    /// handler still refuses to book anything that isn't `AVAILABLE`.
    pub fn for_status(status: &StandStatus) -> Self {
        match status {
            StandStatus::Booked => Self::Red,
            StandStatus::Maintenance => Self::Amber,
            StandStatus::Available | StandStatus::Pending | StandStatus::Other(_) => Self::Green,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Self::Green => "#22C55E",
            Self::Red => "#EF4444",
            Self::Amber => "#F59E0B",
            Self::Blue => "#3B82F6",
        }
    }
}

// ─── Markers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Stand(StandId),
    /// The uncommitted click location while the placement form is open.
    Transient,
}

/// Which stand the pointer is over and which one is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerFocus {
    pub hovered: Option<StandId>,
    pub selected: Option<StandId>,
}

/// Paint parameters derived from a marker's color and focus flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub fill: &'static str,
    pub outline: &'static str,
    pub outline_width: f64,
    /// Multiplier on the base marker radius.
    pub radius_scale: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Image-space position; the surface transform maps it to the screen.
    pub position: Point,
    pub color: MarkerColor,
    pub label: String,
    pub hovered: bool,
    pub selected: bool,
}

impl Marker {
    pub fn stand_id(&self) -> Option<StandId> {
        match self.kind {
            MarkerKind::Stand(id) => Some(id),
            MarkerKind::Transient => None,
        }
    }

    pub fn style(&self) -> MarkerStyle {
        let transient = matches!(self.kind, MarkerKind::Transient);
        MarkerStyle {
            fill: self.color.hex(),
            outline: if self.selected { "#1D4ED8" } else { "#FFFFFF" },
            outline_width: if self.selected { 3.0 } else { 2.0 },
            radius_scale: if self.hovered || self.selected { 1.25 } else { 1.0 },
            opacity: if transient { 0.7 } else { 1.0 },
        }
    }
}

/// Build the marker list in render order (later markers paint on top).
pub fn build_markers<'a>(
    stands: impl IntoIterator<Item = &'a Stand>,
    pending: Option<&PendingPlacement>,
    focus: MarkerFocus,
) -> Vec<Marker> {
    let mut markers: Vec<Marker> = stands
        .into_iter()
        .map(|stand| Marker {
            kind: MarkerKind::Stand(stand.id),
            position: stand.position(),
            color: MarkerColor::for_status(&stand.status),
            label: stand.stand_number.clone(),
            hovered: focus.hovered == Some(stand.id),
            selected: focus.selected == Some(stand.id),
        })
        .collect();

    if let Some(placement) = pending {
        markers.push(Marker {
            kind: MarkerKind::Transient,
            position: placement.position(),
            color: MarkerColor::Blue,
            label: String::new(),
            hovered: false,
            selected: false,
        });
    }

    log::trace!("built {} marker(s)", markers.len());
    markers
}
