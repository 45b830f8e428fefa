//! Stand, hall map, and booking data model.
//!
//! Stand positions live in the hall map image's native pixel space
//! (`positionX` = column, `positionY` = row, top-left origin). Physical
//! footprints are centimeters. Wire shapes are camelCase JSON as produced by
//! the booking backend.

use crate::id::{ArtistId, BookingId, ExhibitionId, HallMapId, StandId};
use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Status & Type ───────────────────────────────────────────────────────

/// Booking state of a stand.
///
/// Unknown wire values land in `Other` instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StandStatus {
    #[default]
    Available,
    Pending,
    Booked,
    Maintenance,
    Other(String),
}

impl StandStatus {
    /// Parse a wire status (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Self::Available,
            "PENDING" => Self::Pending,
            "BOOKED" => Self::Booked,
            "MAINTENANCE" => Self::Maintenance,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Pending => "PENDING",
            Self::Booked => "BOOKED",
            Self::Maintenance => "MAINTENANCE",
            Self::Other(s) => s,
        }
    }

    /// Only available stands can be booked by an artist.
    pub fn is_bookable(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for StandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StandStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StandStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Kind of artwork a stand is set up for. Open set; hosts may send others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StandType {
    #[default]
    Painting,
    Sculpture,
    Photography,
    Digital,
    Other(String),
}

impl StandType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAINTING" => Self::Painting,
            "SCULPTURE" => Self::Sculpture,
            "PHOTOGRAPHY" => Self::Photography,
            "DIGITAL" => Self::Digital,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Painting => "PAINTING",
            Self::Sculpture => "SCULPTURE",
            Self::Photography => "PHOTOGRAPHY",
            Self::Digital => "DIGITAL",
            Self::Other(s) => s,
        }
    }
}

impl Serialize for StandType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StandType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

// ─── Dimensions ──────────────────────────────────────────────────────────

/// A stand side length in centimeters, always within `[MIN, MAX]`.
///
/// Out-of-range input is clamped at construction, the same way the form
/// inputs constrain it, so there is no separate rejection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StandDimension(u32);

impl StandDimension {
    pub const MIN: u32 = 50;
    pub const MAX: u32 = 500;
    pub const DEFAULT: u32 = 100;

    pub fn new(cm: u32) -> Self {
        Self(cm.clamp(Self::MIN, Self::MAX))
    }

    /// Clamp a raw (possibly fractional or negative) form value.
    pub fn from_f64(cm: f64) -> Self {
        if !cm.is_finite() {
            return Self::default();
        }
        let rounded = cm.round().clamp(Self::MIN as f64, Self::MAX as f64);
        Self(rounded as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for StandDimension {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl Serialize for StandDimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for StandDimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Ok(Self::from_f64(raw))
    }
}

// ─── Stand ───────────────────────────────────────────────────────────────

/// A bookable unit of exhibition space, drawn as a marker on the hall map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stand {
    pub id: StandId,
    pub stand_number: String,
    /// Column in native image pixels.
    pub position_x: f64,
    /// Row in native image pixels.
    pub position_y: f64,
    #[serde(default)]
    pub width: StandDimension,
    #[serde(default)]
    pub height: StandDimension,
    #[serde(rename = "type", default)]
    pub stand_type: StandType,
    #[serde(default)]
    pub status: StandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hall_map_id: Option<HallMapId>,
}

impl Stand {
    /// Marker position in image space (`x` = column, `y` = row).
    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }
}

/// One venue floor-plan image bound to one exhibition event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallMap {
    pub id: HallMapId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhibition_event_id: Option<ExhibitionId>,
    #[serde(default)]
    pub map_image_url: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Some endpoints embed the stands; others require a second fetch.
    /// `None` means not supplied, `Some(vec![])` means the map has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stands: Option<Vec<Stand>>,
}

// ─── Placement ───────────────────────────────────────────────────────────

/// An uncommitted click location captured while drawing, awaiting the
/// stand form. `lat` is the row and `lng` the column in image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPlacement {
    pub lat: f64,
    pub lng: f64,
    /// Host clock (ms) when the click happened; drives abandonment.
    pub placed_at_ms: f64,
}

impl PendingPlacement {
    pub fn from_image_point(p: Point, placed_at_ms: f64) -> Self {
        Self {
            lat: p.y,
            lng: p.x,
            placed_at_ms,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

// ─── Wire DTOs ───────────────────────────────────────────────────────────

/// Payload for `createStand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStandRequest {
    pub hall_map_id: HallMapId,
    pub stand_number: String,
    pub position_x: i64,
    pub position_y: i64,
    pub width: StandDimension,
    pub height: StandDimension,
    #[serde(rename = "type")]
    pub stand_type: StandType,
    pub status: StandStatus,
}

impl CreateStandRequest {
    /// Build a create request from a placement. Positions are rounded to
    /// whole pixels; new stands always start out available.
    pub fn new(
        hall_map_id: HallMapId,
        placement: &PendingPlacement,
        stand_number: &str,
        width: StandDimension,
        height: StandDimension,
        stand_type: StandType,
    ) -> Self {
        Self {
            hall_map_id,
            stand_number: stand_number.trim().to_string(),
            position_x: placement.lng.round() as i64,
            position_y: placement.lat.round() as i64,
            width,
            height,
            stand_type,
            status: StandStatus::Available,
        }
    }

    /// The stand this request describes, under a given id.
    pub fn into_stand(self, id: StandId) -> Stand {
        Stand {
            id,
            stand_number: self.stand_number,
            position_x: self.position_x as f64,
            position_y: self.position_y as f64,
            width: self.width,
            height: self.height,
            stand_type: self.stand_type,
            status: self.status,
            hall_map_id: Some(self.hall_map_id),
        }
    }
}

/// A booking of a stand by an artist. A separate resource from the stand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub exhibition_stand_id: StandId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<ArtistId>,
}

/// `getPendingBookings` answers either `{"bookings": [...]}` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PendingBookings {
    Wrapped { bookings: Vec<Booking> },
    Bare(Vec<Booking>),
}

impl PendingBookings {
    pub fn into_vec(self) -> Vec<Booking> {
        match self {
            Self::Wrapped { bookings } | Self::Bare(bookings) => bookings,
        }
    }
}

/// Result of an image upload. Either URL field may carry the location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
}

impl UploadedImage {
    /// The usable image URL, preferring the absolute one.
    pub fn url(&self) -> Option<&str> {
        fn usable(u: &Option<String>) -> Option<&str> {
            u.as_deref().map(str::trim).filter(|u| !u.is_empty())
        }
        usable(&self.full_url).or_else(|| usable(&self.file_url))
    }
}
