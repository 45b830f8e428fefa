pub mod config;
pub mod id;
pub mod model;
pub mod registry;
pub mod surface;

pub use config::EditorConfig;
pub use id::{ArtistId, BookingId, ExhibitionId, HallMapId, StandId};
pub use model::*;
pub use registry::StandRegistry;
pub use surface::{ImageBounds, LoadError, LoadStatus, LoadTicket, MapSurface, ViewportState};

// Re-export kurbo geometry so downstream crates share one Point type
pub use kurbo::{Point, Vec2};
