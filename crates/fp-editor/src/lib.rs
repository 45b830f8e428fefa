pub mod editor;
pub mod error;
pub mod gateway;
pub mod input;
pub mod interaction;
pub mod shortcuts;

pub use editor::{EditorEvent, ImageRequest, MapEditor, Review};
pub use error::{ApiError, GatewayError};
pub use gateway::{BookingApi, BookingGateway};
pub use interaction::{Mode, StandForm};
