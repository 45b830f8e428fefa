pub mod hit;
pub mod markers;

pub use hit::hit_test;
pub use markers::{Marker, MarkerColor, MarkerFocus, MarkerKind, MarkerStyle, build_markers};
