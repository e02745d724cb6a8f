mod coords;

pub use coords::{Point, ViewCoords};
