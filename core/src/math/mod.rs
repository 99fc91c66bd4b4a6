pub mod geo;
pub mod radar;
pub mod signal;

pub use geo::{Bounds, ProjectedPoint};
pub use radar::radar_position;
pub use signal::SignalModel;
