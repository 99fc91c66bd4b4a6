//! Proximity tracking and trail projection core for the Nomad mesh client.
//!
//! Raw per-member samples are turned into calibrated safety states by the
//! roster engine, while the trail projector keeps a deduplicated breadcrumb
//! trail and normalizes it into a paddable 2D viewport. Hardware feeds,
//! haptics and rendering sit behind small traits so hosts can plug in real
//! devices or the simulator.

pub mod device_interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{
    AlertKind, CalibrationConfig, HapticSink, MemberStatus, SampleUpdater, TrackingError,
    TrackingResult,
};
