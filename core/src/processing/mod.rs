pub mod alerts;
pub mod classifier;
pub mod roster;
pub mod sampler;
pub mod scheduler;
pub mod trail;

pub use alerts::{AlertDispatcher, SilentSink};
pub use classifier::{Classification, ProximityClassifier};
pub use roster::{AlertIntent, RosterEngine, RosterSnapshot, RosterSummary, TickReport};
pub use sampler::{DriftConfig, DriftSampler};
pub use scheduler::{PeriodicTask, BREADCRUMB_INTERVAL, SCAN_INTERVAL};
pub use trail::{ProjectedPoi, TrailProjector, TrailSnapshot};
