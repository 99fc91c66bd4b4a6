pub mod capability;
pub mod location;
pub mod member;

pub use capability::{Capabilities, ConnectivityStatus};
pub use location::{Breadcrumb, LocationFix, Poi, PoiKind};
pub use member::{DeviceDescriptor, Member};
