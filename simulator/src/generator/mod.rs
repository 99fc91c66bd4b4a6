pub mod devices;
pub mod location;
