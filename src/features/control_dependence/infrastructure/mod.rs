pub mod ntscd;

pub use ntscd::{compute, ControlDependence};
