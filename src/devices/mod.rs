//! Device implementations

pub mod simulated;

pub use simulated::{SimulatedCamera, SimulatedDevice, SyntheticStatus};
