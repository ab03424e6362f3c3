pub mod arrivals;
pub mod incidents;
pub mod phase;
pub mod processing;
