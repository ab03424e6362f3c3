pub mod clock;
pub mod generator;
pub mod incidents;
pub mod intersection;
pub mod predictor;
pub mod queues;
pub mod results;
pub mod runner;
pub mod scenario;
pub mod snapshot;
pub mod strategy;
pub mod systems;
pub mod telemetry;
pub mod traffic;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
