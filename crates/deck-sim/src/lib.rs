pub mod backend;
pub mod doctor;
pub mod error;
pub mod feed;
pub mod ops;
pub mod telemetry;

pub use backend::{DeviceBackend, OpsConfig, SimulatedBackend};
pub use error::OpError;
pub use feed::TelemetryFeed;
pub use ops::{Operation, StartOutcome};
pub use telemetry::{DriftOverrides, DriftProfile, SnapshotOverrides, TelemetrySim};
