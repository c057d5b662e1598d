pub mod draft;
pub mod ops;
pub mod survey;
pub mod telemetry;
