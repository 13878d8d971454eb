// * Operational concerns shared by the binaries.

pub mod telemetry;

pub use telemetry::init_tracing;
