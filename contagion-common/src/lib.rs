pub mod config;
pub mod params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{GridConfig, InitialConditions, OutputConfig, OutputFormat, SimulationConfig, SweepConfig, TimingConfig};
pub use params::{clamp_or_zero, RateScales, SimulationParameters, TransitionRates};
pub use snapshot::StepResult;
