use crate::params::{RateScales, SimulationParameters, TransitionRates};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Grid geometry and where the outbreak starts
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    #[serde(default = "default_side")]
    pub side: usize,
    /// Row-major index of the cell infected by `seed()`.
    #[serde(default)]
    pub seed_cell: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { side: default_side(), seed_cell: 0 }
    }
}

fn default_side() -> usize {
    10
}

// Configuration for run length and recording
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    /// The run is terminal once the tick exceeds this value.
    #[serde(default = "default_horizon")]
    pub horizon_ticks: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval_ticks: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            horizon_ticks: default_horizon(),
            record_interval_ticks: default_record_interval(),
        }
    }
}

fn default_horizon() -> u32 {
    500
}

fn default_record_interval() -> u32 {
    1
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions { rng_seed: default_rng_seed() }
    }
}

fn default_rng_seed() -> u64 {
    42
}

/// Serialization formats accepted for recorded snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(OutputFormat::Json),
            "bincode" => Some(OutputFormat::Bincode),
            "messagepack" => Some(OutputFormat::MessagePack),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_stats: bool,
    /// Write the final grid as CSV.
    #[serde(default)]
    pub save_final_grid: bool,
    pub format: Option<String>, // "json", "bincode", "messagepack"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            save_stats: true,
            save_final_grid: false,
            format: None,
        }
    }
}

fn default_base_filename() -> String {
    "outbreak".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SweepConfig {
    /// Independently seeded runs; 1 means a single run.
    #[serde(default = "default_replicates")]
    pub replicates: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig { replicates: default_replicates() }
    }
}

fn default_replicates() -> u32 {
    1
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub parameters: SimulationParameters,
    #[serde(default)]
    pub rates: RateScales,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.side == 0 {
            anyhow::bail!("grid.side must be greater than 0.");
        }
        let population = self.grid.side * self.grid.side;
        if self.grid.seed_cell >= population {
            anyhow::bail!(
                "grid.seed_cell ({}) must lie inside the {}x{} grid.",
                self.grid.seed_cell,
                self.grid.side,
                self.grid.side
            );
        }
        let scales = &self.rates;
        for (name, value) in [
            ("rates.transmission_scale", scales.transmission_scale),
            ("rates.mortality_scale", scales.mortality_scale),
            ("rates.recovery_rate", scales.recovery_rate),
        ] {
            if value.is_nan() || value < 0.0 {
                anyhow::bail!("{} must be a non-negative number, got {}.", name, value);
            }
        }
        if self.sweep.replicates == 0 {
            anyhow::bail!("sweep.replicates must be greater than 0.");
        }
        Ok(())
    }

    /// Converts the configured parameters into the per-tick rates used at runtime.
    pub fn transition_rates(&self) -> TransitionRates {
        TransitionRates::derive(&self.parameters, &self.rates)
    }

    pub fn population(&self) -> usize {
        self.grid.side * self.grid.side
    }
}
