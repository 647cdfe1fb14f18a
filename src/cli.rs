//! Command-line argument parsing and file-based configuration.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::error::SeaswellError;
use crate::params::{BuoyancyConfig, ForcePolicy, PlaneFitSettings, SimulationConfig};

/// Force policy of the probe body
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyPolicy {
    Direct,
    PlaneFit,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "seaswell")]
#[command(about = "Headless spectral ocean with a floating probe body", long_about = None)]
pub struct Args {
    /// Simulation configuration (RON); defaults are used when omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective configuration as RON and exit
    #[arg(long, value_name = "PATH")]
    pub dump_config: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    pub ticks: u32,

    /// Tick length (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "0.016666668")]
    pub dt: f32,

    /// Override the spectrum seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the FFT grid resolution (power of two)
    #[arg(long, value_name = "N")]
    pub resolution: Option<usize>,

    /// Export height and foam PNGs into this directory after the run
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Force policy of the probe body
    #[arg(long, value_enum, default_value = "direct")]
    pub body_policy: BodyPolicy,
}

impl Args {
    /// Load (or default) the configuration, apply overrides and validate
    pub fn load_config(&self) -> Result<SimulationConfig, SeaswellError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn buoyancy_config(&self) -> BuoyancyConfig {
        let policy = match self.body_policy {
            BodyPolicy::Direct => ForcePolicy::Direct,
            BodyPolicy::PlaneFit => ForcePolicy::PlaneFit(PlaneFitSettings::default()),
        };
        BuoyancyConfig {
            policy,
            ..BuoyancyConfig::default()
        }
    }
}

pub fn read_config(path: &Path) -> Result<SimulationConfig, SeaswellError> {
    let text = std::fs::read_to_string(path)?;
    let config = ron::from_str(&text)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn write_config(config: &SimulationConfig, path: &Path) -> Result<(), SeaswellError> {
    let text = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, text)?;
    Ok(())
}
