//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Physical units (meters, seconds, radians, etc.)
//! - Documented ranges and meanings
//! - Validation that fails fast before any simulation state exists

mod buoyancy;
mod ocean;
mod spectrum;
mod waves;

// Re-export all types
pub use buoyancy::{BuoyancyConfig, ForcePolicy, PlaneFitSettings};
pub use ocean::{
    CascadeConfig, DepthAttenuation, FftBackendKind, FoamSettings, SimulationConfig,
    MAX_CASCADES, MIN_RESOLUTION,
};
pub use spectrum::{DisplaySpectrum, SpectrumLayerParams};
pub use waves::{WaveFunction, WaveModelConfig, WaveParams, WavePropagation, MAX_ANALYTIC_WAVES};
