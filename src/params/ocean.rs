//! Ocean simulation configuration: grid, cascades, foam and global physics.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::spectrum::DisplaySpectrum;
use super::waves::{WaveModelConfig, WavePropagation, MAX_ANALYTIC_WAVES};
use crate::error::ConfigError;

/// Maximum number of independently tiled cascades
pub const MAX_CASCADES: usize = 4;

/// Smallest grid the FFT engine accepts
pub const MIN_RESOLUTION: usize = 4;

/// Band boundary between cascades, in multiples of the next cascade's fundamental
const CASCADE_BAND_FACTOR: f32 = 6.0;

/// One independently tiled length-scale layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// World distance the NxN grid repeats over (meters)
    pub length_scale_m: f32,

    /// Physical tile factor (repeats per length scale when compositing)
    pub tile: f32,

    /// Whether this cascade adds to the displacement field
    pub contributes_to_displacement: bool,

    /// Show this cascade in isolation (debug)
    pub debug_visualize: bool,

    /// Foam subtracted from this cascade before it is composited
    pub foam_subtract: f32,

    /// Wind sea and swell components
    pub spectra: [DisplaySpectrum; 2],
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            length_scale_m: 256.0,
            tile: 1.0,
            contributes_to_displacement: true,
            debug_visualize: false,
            foam_subtract: 0.0,
            spectra: [DisplaySpectrum::default(), DisplaySpectrum::distant_swell()],
        }
    }
}

impl CascadeConfig {
    /// Effective world repeat length after tiling (meters)
    pub fn repeat_length_m(&self) -> f32 {
        self.length_scale_m / self.tile
    }
}

/// Whitecap foam accumulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoamSettings {
    /// Jacobian value below which the surface counts as breaking
    pub bias: f32,

    /// Minimum biased Jacobian that injects foam
    pub threshold: f32,

    /// Foam added per unit of biased Jacobian per tick
    pub add_rate: f32,

    /// Fraction of foam removed per tick, in [0, 1]
    pub decay_rate: f32,

    /// Depth attenuation exponent for foam
    pub depth_falloff: f32,
}

impl Default for FoamSettings {
    fn default() -> Self {
        Self {
            bias: 0.85,
            threshold: 0.0,
            add_rate: 0.1,
            decay_rate: 0.0175,
            depth_falloff: 1.0,
        }
    }
}

/// Shallow-water damping exponents (0 disables)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthAttenuation {
    pub displacement_falloff: f32,
    pub normal_falloff: f32,
}

impl Default for DepthAttenuation {
    fn default() -> Self {
        Self {
            displacement_falloff: 1.0,
            normal_falloff: 0.5,
        }
    }
}

/// Which inverse FFT implementation synthesizes the fields
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FftBackendKind {
    /// In-crate separable radix-2 engine
    #[default]
    Radix2,
    /// rustfft row/column transforms
    RustFft,
}

/// Complete, immutable simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// FFT grid side N (power of two, 64-2048 is the practical range)
    pub resolution: usize,

    /// Gravitational acceleration (meters per second squared)
    pub gravity_m_per_s2: f32,

    /// Water depth (meters)
    pub depth_m: f32,

    /// Period after which the animation loops exactly (seconds)
    pub repeat_time_s: f32,

    /// Seed for the initial spectrum phases
    pub seed: u64,

    /// Wavenumbers below this are discarded (radians per meter)
    pub low_cutoff: f32,

    /// Wavenumbers above this are discarded (radians per meter)
    pub high_cutoff: f32,

    /// Give each cascade its own wavenumber band so energy is not counted twice
    pub split_cascade_bands: bool,

    /// Horizontal displacement strength along X and Z
    pub choppiness: [f32; 2],

    pub cascades: Vec<CascadeConfig>,

    pub foam: FoamSettings,

    pub attenuation: DepthAttenuation,

    /// Side length of the buoyancy probe field
    pub probe_resolution: usize,

    /// Frames between a readback request and its completion (1-3)
    pub readback_latency_frames: u32,

    /// Viewer distance at which LOD 1 is reached (meters)
    pub mip_lod_distance_m: f32,

    pub fft_backend: FftBackendKind,

    pub wave_model: WaveModelConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let cascade = |length_scale_m: f32| CascadeConfig {
            length_scale_m,
            ..CascadeConfig::default()
        };

        Self {
            resolution: 256,
            gravity_m_per_s2: 9.81,
            depth_m: 20.0,
            repeat_time_s: 200.0,
            seed: 42,
            low_cutoff: 0.0001,
            high_cutoff: 9000.0,
            split_cascade_bands: true,
            choppiness: [1.0, 1.0],
            cascades: vec![cascade(256.0), cascade(64.0), cascade(16.0), cascade(4.0)],
            foam: FoamSettings::default(),
            attenuation: DepthAttenuation::default(),
            probe_resolution: 64,
            readback_latency_frames: 2,
            mip_lod_distance_m: 200.0,
            fft_backend: FftBackendKind::Radix2,
            wave_model: WaveModelConfig::Spectral,
        }
    }
}

impl SimulationConfig {
    /// Configuration with a single cascade driven by one wind-sea component
    pub fn single_cascade(resolution: usize, length_scale_m: f32, spectrum: DisplaySpectrum) -> Self {
        Self {
            resolution,
            cascades: vec![CascadeConfig {
                length_scale_m,
                spectra: [spectrum, DisplaySpectrum::disabled()],
                ..CascadeConfig::default()
            }],
            ..Self::default()
        }
    }

    /// Length of the largest repeating tile (meters); the probe field covers this
    pub fn primary_tile_m(&self) -> f32 {
        self.cascades
            .iter()
            .map(CascadeConfig::repeat_length_m)
            .fold(0.0, f32::max)
    }

    /// Whether every cascade repeats a whole number of times across the primary
    /// tile, so a probe field over that tile wraps without seams
    pub fn cascades_tile_primary(&self) -> bool {
        let primary = self.primary_tile_m();
        self.cascades.iter().all(|cascade| {
            let repeats = primary / cascade.repeat_length_m();
            (repeats - repeats.round()).abs() <= 1e-4 * repeats.max(1.0)
        })
    }

    /// Wavenumber band `[low, high]` synthesized by each cascade
    pub fn cascade_bands(&self) -> Vec<(f32, f32)> {
        let count = self.cascades.len();
        (0..count)
            .map(|i| {
                if !self.split_cascade_bands {
                    return (self.low_cutoff, self.high_cutoff);
                }
                let boundary = |c: usize| {
                    2.0 * PI / self.cascades[c].length_scale_m * CASCADE_BAND_FACTOR
                };
                let low = if i == 0 { self.low_cutoff } else { boundary(i) };
                let high = if i + 1 == count {
                    self.high_cutoff
                } else {
                    boundary(i + 1)
                };
                (low.max(self.low_cutoff), high.min(self.high_cutoff))
            })
            .collect()
    }

    /// Fail fast on anything the pipeline cannot synthesize
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolution.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(self.resolution));
        }
        if self.resolution < MIN_RESOLUTION {
            return Err(ConfigError::ResolutionTooSmall {
                got: self.resolution,
                min: MIN_RESOLUTION,
            });
        }
        if !(64..=2048).contains(&self.resolution) {
            log::warn!(
                "Grid resolution {} is outside the practical 64-2048 range",
                self.resolution
            );
        }

        for (what, value) in [
            ("gravity", self.gravity_m_per_s2),
            ("depth", self.depth_m),
            ("repeat time", self.repeat_time_s),
            ("mip lod distance", self.mip_lod_distance_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { what, value });
            }
        }
        if !(self.low_cutoff >= 0.0 && self.low_cutoff < self.high_cutoff) {
            return Err(ConfigError::InvalidRange {
                what: "wavenumber cutoffs",
                low: self.low_cutoff,
                high: self.high_cutoff,
            });
        }
        if self.probe_resolution < 2 {
            return Err(ConfigError::ResolutionTooSmall {
                got: self.probe_resolution,
                min: 2,
            });
        }
        if !(1..=3).contains(&self.readback_latency_frames) {
            return Err(ConfigError::InvalidLatency(self.readback_latency_frames));
        }
        if !(0.0..=1.0).contains(&self.foam.decay_rate) {
            return Err(ConfigError::OutOfUnitRange {
                what: "foam decay rate",
                value: self.foam.decay_rate,
            });
        }

        if self.cascades.is_empty() || self.cascades.len() > MAX_CASCADES {
            return Err(ConfigError::InvalidCascadeCount {
                got: self.cascades.len(),
                max: MAX_CASCADES,
            });
        }
        for (c, cascade) in self.cascades.iter().enumerate() {
            if !(cascade.length_scale_m.is_finite()
                && cascade.length_scale_m > 0.0
                && cascade.tile.is_finite()
                && cascade.tile > 0.0)
            {
                return Err(ConfigError::InvalidLengthScale { cascade: c });
            }
            for (layer, spectrum) in cascade.spectra.iter().enumerate() {
                if !(spectrum.wind_speed_m_per_s.is_finite() && spectrum.wind_speed_m_per_s >= 0.0)
                {
                    return Err(ConfigError::InvalidWindSpeed {
                        cascade: c,
                        layer,
                        value: spectrum.wind_speed_m_per_s,
                    });
                }
                if !(spectrum.fetch_m.is_finite() && spectrum.fetch_m > 0.0) {
                    return Err(ConfigError::InvalidFetch {
                        cascade: c,
                        layer,
                        value: spectrum.fetch_m,
                    });
                }
                if !spectrum.wind_direction_deg.is_finite() {
                    return Err(ConfigError::DegenerateDirection {
                        what: format!("cascade {} layer {} wind direction", c, layer),
                    });
                }
            }
        }
        if self.split_cascade_bands {
            for (c, (low, high)) in self.cascade_bands().into_iter().enumerate() {
                if low >= high {
                    log::debug!("Cascade {} band [{}, {}] is empty", c, low, high);
                    return Err(ConfigError::InvalidRange {
                        what: "cascade band (length scales must decrease)",
                        low,
                        high,
                    });
                }
            }
        }

        if self.wave_model == WaveModelConfig::Spectral && !self.cascades_tile_primary() {
            log::warn!(
                "Cascade repeat lengths do not divide the {} m primary tile; \
                 readbacks will evaluate the fields directly",
                self.primary_tile_m()
            );
        }

        if let WaveModelConfig::Analytic { waves, .. } = &self.wave_model {
            if waves.len() > MAX_ANALYTIC_WAVES {
                return Err(ConfigError::TooManyWaves {
                    got: waves.len(),
                    max: MAX_ANALYTIC_WAVES,
                });
            }
            for (i, wave) in waves.iter().enumerate() {
                if let WavePropagation::Directional { direction } = wave.propagation {
                    if !direction.is_finite() || direction.length_squared() < 1e-12 {
                        return Err(ConfigError::DegenerateDirection {
                            what: format!("analytic wave {}", i),
                        });
                    }
                }
                if !(wave.wavelength_m.is_finite() && wave.wavelength_m > 0.0) {
                    return Err(ConfigError::NonPositive {
                        what: "analytic wavelength",
                        value: wave.wavelength_m,
                    });
                }
            }
        }

        Ok(())
    }
}
