//! Analytic sum-of-waves parameters (the non-spectral wave strategies).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maximum number of analytic waves summed per evaluation
pub const MAX_ANALYTIC_WAVES: usize = 4;

/// Shape function used by every wave of an analytic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveFunction {
    /// Plain sinusoid, vertical displacement only
    Sine,
    /// Exponentiated sine with sharper crests, vertical displacement only
    SteepSine,
    /// Trochoidal wave with horizontal displacement
    Gerstner,
}

/// How a wave's phase varies across the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WavePropagation {
    /// Plane wave travelling along a direction
    Directional { direction: Vec2 },
    /// Ring wave spreading outward from a point
    Circular { origin: Vec2 },
}

/// One analytic wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    pub propagation: WavePropagation,

    /// Phase speed (meters per second)
    pub speed_m_per_s: f32,

    /// Crest height above rest (meters)
    pub amplitude_m: f32,

    /// Crest-to-crest distance (meters)
    pub wavelength_m: f32,

    /// Sharpness. Gerstner: share of the no-fold limit in [0, 1].
    /// SteepSine: exponent, values below 1 are treated as 1.
    pub steepness: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            propagation: WavePropagation::Directional {
                direction: Vec2::new(1.0, 0.0),
            },
            speed_m_per_s: 1.0,
            amplitude_m: 0.5,
            wavelength_m: 8.0,
            steepness: 0.5,
        }
    }
}

/// Wave synthesis strategy, chosen once at configuration time
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaveModelConfig {
    /// JONSWAP spectrum synthesized with the cascaded FFT pipeline
    #[default]
    Spectral,
    /// Small sum of closed-form waves
    Analytic {
        function: WaveFunction,
        waves: Vec<WaveParams>,
    },
}
