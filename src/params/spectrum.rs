//! Wave spectrum parameters: user-facing wind settings and their compiled form.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// One wind-sea or swell component as the user describes it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySpectrum {
    /// Contribution weight (dimensionless, 0 disables the component)
    pub scale: f32,

    /// Wind speed 10m above the surface (meters per second)
    pub wind_speed_m_per_s: f32,

    /// Direction the wind blows from (degrees, 0 = +X, counter-clockwise)
    pub wind_direction_deg: f32,

    /// Distance over which the wind has blown (meters)
    pub fetch_m: f32,

    /// Blend between a plain cos² spread (0) and the swell-aware spread (1)
    pub spread_blend: f32,

    /// Swell elongation, clamped to [0.01, 1]
    pub swell: f32,

    /// JONSWAP peak enhancement gamma (3.3 = mean North Sea value)
    pub peak_enhancement: f32,

    /// High-wavenumber attenuation length (meters)
    pub short_waves_fade: f32,
}

impl Default for DisplaySpectrum {
    fn default() -> Self {
        Self {
            scale: 1.0,
            wind_speed_m_per_s: 10.0,
            wind_direction_deg: 22.0,
            fetch_m: 100_000.0,
            spread_blend: 0.64,
            swell: 1.0,
            peak_enhancement: 3.3,
            short_waves_fade: 0.025,
        }
    }
}

impl DisplaySpectrum {
    /// A long-period swell component from a distant storm
    pub fn distant_swell() -> Self {
        Self {
            scale: 0.5,
            wind_speed_m_per_s: 2.0,
            wind_direction_deg: 59.0,
            fetch_m: 300_000.0,
            spread_blend: 1.0,
            swell: 1.0,
            peak_enhancement: 1.0,
            short_waves_fade: 0.01,
        }
    }

    /// A component that contributes nothing
    pub fn disabled() -> Self {
        Self {
            scale: 0.0,
            ..Self::default()
        }
    }
}

/// Compiled spectrum parameters, packed for upload to the spectrum kernels.
///
/// `alpha` and `peak_omega` are derived from fetch, wind speed and gravity.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpectrumLayerParams {
    pub scale: f32,
    /// Wind angle (radians)
    pub angle: f32,
    pub spread_blend: f32,
    pub swell: f32,
    /// JONSWAP energy scale
    pub alpha: f32,
    /// Peak angular frequency (radians per second)
    pub peak_omega: f32,
    pub gamma: f32,
    pub short_waves_fade: f32,
}

impl SpectrumLayerParams {
    /// Whether this layer adds any energy
    pub fn is_active(&self) -> bool {
        self.scale > 0.0
    }
}
