//! Wind/fetch parameters to packed JONSWAP parameters.

use crate::params::{DisplaySpectrum, SimulationConfig, SpectrumLayerParams};

/// Wind speed floor applied before compiling (meters per second).
/// Zero wind would make the peak frequency infinite.
pub const MIN_WIND_SPEED_M_PER_S: f32 = 0.01;

/// JONSWAP energy scale: `0.076 * (g F / U²)^-0.22`
pub fn jonswap_alpha(gravity: f32, fetch_m: f32, wind_speed_m_per_s: f32) -> f32 {
    let (g, f, u) = (gravity as f64, fetch_m as f64, wind_speed_m_per_s as f64);
    (0.076 * (g * f / (u * u)).powf(-0.22)) as f32
}

/// JONSWAP peak angular frequency: `22 * (U F / g²)^-0.33`
pub fn jonswap_peak_omega(gravity: f32, fetch_m: f32, wind_speed_m_per_s: f32) -> f32 {
    let (g, f, u) = (gravity as f64, fetch_m as f64, wind_speed_m_per_s as f64);
    (22.0 * (u * f / (g * g)).powf(-0.33)) as f32
}

/// Compile one spectrum component.
///
/// Pure and unclamped: a zero wind speed yields an infinite peak frequency, so callers
/// floor it with [`MIN_WIND_SPEED_M_PER_S`] first.
pub fn compile_layer(display: &DisplaySpectrum, gravity: f32) -> SpectrumLayerParams {
    SpectrumLayerParams {
        scale: display.scale,
        angle: display.wind_direction_deg.to_radians(),
        spread_blend: display.spread_blend.clamp(0.0, 1.0),
        swell: display.swell.clamp(0.01, 1.0),
        alpha: jonswap_alpha(gravity, display.fetch_m, display.wind_speed_m_per_s),
        peak_omega: jonswap_peak_omega(gravity, display.fetch_m, display.wind_speed_m_per_s),
        gamma: display.peak_enhancement,
        short_waves_fade: display.short_waves_fade,
    }
}

/// Compile both components of every cascade, flooring wind speed.
///
/// Cheap enough to run every frame.
pub fn compile_cascades(config: &SimulationConfig) -> Vec<[SpectrumLayerParams; 2]> {
    config
        .cascades
        .iter()
        .map(|cascade| {
            cascade.spectra.map(|display| {
                let floored = DisplaySpectrum {
                    wind_speed_m_per_s: display.wind_speed_m_per_s.max(MIN_WIND_SPEED_M_PER_S),
                    ..display
                };
                compile_layer(&floored, config.gravity_m_per_s2)
            })
        })
        .collect()
}
