//! Spectral density building blocks: dispersion, JONSWAP, TMA and spreading.

use std::f32::consts::PI;

use crate::params::SpectrumLayerParams;

/// `tanh`/`cosh` arguments are clamped here; beyond it the water is deep
const DEEP_WATER_KD: f32 = 20.0;

/// Angular frequency of a surface gravity wave with wavenumber `k`
pub fn dispersion(k: f32, gravity: f32, depth_m: f32) -> f32 {
    (gravity * k * (k * depth_m).min(DEEP_WATER_KD).tanh()).sqrt()
}

/// `dω/dk` of [`dispersion`]
pub fn dispersion_derivative(k: f32, gravity: f32, depth_m: f32) -> f32 {
    let kd = (k * depth_m).min(DEEP_WATER_KD);
    let th = kd.tanh();
    let ch = kd.cosh();
    gravity * (depth_m * k / ch / ch + th) / dispersion(k, gravity, depth_m) / 2.0
}

/// Normalisation of the cos^2s spreading function, polynomial fit in `s`
fn normalization_factor(s: f32) -> f32 {
    let s2 = s * s;
    let s3 = s2 * s;
    let s4 = s3 * s;
    if s < 5.0 {
        -0.000564 * s4 + 0.00776 * s3 - 0.044 * s2 + 0.192 * s + 0.163
    } else {
        -4.80e-08 * s4 + 1.07e-05 * s3 - 9.53e-04 * s2 + 5.90e-02 * s + 3.93e-01
    }
}

fn cosine_2s(theta: f32, s: f32) -> f32 {
    normalization_factor(s) * (0.5 * theta).cos().abs().powf(2.0 * s)
}

fn spread_power(omega: f32, peak_omega: f32) -> f32 {
    if omega > peak_omega {
        9.77 * (omega / peak_omega).abs().powf(-2.5)
    } else {
        6.97 * (omega / peak_omega).abs().powf(5.0)
    }
}

/// Directional spreading `D(θ, ω)`, integrates to ~1 over θ
pub fn direction_spectrum(theta: f32, omega: f32, layer: &SpectrumLayerParams) -> f32 {
    let relative = theta - layer.angle;
    let s = spread_power(omega, layer.peak_omega)
        + 16.0 * (omega / layer.peak_omega).min(DEEP_WATER_KD).tanh() * layer.swell * layer.swell;
    let plain = 2.0 / PI * relative.cos() * relative.cos();
    plain + (cosine_2s(relative, s) - plain) * layer.spread_blend
}

/// Kitaigorodskii depth attenuation of the TMA spectrum
pub fn tma_correction(omega: f32, gravity: f32, depth_m: f32) -> f32 {
    let omega_h = omega * (depth_m / gravity).sqrt();
    if omega_h <= 1.0 {
        0.5 * omega_h * omega_h
    } else if omega_h < 2.0 {
        1.0 - 0.5 * (2.0 - omega_h) * (2.0 - omega_h)
    } else {
        1.0
    }
}

/// JONSWAP energy density `S(ω)` with the TMA shallow-water correction
pub fn jonswap(omega: f32, layer: &SpectrumLayerParams, gravity: f32, depth_m: f32) -> f32 {
    let peak = layer.peak_omega;
    let sigma = if omega <= peak { 0.07 } else { 0.09 };
    let r = (-(omega - peak) * (omega - peak) / (2.0 * sigma * sigma * peak * peak)).exp();
    let inv_omega = 1.0 / omega;
    let peak_ratio = peak / omega;
    layer.scale
        * tma_correction(omega, gravity, depth_m)
        * layer.alpha
        * gravity
        * gravity
        * inv_omega.powi(5)
        * (-1.25 * peak_ratio.powi(4)).exp()
        * layer.gamma.abs().powf(r)
}

/// High-wavenumber attenuation `exp(-fade² k²)`
pub fn short_waves_fade(k: f32, layer: &SpectrumLayerParams) -> f32 {
    (-layer.short_waves_fade * layer.short_waves_fade * k * k).exp()
}

/// Total directional energy of a cascade's active components at one wavevector
pub fn directional_energy(
    k: f32,
    theta: f32,
    omega: f32,
    layers: &[SpectrumLayerParams; 2],
    gravity: f32,
    depth_m: f32,
) -> f32 {
    layers
        .iter()
        .filter(|layer| layer.is_active())
        .map(|layer| {
            jonswap(omega, layer, gravity, depth_m)
                * direction_spectrum(theta, omega, layer)
                * short_waves_fade(k, layer)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DisplaySpectrum;
    use crate::spectrum::compile_layer;

    fn layer() -> SpectrumLayerParams {
        compile_layer(&DisplaySpectrum::default(), 9.81)
    }

    #[test]
    fn test_deep_water_dispersion_limit() {
        let k = 0.5;
        let omega = dispersion(k, 9.81, 10_000.0);
        assert!((omega - (9.81_f32 * k).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_shallow_water_is_slower() {
        let k = 0.1;
        assert!(dispersion(k, 9.81, 2.0) < dispersion(k, 9.81, 1000.0));
    }

    #[test]
    fn test_dispersion_derivative_matches_finite_difference() {
        let (g, d) = (9.81, 15.0);
        for k in [0.05_f32, 0.3, 1.0, 4.0] {
            let h = 1e-3 * k;
            let numeric = (dispersion(k + h, g, d) - dispersion(k - h, g, d)) / (2.0 * h);
            let analytic = dispersion_derivative(k, g, d);
            assert!(
                ((numeric - analytic) / analytic).abs() < 1e-2,
                "k={} numeric={} analytic={}",
                k,
                numeric,
                analytic
            );
        }
    }

    #[test]
    fn test_jonswap_peaks_near_peak_omega() {
        let layer = layer();
        let (g, d) = (9.81, 1_000.0);
        let at_peak = jonswap(layer.peak_omega, &layer, g, d);
        assert!(at_peak > jonswap(layer.peak_omega * 0.5, &layer, g, d));
        assert!(at_peak > jonswap(layer.peak_omega * 2.0, &layer, g, d));
    }

    #[test]
    fn test_direction_spectrum_favors_wind_direction() {
        let layer = layer();
        let omega = layer.peak_omega;
        let along = direction_spectrum(layer.angle, omega, &layer);
        let across = direction_spectrum(layer.angle + PI / 2.0, omega, &layer);
        assert!(along > across);
        assert!(along > 0.0);
    }

    #[test]
    fn test_tma_correction_bounds() {
        for omega in [0.01_f32, 0.5, 1.0, 3.0, 10.0] {
            let c = tma_correction(omega, 9.81, 20.0);
            assert!((0.0..=1.0).contains(&c));
        }
        assert_eq!(tma_correction(10.0, 9.81, 20.0), 1.0);
    }
}
