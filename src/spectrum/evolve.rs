//! Per-frame time evolution of the initial spectrum.
//!
//! Every cascade produces four packed complex spectra. Each packs two real
//! fields as `A + iB`, so one inverse FFT recovers both as the real and
//! imaginary parts of the result:
//!
//! | packed | real part      | imaginary part |
//! |--------|----------------|----------------|
//! | 0      | `Dx`           | `Dz`           |
//! | 1      | `Dy` (height)  | `∂Dz/∂x`       |
//! | 2      | `∂h/∂x`        | `∂h/∂z`        |
//! | 3      | `∂Dx/∂x`       | `∂Dz/∂z`       |

use std::f32::consts::PI;

use rustfft::num_complex::Complex32;

use super::initial::{wavevector, InitialSpectrum, SpectrumBin};
use super::jonswap::dispersion;
use crate::device::DeviceField;
use crate::params::SimulationConfig;

/// Packed spectra per cascade
pub const PACKED_PER_CASCADE: usize = 4;

/// Which packed spectrum a layer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedSpectrum {
    HorizontalDisplacement = 0,
    HeightAndCrossDerivative = 1,
    Slope = 2,
    DisplacementDerivatives = 3,
}

impl PackedSpectrum {
    pub const ALL: [PackedSpectrum; PACKED_PER_CASCADE] = [
        PackedSpectrum::HorizontalDisplacement,
        PackedSpectrum::HeightAndCrossDerivative,
        PackedSpectrum::Slope,
        PackedSpectrum::DisplacementDerivatives,
    ];

    /// Layer index of this spectrum for `cascade`
    pub fn layer(self, cascade: usize) -> usize {
        cascade * PACKED_PER_CASCADE + self as usize
    }
}

fn times_i(c: Complex32) -> Complex32 {
    Complex32::new(-c.im, c.re)
}

/// Dispersion quantised to multiples of the loop frequency `2π / repeat_time`
pub fn looped_dispersion(k: f32, config: &SimulationConfig) -> f32 {
    let w0 = 2.0 * PI / config.repeat_time_s;
    (dispersion(k, config.gravity_m_per_s2, config.depth_m) / w0).floor() * w0
}

/// `h(k, t) = h0(k) e^{iωt} + conj(h0(-k)) e^{-iωt}`
pub fn evolve_height(bin: SpectrumBin, omega: f32, time_s: f32) -> Complex32 {
    let rotation = Complex32::from_polar(1.0, omega * time_s);
    bin.h0 * rotation + bin.h0_conj_neg * rotation.conj()
}

/// One packed spectrum value at wavevector `(kx, kz)`
pub fn packed_value(which: PackedSpectrum, htilde: Complex32, kx: f32, kz: f32) -> Complex32 {
    let k = (kx * kx + kz * kz).sqrt();
    let k_rcp = if k < 1e-4 { 1.0 } else { 1.0 / k };
    let ih = times_i(htilde);

    match which {
        PackedSpectrum::HorizontalDisplacement => {
            let dx = ih * (kx * k_rcp);
            let dz = ih * (kz * k_rcp);
            dx + times_i(dz)
        }
        PackedSpectrum::HeightAndCrossDerivative => {
            let dz_dx = -htilde * (kx * kz * k_rcp);
            htilde + times_i(dz_dx)
        }
        PackedSpectrum::Slope => {
            let dy_dx = ih * kx;
            let dy_dz = ih * kz;
            dy_dx + times_i(dy_dz)
        }
        PackedSpectrum::DisplacementDerivatives => {
            let dx_dx = -htilde * (kx * kx * k_rcp);
            let dz_dz = -htilde * (kz * kz * k_rcp);
            dx_dx + times_i(dz_dz)
        }
    }
}

/// Allocate the evolved spectra buffer for `cascades` cascades
pub fn allocate_evolved(resolution: usize, cascades: usize) -> DeviceField<Complex32> {
    DeviceField::allocate(
        "evolved_spectra",
        resolution,
        resolution,
        cascades * PACKED_PER_CASCADE,
    )
}

/// Advance every cascade to `time_s`, writing packed spectra into `out`
pub fn evolve_spectra(
    initial: &InitialSpectrum,
    config: &SimulationConfig,
    time_s: f32,
    out: &mut DeviceField<Complex32>,
) {
    let n = initial.resolution();
    debug_assert_eq!(out.layers(), initial.cascades() * PACKED_PER_CASCADE);

    out.dispatch_all(|layer, x, z, value| {
        let cascade = layer / PACKED_PER_CASCADE;
        let which = PackedSpectrum::ALL[layer % PACKED_PER_CASCADE];
        let k_vec = wavevector(x, z, n, config.cascades[cascade].length_scale_m);
        let omega = looped_dispersion(k_vec.length(), config);
        let htilde = evolve_height(initial.bin(cascade, x, z), omega, time_s);
        *value = packed_value(which, htilde, k_vec.x, k_vec.y);
    });
}
