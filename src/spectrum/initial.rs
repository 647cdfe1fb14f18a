//! Initial frequency-domain height spectrum, one layer per cascade.

use std::f32::consts::PI;

use glam::Vec2;
use rustfft::num_complex::Complex32;

use super::compile::compile_cascades;
use super::jonswap::{directional_energy, dispersion, dispersion_derivative};
use super::random::bin_gaussian;
use crate::device::DeviceField;
use crate::params::{SimulationConfig, SpectrumLayerParams};

/// Amplitudes below this are flushed to zero
const AMPLITUDE_FLOOR: f32 = 1e-20;

/// One wavenumber bin: `h0(k)` and the packed partner `conj(h0(-k))`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectrumBin {
    pub h0: Complex32,
    pub h0_conj_neg: Complex32,
}

/// Wavevector of grid bin `(x, z)` for an `n`-sized grid tiled over `length_scale_m`
pub fn wavevector(x: usize, z: usize, n: usize, length_scale_m: f32) -> Vec2 {
    let half_n = (n / 2) as f32;
    let delta_k = 2.0 * PI / length_scale_m;
    Vec2::new(x as f32 - half_n, z as f32 - half_n) * delta_k
}

/// Index of the bin holding `-k` (wraps the Nyquist row onto itself)
pub fn mirror_index(i: usize, n: usize) -> usize {
    (n - i) % n
}

/// Complex amplitude `h0(k)` of a single bin
#[allow(clippy::too_many_arguments)]
fn bin_amplitude(
    x: usize,
    z: usize,
    cascade: usize,
    n: usize,
    length_scale_m: f32,
    band: (f32, f32),
    layers: &[SpectrumLayerParams; 2],
    config: &SimulationConfig,
    seed: u64,
) -> Complex32 {
    let k_vec = wavevector(x, z, n, length_scale_m);
    let k = k_vec.length();
    if k < 1e-6 || k < band.0 || k > band.1 {
        return Complex32::new(0.0, 0.0);
    }

    let (g, depth) = (config.gravity_m_per_s2, config.depth_m);
    let delta_k = 2.0 * PI / length_scale_m;
    let theta = k_vec.y.atan2(k_vec.x);
    let omega = dispersion(k, g, depth);
    let d_omega_dk = dispersion_derivative(k, g, depth);

    let energy = directional_energy(k, theta, omega, layers, g, depth);
    let amplitude = (2.0 * energy * d_omega_dk.abs() / k * delta_k * delta_k).sqrt();
    if !amplitude.is_finite() || amplitude < AMPLITUDE_FLOOR {
        return Complex32::new(0.0, 0.0);
    }

    let (a, b) = bin_gaussian(seed, cascade, x, z);
    Complex32::new(a, b) * amplitude
}

/// Everything the initial spectrum depends on.
///
/// Two configurations with equal inputs produce identical bins, so a change
/// here is what triggers regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumInputs {
    pub compiled: Vec<[SpectrumLayerParams; 2]>,
    pub seed: u64,
    pub gravity_m_per_s2: f32,
    pub depth_m: f32,
    pub length_scales_m: Vec<f32>,
    /// Wavenumber band per cascade, after cutoffs and band splitting
    pub bands: Vec<(f32, f32)>,
}

impl SpectrumInputs {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            compiled: compile_cascades(config),
            seed: config.seed,
            gravity_m_per_s2: config.gravity_m_per_s2,
            depth_m: config.depth_m,
            length_scales_m: config.cascades.iter().map(|c| c.length_scale_m).collect(),
            bands: config.cascade_bands(),
        }
    }
}

/// Seeded initial spectrum for every cascade.
///
/// Regenerated only on an explicit request or when its [`SpectrumInputs`] change.
pub struct InitialSpectrum {
    resolution: usize,
    seed: u64,
    bins: DeviceField<SpectrumBin>,
}

impl InitialSpectrum {
    /// Generate all cascades from compiled parameters
    pub fn generate(
        config: &SimulationConfig,
        compiled: &[[SpectrumLayerParams; 2]],
        seed: u64,
    ) -> Self {
        let n = config.resolution;
        let mut spectrum = Self {
            resolution: n,
            seed,
            bins: DeviceField::allocate("initial_spectrum", n, n, config.cascades.len()),
        };
        spectrum.regenerate(config, compiled, seed);
        spectrum
    }

    /// Recompute in place. Same seed and parameters give identical bins.
    pub fn regenerate(
        &mut self,
        config: &SimulationConfig,
        compiled: &[[SpectrumLayerParams; 2]],
        seed: u64,
    ) {
        let n = self.resolution;
        let bands = config.cascade_bands();
        self.seed = seed;

        self.bins.dispatch_all(|cascade, x, z, bin| {
            bin.h0 = bin_amplitude(
                x,
                z,
                cascade,
                n,
                config.cascades[cascade].length_scale_m,
                bands[cascade],
                &compiled[cascade],
                config,
                seed,
            );
        });

        // Pack the conjugate partner so evolution is a purely per-bin operation
        for cascade in 0..self.bins.layers() {
            let layer = self.bins.read(cascade);
            let packed: Vec<SpectrumBin> = (0..n * n)
                .map(|i| {
                    let (x, z) = (i % n, i / n);
                    SpectrumBin {
                        h0: layer[i].h0,
                        h0_conj_neg: layer[mirror_index(z, n) * n + mirror_index(x, n)].h0.conj(),
                    }
                })
                .collect();
            self.bins.write(cascade, &packed);
        }

        log::debug!(
            "Generated initial spectrum: {} cascades at {}x{}, seed {}",
            self.bins.layers(),
            n,
            n,
            seed
        );
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cascades(&self) -> usize {
        self.bins.layers()
    }

    pub fn layer(&self, cascade: usize) -> &[SpectrumBin] {
        self.bins.read(cascade)
    }

    pub fn bin(&self, cascade: usize, x: usize, z: usize) -> SpectrumBin {
        self.bins.texel(cascade, x, z)
    }

    /// Hermitian height spectrum at rest, `h0(k) + conj(h0(-k))`
    pub fn height_at_rest(&self, cascade: usize, x: usize, z: usize) -> Complex32 {
        let bin = self.bin(cascade, x, z);
        bin.h0 + bin.h0_conj_neg
    }

    /// Sum of `|h0|²` over a cascade (proportional to its wave energy)
    pub fn energy(&self, cascade: usize) -> f32 {
        self.layer(cascade).iter().map(|b| b.h0.norm_sqr()).sum()
    }
}
