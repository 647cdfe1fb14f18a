//! Closed-form sum-of-waves strategies.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::surface::{SurfaceModel, SurfaceSample};
use crate::params::{WaveFunction, WaveParams, WavePropagation};

/// One wave with its derived constants
#[derive(Clone, Copy, Debug)]
struct CompiledWave {
    propagation: WavePropagation,
    amplitude: f32,
    wavenumber: f32,
    omega: f32,
    steepness: f32,
    /// Gerstner horizontal factor `Q`, scaled so the whole sum never folds
    q: f32,
}

impl CompiledWave {
    /// Unit travel direction and phase at `position`
    fn direction_and_phase(&self, position: Vec2, time_s: f32) -> (Vec2, f32) {
        match self.propagation {
            WavePropagation::Directional { direction } => {
                let dir = direction.normalize_or_zero();
                (dir, self.wavenumber * dir.dot(position) - self.omega * time_s)
            }
            WavePropagation::Circular { origin } => {
                // Phase grows with radius, so crests move outward over time
                let offset = position - origin;
                (
                    offset.normalize_or_zero(),
                    self.wavenumber * offset.length() - self.omega * time_s,
                )
            }
        }
    }
}

/// A small sum of analytic waves sharing one shape function
#[derive(Clone, Debug)]
pub struct AnalyticWaves {
    function: WaveFunction,
    waves: Vec<CompiledWave>,
}

impl AnalyticWaves {
    pub fn new(function: WaveFunction, waves: &[WaveParams]) -> Self {
        let count = waves.len().max(1) as f32;
        let waves = waves
            .iter()
            .map(|wave| {
                let wavenumber = 2.0 * PI / wave.wavelength_m;
                let ka = wavenumber * wave.amplitude_m;
                CompiledWave {
                    propagation: wave.propagation,
                    amplitude: wave.amplitude_m,
                    wavenumber,
                    omega: wavenumber * wave.speed_m_per_s,
                    steepness: wave.steepness,
                    q: if ka > 0.0 {
                        wave.steepness.clamp(0.0, 1.0) / (ka * count)
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        Self { function, waves }
    }

    pub fn function(&self) -> WaveFunction {
        self.function
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}

impl SurfaceModel for AnalyticWaves {
    fn evaluate(&self, position: Vec2, time_s: f32) -> SurfaceSample {
        let mut displacement = Vec3::ZERO;
        let mut slope = Vec2::ZERO;
        // Horizontal compression along x and z, for the choppy slope correction
        let mut compression = Vec2::ZERO;

        for wave in &self.waves {
            let (dir, phase) = wave.direction_and_phase(position, time_s);
            let (sin, cos) = phase.sin_cos();
            let a = wave.amplitude;
            let k = wave.wavenumber;

            match self.function {
                WaveFunction::Sine => {
                    displacement.y += a * sin;
                    slope += dir * (a * k * cos);
                }
                WaveFunction::SteepSine => {
                    let exponent = wave.steepness.max(1.0);
                    let lifted = 0.5 * (sin + 1.0);
                    displacement.y += 2.0 * a * lifted.powf(exponent) - a;
                    slope += dir * (a * k * exponent * lifted.powf(exponent - 1.0) * cos);
                }
                WaveFunction::Gerstner => {
                    let horizontal = dir * (wave.q * a * cos);
                    displacement += Vec3::new(horizontal.x, a * sin, horizontal.y);
                    slope += dir * (a * k * cos);
                    compression -= dir * dir * (wave.q * a * k * sin);
                }
            }
        }

        SurfaceSample {
            displacement,
            slope: slope / (Vec2::ONE + compression.abs()),
            foam: 0.0,
        }
    }
}
