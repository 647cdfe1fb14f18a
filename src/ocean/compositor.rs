//! Turns synthesized spatial spectra into displacement, slope and foam layers.

use glam::{Vec2, Vec3};
use rustfft::num_complex::Complex32;

use super::field::OceanFields;
use crate::device::DeviceField;
use crate::params::{FoamSettings, SimulationConfig};
use crate::spectrum::PackedSpectrum;

/// Every spatial quantity of one cascade at one texel
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CascadeTexel {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    pub dz_dx: f32,
    pub slope_x: f32,
    pub slope_z: f32,
    pub dx_dx: f32,
    pub dz_dz: f32,
}

impl CascadeTexel {
    /// Unpack the four transformed spectra of `cascade` at texel index `i`
    pub fn unpack(spatial: &DeviceField<Complex32>, cascade: usize, i: usize) -> Self {
        let at = |which: PackedSpectrum| spatial.read(which.layer(cascade))[i];
        let horizontal = at(PackedSpectrum::HorizontalDisplacement);
        let height = at(PackedSpectrum::HeightAndCrossDerivative);
        let slope = at(PackedSpectrum::Slope);
        let derivatives = at(PackedSpectrum::DisplacementDerivatives);

        Self {
            dx: horizontal.re,
            dz: horizontal.im,
            dy: height.re,
            dz_dx: height.im,
            slope_x: slope.re,
            slope_z: slope.im,
            dx_dx: derivatives.re,
            dz_dz: derivatives.im,
        }
    }

    pub fn displacement(&self, choppiness: [f32; 2]) -> Vec3 {
        Vec3::new(choppiness[0] * self.dx, self.dy, choppiness[1] * self.dz)
    }

    /// Slope with the horizontal compression of choppy waves divided out
    pub fn corrected_slope(&self, choppiness: [f32; 2]) -> Vec2 {
        Vec2::new(
            self.slope_x / (1.0 + (choppiness[0] * self.dx_dx).abs()),
            self.slope_z / (1.0 + (choppiness[1] * self.dz_dz).abs()),
        )
    }

    /// Determinant of the horizontal displacement map; below zero the surface folds
    pub fn jacobian(&self, choppiness: [f32; 2]) -> f32 {
        let [lx, lz] = choppiness;
        (1.0 + lx * self.dx_dx) * (1.0 + lz * self.dz_dz) - lx * lz * self.dz_dx * self.dz_dx
    }
}

/// Foam injected this tick by a texel with the given Jacobian
pub fn foam_source(jacobian: f32, foam: &FoamSettings, subtract: f32) -> f32 {
    let biased = foam.bias - jacobian;
    if biased <= foam.threshold {
        return 0.0;
    }
    (foam.add_rate * biased.max(0.0) - subtract).max(0.0)
}

/// Decay the accumulator, add the source and clamp to [0, 1]
pub fn accumulate_foam(previous: f32, source: f32, decay_rate: f32) -> f32 {
    (previous * (1.0 - decay_rate) + source).clamp(0.0, 1.0)
}

/// Write this frame's layers from the transformed spectra and rebuild mips.
///
/// Foam carries over from the previous frame; everything else is overwritten.
pub fn composite(spatial: &DeviceField<Complex32>, config: &SimulationConfig, fields: &mut OceanFields) {
    let lambda = config.choppiness;
    let width = spatial.width();

    fields.displacement.base_mut().dispatch_all(|cascade, x, z, texel| {
        *texel = CascadeTexel::unpack(spatial, cascade, z * width + x).displacement(lambda);
    });
    fields.slope.base_mut().dispatch_all(|cascade, x, z, texel| {
        *texel = CascadeTexel::unpack(spatial, cascade, z * width + x).corrected_slope(lambda);
    });
    fields.foam.base_mut().dispatch_all(|cascade, x, z, foam| {
        let jacobian = CascadeTexel::unpack(spatial, cascade, z * width + x).jacobian(lambda);
        let source = foam_source(jacobian, &config.foam, config.cascades[cascade].foam_subtract);
        *foam = accumulate_foam(*foam, source, config.foam.decay_rate);
    });

    fields.displacement.rebuild();
    fields.slope.rebuild();
    fields.foam.rebuild();
    fields.set_weights(config);
}
