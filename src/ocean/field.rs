//! Published ocean fields: per-cascade layers with mip chains and world sampling.

use std::ops::{Add, Mul};

use glam::{Vec2, Vec3};

use super::surface::{SurfaceModel, SurfaceSample};
use crate::device::DeviceField;
use crate::params::SimulationConfig;

/// Anything that can be box filtered and interpolated
pub trait Texel: Copy + Default + Send + Sync + Add<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Texel for T where T: Copy + Default + Send + Sync + Add<Output = T> + Mul<f32, Output = T> {}

/// Bilinear sample with wrap-around addressing.
///
/// `coord` is in texels of `field`, with texel `i` sampled exactly at `i`.
pub fn sample_bilinear<T: Texel>(field: &DeviceField<T>, layer: usize, coord: Vec2) -> T {
    let (w, h) = (field.width() as i64, field.height() as i64);
    let (fx, fz) = (coord.x.floor(), coord.y.floor());
    let (tx, tz) = (coord.x - fx, coord.y - fz);

    let x0 = (fx as i64).rem_euclid(w) as usize;
    let z0 = (fz as i64).rem_euclid(h) as usize;
    let x1 = (x0 + 1) % w as usize;
    let z1 = (z0 + 1) % h as usize;

    let top = field.texel(layer, x0, z0) * (1.0 - tx) + field.texel(layer, x1, z0) * tx;
    let bottom = field.texel(layer, x0, z1) * (1.0 - tx) + field.texel(layer, x1, z1) * tx;
    top * (1.0 - tz) + bottom * tz
}

/// A layered field and its box-filtered reductions down to 1x1
pub struct MipChain<T> {
    levels: Vec<DeviceField<T>>,
}

impl<T: Texel> MipChain<T> {
    /// Allocate every level for a square `resolution` (power of two)
    pub fn allocate(label: &'static str, resolution: usize, layers: usize) -> Self {
        let count = resolution.trailing_zeros() as usize + 1;
        let levels = (0..count)
            .map(|level| DeviceField::allocate(label, resolution >> level, resolution >> level, layers))
            .collect();
        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn base(&self) -> &DeviceField<T> {
        &self.levels[0]
    }

    pub fn base_mut(&mut self) -> &mut DeviceField<T> {
        &mut self.levels[0]
    }

    pub fn level(&self, level: usize) -> &DeviceField<T> {
        &self.levels[level]
    }

    /// Regenerate levels 1.. from the base with a 2x2 box filter
    pub fn rebuild(&mut self) {
        for level in 1..self.levels.len() {
            let (finer, coarser) = self.levels.split_at_mut(level);
            let src = &finer[level - 1];
            coarser[0].dispatch_all(|layer, x, z, texel| {
                let (sx, sz) = (2 * x, 2 * z);
                *texel = (src.texel(layer, sx, sz)
                    + src.texel(layer, sx + 1, sz)
                    + src.texel(layer, sx, sz + 1)
                    + src.texel(layer, sx + 1, sz + 1))
                    * 0.25;
            });
        }
    }

    /// Bilinear sample of one level at `uv` (one unit per tile)
    pub fn sample_level(&self, layer: usize, uv: Vec2, level: usize) -> T {
        let field = &self.levels[level];
        // Level texel j averages base texels [j 2^l, (j+1) 2^l)
        let offset = 0.5 - 0.5 / (1u32 << level) as f32;
        let coord = uv * field.width() as f32 - Vec2::splat(offset);
        sample_bilinear(field, layer, coord)
    }

    /// Trilinear sample at a fractional level of detail
    pub fn sample_lod(&self, layer: usize, uv: Vec2, lod: f32) -> T {
        let max_level = (self.levels.len() - 1) as f32;
        let lod = if lod.is_finite() { lod.clamp(0.0, max_level) } else { 0.0 };
        let lower = lod.floor() as usize;
        let upper = (lower + 1).min(self.levels.len() - 1);
        let t = lod - lower as f32;

        let a = self.sample_level(layer, uv, lower);
        if t <= 0.0 || upper == lower {
            return a;
        }
        a * (1.0 - t) + self.sample_level(layer, uv, upper) * t
    }
}

/// How strongly one cascade contributes to the composite
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CascadeWeights {
    /// World meters to tile UV (`tile / length_scale`)
    pub uv_scale: f32,
    pub displacement: f32,
    pub slope: f32,
    pub foam: f32,
}

/// Depth attenuation `clamp(depth / (0.5 L), 0, 1)^exponent`
pub fn depth_attenuation(depth_m: f32, length_scale_m: f32, exponent: f32) -> f32 {
    (depth_m / (0.5 * length_scale_m)).clamp(0.0, 1.0).powf(exponent)
}

/// Per-cascade weights for the current configuration.
///
/// When any cascade is flagged for debug isolation only flagged cascades contribute.
pub fn cascade_weights(config: &SimulationConfig) -> Vec<CascadeWeights> {
    let isolate = config.cascades.iter().any(|c| c.debug_visualize);
    config
        .cascades
        .iter()
        .map(|cascade| {
            if isolate && !cascade.debug_visualize {
                return CascadeWeights {
                    uv_scale: cascade.tile / cascade.length_scale_m,
                    ..CascadeWeights::default()
                };
            }
            let attenuate = |exponent| depth_attenuation(config.depth_m, cascade.length_scale_m, exponent);
            CascadeWeights {
                uv_scale: cascade.tile / cascade.length_scale_m,
                displacement: if cascade.contributes_to_displacement {
                    attenuate(config.attenuation.displacement_falloff)
                } else {
                    0.0
                },
                slope: attenuate(config.attenuation.normal_falloff),
                foam: attenuate(config.foam.depth_falloff),
            }
        })
        .collect()
}

/// Displacement, slope and foam, one layer per cascade.
///
/// Written once per frame by the compositor and read by everything else.
pub struct OceanFields {
    pub displacement: MipChain<Vec3>,
    pub slope: MipChain<Vec2>,
    pub foam: MipChain<f32>,
    weights: Vec<CascadeWeights>,
    mip_lod_distance_m: f32,
}

impl OceanFields {
    pub fn allocate(config: &SimulationConfig) -> Self {
        let (n, cascades) = (config.resolution, config.cascades.len());
        Self {
            displacement: MipChain::allocate("displacement", n, cascades),
            slope: MipChain::allocate("slope", n, cascades),
            foam: MipChain::allocate("foam", n, cascades),
            weights: cascade_weights(config),
            mip_lod_distance_m: config.mip_lod_distance_m,
        }
    }

    pub fn cascades(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[CascadeWeights] {
        &self.weights
    }

    pub(crate) fn set_weights(&mut self, config: &SimulationConfig) {
        self.weights = cascade_weights(config);
        self.mip_lod_distance_m = config.mip_lod_distance_m;
    }

    /// LOD for a viewer at `distance_m`: 0 up close, 1 at the configured distance
    pub fn lod_for_distance(&self, distance_m: f32) -> f32 {
        if !(distance_m > 0.0) {
            return 0.0;
        }
        (1.0 + (distance_m / self.mip_lod_distance_m).log2()).max(0.0)
    }

    /// Composite of all cascades at a rest position
    pub fn sample_lod(&self, position: Vec2, lod: f32) -> SurfaceSample {
        let mut sample = SurfaceSample::default();
        for (layer, weights) in self.weights.iter().enumerate() {
            let uv = position * weights.uv_scale;
            if weights.displacement > 0.0 {
                sample.displacement += self.displacement.sample_lod(layer, uv, lod) * weights.displacement;
            }
            if weights.slope > 0.0 {
                sample.slope += self.slope.sample_lod(layer, uv, lod) * weights.slope;
            }
            if weights.foam > 0.0 {
                sample.foam += self.foam.sample_lod(layer, uv, lod) * weights.foam;
            }
        }
        sample.foam = sample.foam.clamp(0.0, 1.0);
        sample
    }

    /// Composite at a rest position, filtered for a viewer `distance_m` away
    pub fn sample_at_distance(&self, position: Vec2, distance_m: f32) -> SurfaceSample {
        self.sample_lod(position, self.lod_for_distance(distance_m))
    }
}

impl SurfaceModel for OceanFields {
    fn evaluate(&self, position: Vec2, _time_s: f32) -> SurfaceSample {
        self.sample_lod(position, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DisplaySpectrum;

    #[test]
    fn test_bilinear_wraps_and_interpolates() {
        let mut field: DeviceField<f32> = DeviceField::allocate("test", 4, 4, 1);
        field.dispatch(0, |x, _, v| *v = x as f32);

        assert!((sample_bilinear(&field, 0, Vec2::new(1.5, 2.0)) - 1.5).abs() < 1e-6);
        // Between the last texel (3) and the wrapped first texel (0)
        assert!((sample_bilinear(&field, 0, Vec2::new(3.5, 0.0)) - 1.5).abs() < 1e-6);
        assert!((sample_bilinear(&field, 0, Vec2::new(-4.0, 0.0)) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_mip_chain_preserves_mean() {
        let mut chain: MipChain<f32> = MipChain::allocate("test", 8, 1);
        chain.base_mut().dispatch(0, |x, z, v| *v = (x * 3 + z * 5) as f32);
        chain.rebuild();

        assert_eq!(chain.level_count(), 4);
        let mean = chain.base().read(0).iter().sum::<f32>() / 64.0;
        assert!((chain.level(3).texel(0, 0, 0) - mean).abs() < 1e-4);
    }

    #[test]
    fn test_sample_lod_blends_levels() {
        let mut chain: MipChain<f32> = MipChain::allocate("test", 4, 1);
        chain.base_mut().fill(2.0);
        chain.rebuild();
        // A constant field is the same at every level
        let value = chain.sample_lod(0, Vec2::new(0.3, 0.7), 1.5);
        assert!((value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_depth_attenuation_curve() {
        assert!((depth_attenuation(100.0, 64.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((depth_attenuation(16.0, 64.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((depth_attenuation(16.0, 64.0, 2.0) - 0.25).abs() < 1e-6);
        assert!((depth_attenuation(0.0, 64.0, 0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_debug_isolation_mutes_other_cascades() {
        let mut config = SimulationConfig::default();
        config.cascades[2].debug_visualize = true;
        let weights = cascade_weights(&config);
        for (c, w) in weights.iter().enumerate() {
            if c == 2 {
                assert!(w.slope > 0.0);
            } else {
                assert_eq!((w.displacement, w.slope, w.foam), (0.0, 0.0, 0.0));
            }
        }
    }

    #[test]
    fn test_non_displacing_cascade_keeps_slope() {
        let mut config = SimulationConfig::single_cascade(64, 32.0, DisplaySpectrum::default());
        config.cascades[0].contributes_to_displacement = false;
        let weights = cascade_weights(&config);
        assert_eq!(weights[0].displacement, 0.0);
        assert!(weights[0].slope > 0.0);
        assert!((weights[0].uv_scale - 1.0 / 32.0).abs() < 1e-7);
    }

    #[test]
    fn test_lod_for_distance() {
        let config = SimulationConfig::single_cascade(16, 32.0, DisplaySpectrum::default());
        let fields = OceanFields::allocate(&config);
        assert_eq!(fields.lod_for_distance(0.0), 0.0);
        assert!((fields.lod_for_distance(config.mip_lod_distance_m) - 1.0).abs() < 1e-6);
        assert!((fields.lod_for_distance(config.mip_lod_distance_m * 4.0) - 3.0).abs() < 1e-5);
    }
}
