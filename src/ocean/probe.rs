//! Low-resolution buoyancy probe field, sampled independently of the render grid.

use std::ops::{Add, Mul};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use super::field::sample_bilinear;
use super::surface::{displaced_sample, SurfaceModel, SurfaceSample};
use crate::device::DeviceField;

/// Packed probe sample, laid out the way a readback delivers it
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ProbeTexel {
    pub height: f32,
    pub slope_x: f32,
    pub slope_z: f32,
    pub foam: f32,
}

impl ProbeTexel {
    pub fn from_sample(sample: &SurfaceSample) -> Self {
        Self {
            height: sample.height(),
            slope_x: sample.slope.x,
            slope_z: sample.slope.y,
            foam: sample.foam,
        }
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::new(-self.slope_x, 1.0, -self.slope_z).normalize()
    }
}

impl Add for ProbeTexel {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            height: self.height + rhs.height,
            slope_x: self.slope_x + rhs.slope_x,
            slope_z: self.slope_z + rhs.slope_z,
            foam: self.foam + rhs.foam,
        }
    }
}

impl Mul<f32> for ProbeTexel {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            height: self.height * rhs,
            slope_x: self.slope_x * rhs,
            slope_z: self.slope_z * rhs,
            foam: self.foam * rhs,
        }
    }
}

/// Where readbacks get their data from
pub trait ProbeSource {
    /// Surface directly above world position `(x, z)`
    fn probe(&self, world: Vec2) -> ProbeTexel;
}

/// Displaced surface samples over one repeating tile
pub struct ProbeField {
    tile_m: f32,
    texels: DeviceField<ProbeTexel>,
}

impl ProbeField {
    pub fn allocate(resolution: usize, tile_m: f32) -> Self {
        Self {
            tile_m,
            texels: DeviceField::allocate("buoyancy_probe", resolution, resolution, 1),
        }
    }

    pub fn resolution(&self) -> usize {
        self.texels.width()
    }

    pub fn tile_m(&self) -> f32 {
        self.tile_m
    }

    pub fn texels(&self) -> &[ProbeTexel] {
        self.texels.read(0)
    }

    /// Resample the displaced surface of `model` at every probe texel
    pub fn refresh(&mut self, model: &dyn SurfaceModel, time_s: f32) {
        let spacing = self.tile_m / self.resolution() as f32;
        self.texels.dispatch(0, |x, z, texel| {
            let world = Vec2::new(x as f32, z as f32) * spacing;
            *texel = ProbeTexel::from_sample(&displaced_sample(model, world, time_s));
        });
    }
}

impl ProbeSource for ProbeField {
    fn probe(&self, world: Vec2) -> ProbeTexel {
        let coord = world / self.tile_m * self.resolution() as f32;
        sample_bilinear(&self.texels, 0, coord)
    }
}

/// Probe that evaluates a model directly, for surfaces that do not tile
pub struct DirectProbe<'a> {
    model: &'a dyn SurfaceModel,
    time_s: f32,
}

impl<'a> DirectProbe<'a> {
    pub fn new(model: &'a dyn SurfaceModel, time_s: f32) -> Self {
        Self { model, time_s }
    }
}

impl ProbeSource for DirectProbe<'_> {
    fn probe(&self, world: Vec2) -> ProbeTexel {
        ProbeTexel::from_sample(&displaced_sample(self.model, world, self.time_s))
    }
}
