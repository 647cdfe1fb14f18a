//! Common contract for every wave synthesis strategy.

use glam::{Vec2, Vec3};

/// Fixed-point steps used to undo horizontal displacement
pub const DISPLACEMENT_INVERSION_STEPS: usize = 2;

/// Surface state at one rest position
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceSample {
    /// Horizontal (x, z) and vertical (y) displacement (meters)
    pub displacement: Vec3,
    /// Height gradient `(∂h/∂x, ∂h/∂z)`
    pub slope: Vec2,
    /// Whitecap coverage in [0, 1]
    pub foam: f32,
}

impl SurfaceSample {
    pub fn height(&self) -> f32 {
        self.displacement.y
    }

    /// World-space normal `normalize(-∂h/∂x, 1, -∂h/∂z)`
    pub fn normal(&self) -> Vec3 {
        Vec3::new(-self.slope.x, 1.0, -self.slope.y).normalize()
    }
}

/// A wave strategy: sample the surface at a rest position and time.
///
/// Strategies backed by synthesized fields answer for the snapshot published
/// by the last update and ignore `time_s`.
pub trait SurfaceModel: Send + Sync {
    fn evaluate(&self, position: Vec2, time_s: f32) -> SurfaceSample;
}

/// Sample the displaced surface that lies above world position `world`.
///
/// Horizontal displacement moves surface points away from their rest position,
/// so the rest position is recovered by fixed-point iteration first.
pub fn displaced_sample<S: SurfaceModel + ?Sized>(model: &S, world: Vec2, time_s: f32) -> SurfaceSample {
    let mut rest = world;
    for _ in 0..DISPLACEMENT_INVERSION_STEPS {
        let sample = model.evaluate(rest, time_s);
        rest = world - Vec2::new(sample.displacement.x, sample.displacement.z);
    }
    model.evaluate(rest, time_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surface shifted sideways by a constant amount with height equal to x
    struct Shifted;

    impl SurfaceModel for Shifted {
        fn evaluate(&self, position: Vec2, _time_s: f32) -> SurfaceSample {
            SurfaceSample {
                displacement: Vec3::new(0.5, position.x, 0.0),
                slope: Vec2::new(1.0, 0.0),
                foam: 0.0,
            }
        }
    }

    #[test]
    fn test_flat_normal_points_up() {
        let sample = SurfaceSample::default();
        assert!((sample.normal() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_normal_leans_against_slope() {
        let sample = SurfaceSample {
            slope: Vec2::new(1.0, 0.0),
            ..SurfaceSample::default()
        };
        let n = sample.normal();
        assert!(n.x < 0.0 && n.y > 0.0);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_displaced_sample_undoes_constant_shift() {
        let sample = displaced_sample(&Shifted, Vec2::new(3.0, 1.0), 0.0);
        // The point displayed at x=3 rests at x=2.5
        assert!((sample.height() - 2.5).abs() < 1e-6);
    }
}
