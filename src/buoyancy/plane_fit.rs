//! Least-squares plane through sampled water heights, and a kinematic follower.

use glam::{Mat3, Quat, Vec3};

use super::body::RigidBody;
use crate::params::PlaneFitSettings;

/// A plane through `origin` with an upward-facing unit `normal`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneFit {
    pub origin: Vec3,
    pub normal: Vec3,
}

impl PlaneFit {
    /// Plane height above a horizontal position
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.origin.y
            - (self.normal.x * (x - self.origin.x) + self.normal.z * (z - self.origin.z)) / self.normal.y
    }
}

fn covariance(offsets: impl Iterator<Item = Vec3>) -> Mat3 {
    offsets.fold(Mat3::ZERO, |acc, d| acc + Mat3::from_cols(d * d.x, d * d.y, d * d.z))
}

/// Dominant eigenvector by power iteration, kept orthogonal to `exclude`
fn power_iteration(matrix: Mat3, initial: Vec3, iterations: u32, exclude: Option<Vec3>) -> Option<Vec3> {
    let mut v = initial.normalize_or_zero();
    for _ in 0..iterations {
        let mut next = matrix * v;
        if let Some(axis) = exclude {
            next -= axis * next.dot(axis);
        }
        let length = next.length();
        if !(length > 1e-12) {
            return None;
        }
        v = next / length;
    }
    (v != Vec3::ZERO).then_some(v)
}

/// Fit a plane through `points`.
///
/// The primary axis comes from power iteration on the covariance; the points are
/// then flattened along it and a second pass finds the secondary axis. Returns
/// `None` when the points do not span a plane.
pub fn fit_plane(points: &[Vec3], iterations: u32) -> Option<PlaneFit> {
    if points.len() < 3 {
        return None;
    }
    let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;

    let primary = power_iteration(
        covariance(points.iter().map(|p| *p - centroid)),
        Vec3::new(1.0, 0.0, 1.0),
        iterations,
        None,
    )?;

    let flattened = covariance(points.iter().map(|p| {
        let d = *p - centroid;
        d - primary * d.dot(primary)
    }));
    let mut seed = primary.cross(Vec3::Y);
    if seed.length_squared() < 1e-8 {
        seed = primary.cross(Vec3::X);
    }
    let secondary = power_iteration(flattened, seed, iterations, Some(primary))?;

    let normal = primary.cross(secondary).normalize_or_zero();
    if normal == Vec3::ZERO || normal.y.abs() < 1e-6 {
        return None;
    }
    Some(PlaneFit {
        origin: centroid,
        normal: if normal.y < 0.0 { -normal } else { normal },
    })
}

/// Smooths discrete fits and drives a kinematic body toward them
#[derive(Clone, Debug)]
pub struct PlaneFollower {
    settings: PlaneFitSettings,
    target: Option<PlaneFit>,
    ticks_until_fit: u32,
}

impl PlaneFollower {
    pub fn new(settings: PlaneFitSettings) -> Self {
        Self {
            settings,
            target: None,
            ticks_until_fit: 0,
        }
    }

    pub fn settings(&self) -> &PlaneFitSettings {
        &self.settings
    }

    /// Count one tick; `true` when a re-fit is due
    pub fn tick_due(&mut self) -> bool {
        if self.ticks_until_fit == 0 {
            self.ticks_until_fit = self.settings.refit_interval_ticks.saturating_sub(1);
            true
        } else {
            self.ticks_until_fit -= 1;
            false
        }
    }

    /// Blend a new fit into the target (EMA over the smoothing window)
    pub fn push_fit(&mut self, fit: PlaneFit) {
        let alpha = 2.0 / (self.settings.smoothing_window as f32 + 1.0);
        self.target = Some(match self.target {
            None => fit,
            Some(current) => {
                let normal = current.normal.lerp(fit.normal, alpha).normalize_or_zero();
                PlaneFit {
                    origin: current.origin.lerp(fit.origin, alpha),
                    normal: if normal == Vec3::ZERO { fit.normal } else { normal },
                }
            }
        });
    }

    pub fn target(&self) -> Option<PlaneFit> {
        self.target
    }

    /// Critically damped spring toward the target height and orientation
    ///
    /// # Arguments
    /// * `body` - Body to drive; it is switched to kinematic
    /// * `dt_s` - Tick length in seconds
    pub fn drive(&self, body: &mut RigidBody, dt_s: f32) {
        let Some(target) = self.target else {
            return;
        };
        body.kinematic = true;
        let omega = self.settings.spring_frequency;

        let height = target.height_at(body.position.x, body.position.z) + self.settings.height_offset_m;
        let accel = omega * omega * (height - body.position.y) - 2.0 * omega * body.linear_velocity.y;
        body.linear_velocity.y += accel * dt_s;

        let tilt = Quat::from_rotation_arc(body.up(), target.normal).to_scaled_axis();
        let angular_accel = tilt * (omega * omega) - body.angular_velocity * (2.0 * omega);
        body.angular_velocity += angular_accel * dt_s;
    }
}
