//! Minimal rigid body with force-at-point accumulation and semi-implicit Euler.

use glam::{Mat3, Quat, Vec3};

/// Standard gravity (meters per second squared)
pub const STANDARD_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// A box-shaped rigid body
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,

    /// Mass (kilograms)
    pub mass: f32,
    /// Diagonal of the body-space inertia tensor
    pub inertia: Vec3,
    pub gravity: Vec3,

    pub linear_drag: f32,
    pub angular_drag: f32,

    /// Kinematic bodies ignore forces and gravity and only follow their velocities
    pub kinematic: bool,

    force: Vec3,
    torque: Vec3,
}

impl RigidBody {
    /// Solid box of `mass` kilograms with the given half extents
    pub fn solid_box(mass: f32, half_extents: Vec3) -> Self {
        let e = half_extents * 2.0;
        let inertia = Vec3::new(
            e.y * e.y + e.z * e.z,
            e.x * e.x + e.z * e.z,
            e.x * e.x + e.y * e.y,
        ) * (mass / 12.0);

        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            inertia,
            gravity: STANDARD_GRAVITY,
            linear_drag: 0.0,
            angular_drag: 0.0,
            kinematic: false,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Force applied at a world point; off-centre points also produce torque
    pub fn add_force_at_point(&mut self, force: Vec3, world_point: Vec3) {
        self.force += force;
        self.torque += (world_point - self.position).cross(force);
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Forces accumulated since the last step (gravity excluded)
    pub fn accumulated_force(&self) -> Vec3 {
        self.force
    }

    pub fn accumulated_torque(&self) -> Vec3 {
        self.torque
    }

    fn inverse_world_inertia(&self) -> Mat3 {
        let rotation = Mat3::from_quat(self.orientation);
        let inv_local = Mat3::from_diagonal(self.inertia.recip());
        rotation * inv_local * rotation.transpose()
    }

    /// Advance by `dt_s` and clear the accumulators
    pub fn step(&mut self, dt_s: f32) {
        if !self.kinematic {
            let acceleration = self.gravity + self.force / self.mass;
            self.linear_velocity += acceleration * dt_s;
            self.angular_velocity += self.inverse_world_inertia() * self.torque * dt_s;
        }

        self.linear_velocity /= 1.0 + self.linear_drag * dt_s;
        self.angular_velocity /= 1.0 + self.angular_drag * dt_s;

        self.position += self.linear_velocity * dt_s;
        self.orientation =
            (Quat::from_scaled_axis(self.angular_velocity * dt_s) * self.orientation).normalize();

        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }
}
