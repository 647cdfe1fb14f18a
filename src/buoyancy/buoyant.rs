//! Buoyant body: voxel queries against the ocean and the two force policies.

use glam::Vec3;

use super::body::RigidBody;
use super::plane_fit::{fit_plane, PlaneFollower};
use super::readback::SampleService;
use super::voxel::{QueryState, VoxelGrid, WaterSample};
use crate::error::{ConfigError, QueryError};
use crate::params::{BuoyancyConfig, ForcePolicy};

/// What one tick did to the body
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceReport {
    /// Sum of the buoyant forces applied this tick
    pub buoyant_force: Vec3,
    /// Buoyant force plus the body's weight
    pub net_force: Vec3,
    pub torque: Vec3,
    /// Mean submersion over all voxels in [0, 1]
    pub submerged_fraction: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    /// Receivers holding at least one resolved sample
    pub receivers_sampled: usize,
    /// Queries that failed this tick
    pub query_errors: usize,
}

/// World position and submersion of every voxel whose receiver has a sample
fn submersion(grid: &VoxelGrid, body: &RigidBody, now_s: f32) -> Vec<(Vec3, f32)> {
    let voxel_height = grid.voxel_size().y;
    grid.voxels()
        .iter()
        .filter_map(|voxel| {
            let water = grid.receivers()[voxel.receiver].history.interpolated(now_s)?;
            let world = body.local_to_world(voxel.local_position);
            let depth = water.height - world.y + 0.5 * voxel_height;
            Some((world, (depth / voxel_height).clamp(0.0, 1.0)))
        })
        .collect()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A rigid body floating on a sampled water surface.
///
/// Call [`BuoyantBody::disable`] before dropping an enabled body so its
/// in-flight queries are cancelled; a [`ReadbackQueue`](super::ReadbackQueue)
/// otherwise discards them only after they go unclaimed for a few frames.
pub struct BuoyantBody {
    pub body: RigidBody,
    half_extents: Vec3,
    config: BuoyancyConfig,
    grid: Option<VoxelGrid>,
    follower: Option<PlaneFollower>,
    time_s: f32,
}

impl BuoyantBody {
    pub fn new(body: RigidBody, half_extents: Vec3, config: BuoyancyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if !(half_extents.is_finite() && half_extents.min_element() > 0.0) {
            return Err(ConfigError::NonPositive {
                what: "body half extent",
                value: half_extents.min_element(),
            });
        }
        if !(body.mass.is_finite() && body.mass > 0.0) {
            return Err(ConfigError::NonPositive {
                what: "body mass",
                value: body.mass,
            });
        }

        let follower = match config.policy {
            ForcePolicy::Direct => None,
            ForcePolicy::PlaneFit(settings) => Some(PlaneFollower::new(settings)),
        };
        Ok(Self {
            body,
            half_extents,
            config,
            grid: None,
            follower,
            time_s: 0.0,
        })
    }

    pub fn config(&self) -> &BuoyancyConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.grid.is_some()
    }

    pub fn voxels(&self) -> Option<&VoxelGrid> {
        self.grid.as_ref()
    }

    /// Plane currently targeted by the plane-fit policy
    pub fn plane_target(&self) -> Option<super::PlaneFit> {
        self.follower.as_ref().and_then(PlaneFollower::target)
    }

    /// Build the voxel grid and issue the first query of every receiver
    pub fn enable(&mut self, service: Option<&mut dyn SampleService>) {
        if self.grid.is_some() {
            return;
        }
        let mut grid = VoxelGrid::build(
            self.half_extents,
            self.config.normalized_voxel_size,
            self.config.history_capacity,
        );

        if let Some(service) = service {
            let body = &self.body;
            let positions = grid.receiver_positions(|p| body.local_to_world(p));
            for (receiver, world) in grid.receivers_mut().iter_mut().zip(positions) {
                receiver.state = QueryState::InFlight(service.request_sample(world.x, world.z));
            }
        }

        log::info!(
            "Buoyant body enabled: {} voxels, {} receivers, {:?}",
            grid.len(),
            grid.receivers().len(),
            self.config.policy
        );
        self.grid = Some(grid);
    }

    /// Drop the voxels and cancel their in-flight queries
    pub fn disable(&mut self, service: Option<&mut dyn SampleService>) {
        let Some(grid) = self.grid.take() else {
            return;
        };
        if let Some(service) = service {
            for receiver in grid.receivers() {
                if let QueryState::InFlight(handle) = receiver.state {
                    service.cancel(handle);
                }
            }
        }
        log::info!("Buoyant body disabled");
    }

    /// Poll queries, apply the configured policy and step the body.
    ///
    /// Without a service, or while disabled, no buoyancy is applied.
    pub fn tick(&mut self, dt_s: f32, service: Option<&mut dyn SampleService>) -> ForceReport {
        self.time_s += dt_s;
        let service = match service {
            Some(service) if self.grid.is_some() => service,
            _ => return self.step_without_water(dt_s),
        };

        let query_errors = self.poll_receivers(service);
        let mut report = match self.config.policy {
            ForcePolicy::Direct => self.apply_direct(),
            ForcePolicy::PlaneFit(_) => self.apply_plane_fit(dt_s),
        };
        report.query_errors = query_errors;

        self.body.step(dt_s);
        report
    }

    fn step_without_water(&mut self, dt_s: f32) -> ForceReport {
        self.body.linear_drag = self.config.min_linear_drag;
        self.body.angular_drag = self.config.min_angular_drag;
        let report = ForceReport {
            net_force: self.body.gravity * self.body.mass,
            linear_drag: self.body.linear_drag,
            angular_drag: self.body.angular_drag,
            ..ForceReport::default()
        };
        self.body.step(dt_s);
        report
    }

    /// Advance every receiver's query. Returns the number of failed queries.
    fn poll_receivers(&mut self, service: &mut dyn SampleService) -> usize {
        let Some(grid) = self.grid.as_mut() else {
            return 0;
        };
        let body = &self.body;
        let positions = grid.receiver_positions(|p| body.local_to_world(p));
        let now = self.time_s;
        let mut failures = 0;
        let mut last_error: Option<QueryError> = None;

        for (receiver, world) in grid.receivers_mut().iter_mut().zip(positions) {
            match receiver.state {
                QueryState::Idle | QueryState::Resolved => {
                    receiver.state = QueryState::InFlight(service.request_sample(world.x, world.z));
                }
                QueryState::InFlight(handle) => {
                    let poll = service.poll_sample(handle);
                    if !poll.ready {
                        continue;
                    }
                    if let Some(error) = poll.error {
                        // Keep the last good sample; retry next tick
                        failures += 1;
                        last_error = Some(error);
                        receiver.state = QueryState::Idle;
                        continue;
                    }
                    receiver.history.push(WaterSample {
                        height: poll.height,
                        normal: poll.normal(),
                        time_s: now,
                    });
                    receiver.state = QueryState::Resolved;
                    // Re-issue at the current position, which may have moved
                    receiver.state = QueryState::InFlight(service.request_sample(world.x, world.z));
                }
            }
        }

        if let Some(error) = last_error {
            log::warn!(
                "{} buoyancy queries failed ({}); keeping last samples",
                failures,
                error
            );
        }
        failures
    }

    fn receivers_sampled(&self) -> usize {
        self.grid
            .as_ref()
            .map(|g| g.receivers().iter().filter(|r| !r.history.is_empty()).count())
            .unwrap_or(0)
    }

    fn update_drag(&mut self, submerged_fraction: f32) {
        self.body.linear_drag = lerp(self.config.min_linear_drag, 1.0, submerged_fraction);
        self.body.angular_drag = lerp(self.config.min_angular_drag, 1.0, submerged_fraction);
    }

    /// Per-voxel upward force proportional to submersion.
    ///
    /// This is the weight of displaced water only; gravity acts on the body
    /// separately, so the net vertical force carries the `1 - density` factor.
    fn apply_direct(&mut self) -> ForceReport {
        let Some(grid) = self.grid.as_ref() else {
            return ForceReport::default();
        };
        let count = grid.len().max(1) as f32;
        // Water displaced by one fully submerged voxel, as a mass
        let voxel_water_mass = self.body.mass / self.config.density / count;

        let mut submerged_total = 0.0;
        for (world, submerged) in submersion(grid, &self.body, self.time_s) {
            if submerged <= 0.0 {
                continue;
            }
            submerged_total += submerged;
            let force = -self.body.gravity * (voxel_water_mass * submerged);
            self.body.add_force_at_point(force, world);
        }

        let fraction = submerged_total / count;
        self.update_drag(fraction);
        let buoyant_force = self.body.accumulated_force();
        ForceReport {
            buoyant_force,
            net_force: buoyant_force + self.body.gravity * self.body.mass,
            torque: self.body.accumulated_torque(),
            submerged_fraction: fraction,
            linear_drag: self.body.linear_drag,
            angular_drag: self.body.angular_drag,
            receivers_sampled: self.receivers_sampled(),
            query_errors: 0,
        }
    }

    /// Kinematic follow of a periodically re-fitted plane
    fn apply_plane_fit(&mut self, dt_s: f32) -> ForceReport {
        let (Some(grid), Some(follower)) = (self.grid.as_ref(), self.follower.as_mut()) else {
            return ForceReport::default();
        };
        let now = self.time_s;

        if follower.tick_due() {
            let body = &self.body;
            let positions = grid.receiver_positions(|p| body.local_to_world(p));
            let points: Vec<Vec3> = grid
                .receivers()
                .iter()
                .zip(positions)
                .filter_map(|(receiver, world)| {
                    let water = receiver.history.interpolated(now)?;
                    Some(Vec3::new(world.x, water.height, world.z))
                })
                .collect();

            match fit_plane(&points, follower.settings().iterations) {
                Some(fit) => follower.push_fit(fit),
                None => log::debug!("Plane fit skipped: {} usable points", points.len()),
            }
        }
        follower.drive(&mut self.body, dt_s);

        let count = grid.len().max(1) as f32;
        let fraction = submersion(grid, &self.body, now)
            .iter()
            .map(|(_, s)| s)
            .sum::<f32>()
            / count;
        self.update_drag(fraction);

        ForceReport {
            submerged_fraction: fraction,
            linear_drag: self.body.linear_drag,
            angular_drag: self.body.angular_drag,
            receivers_sampled: self.receivers_sampled(),
            ..ForceReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buoyancy::{QueryHandle, SamplePoll};
    use crate::params::PlaneFitSettings;
    use std::collections::HashMap;

    /// Flat water answering every query on the next poll
    #[derive(Default)]
    struct FlatWater {
        height: f32,
        next: u64,
        pending: HashMap<QueryHandle, ()>,
        issued: Vec<QueryHandle>,
        cancelled: usize,
    }

    impl SampleService for FlatWater {
        fn request_sample(&mut self, _world_x: f32, _world_z: f32) -> QueryHandle {
            let handle = QueryHandle::from_raw(self.next);
            self.next += 1;
            self.pending.insert(handle, ());
            self.issued.push(handle);
            handle
        }

        fn poll_sample(&mut self, handle: QueryHandle) -> SamplePoll {
            match self.pending.remove(&handle) {
                Some(()) => SamplePoll {
                    ready: true,
                    error: None,
                    height: self.height,
                    slope_x: 0.0,
                    slope_z: 0.0,
                },
                None => SamplePoll::failed(QueryError::UnknownHandle),
            }
        }

        fn cancel(&mut self, handle: QueryHandle) {
            if self.pending.remove(&handle).is_some() {
                self.cancelled += 1;
            }
        }
    }

    fn floating_box(config: BuoyancyConfig, y: f32) -> BuoyantBody {
        let half = Vec3::new(1.0, 0.5, 1.0);
        let body = RigidBody::solid_box(100.0, half).with_position(Vec3::new(0.0, y, 0.0));
        BuoyantBody::new(body, half, config).unwrap()
    }

    #[test]
    fn test_missing_service_is_a_no_op() {
        let mut body = floating_box(BuoyancyConfig::default(), 0.0);
        body.enable(None);
        let report = body.tick(0.1, None);
        assert_eq!(report.buoyant_force, Vec3::ZERO);
        assert_eq!(report.submerged_fraction, 0.0);
        assert!(body.body.position.y < 0.0);
    }

    #[test]
    fn test_neutral_body_fully_submerged_has_no_net_force() {
        let config = BuoyancyConfig {
            density: 1.0,
            ..BuoyancyConfig::default()
        };
        let mut body = floating_box(config, -5.0);
        let mut water = FlatWater::default();
        body.enable(Some(&mut water));

        let mut report = ForceReport::default();
        for _ in 0..3 {
            report = body.tick(1.0 / 60.0, Some(&mut water));
        }
        assert!((report.submerged_fraction - 1.0).abs() < 1e-6);
        assert!(report.net_force.length() < 1e-2, "{:?}", report.net_force);
        assert!(report.torque.length() < 1e-2);
        assert!((report.linear_drag - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dry_body_uses_minimum_drag() {
        let mut body = floating_box(BuoyancyConfig::default(), 50.0);
        let mut water = FlatWater::default();
        body.enable(Some(&mut water));
        body.tick(1.0 / 60.0, Some(&mut water));
        let report = body.tick(1.0 / 60.0, Some(&mut water));
        assert_eq!(report.submerged_fraction, 0.0);
        assert_eq!(report.linear_drag, BuoyancyConfig::default().min_linear_drag);
        assert_eq!(report.receivers_sampled, 16);
    }

    #[test]
    fn test_light_body_floats_at_partial_draft() {
        let mut body = floating_box(BuoyancyConfig::default(), 0.3);
        let mut water = FlatWater::default();
        body.enable(Some(&mut water));
        for _ in 0..1200 {
            body.tick(1.0 / 60.0, Some(&mut water));
        }
        // Density 0.5 floats half submerged: the centre settles at the waterline
        assert!(body.body.position.y.abs() < 0.1, "{}", body.body.position.y);
        assert!(body.body.linear_velocity.length() < 0.05);
    }

    #[test]
    fn test_disable_cancels_in_flight_queries() {
        let mut body = floating_box(BuoyancyConfig::default(), 0.0);
        let mut water = FlatWater::default();
        body.enable(Some(&mut water));
        assert!(body.is_enabled());
        body.disable(Some(&mut water));
        assert!(!body.is_enabled());
        assert_eq!(water.cancelled, water.issued.len());
    }

    #[test]
    fn test_plane_fit_policy_tracks_water_height() {
        let config = BuoyancyConfig {
            policy: ForcePolicy::PlaneFit(PlaneFitSettings::default()),
            normalized_voxel_size: 0.25,
            ..BuoyancyConfig::default()
        };
        let mut body = floating_box(config, 3.0);
        let mut water = FlatWater {
            height: 0.5,
            ..FlatWater::default()
        };
        body.enable(Some(&mut water));
        for _ in 0..600 {
            body.tick(1.0 / 60.0, Some(&mut water));
        }
        let target = body.plane_target().unwrap();
        assert!((target.normal - Vec3::Y).length() < 1e-4);
        assert!((body.body.position.y - 0.5).abs() < 0.02);
    }
}
