//! Voxel arena: sample points over a body's bounding box.
//!
//! The bottom voxel of every (x, z) column is a receiver that owns a field
//! query; the voxels stacked above it reuse that receiver's result.

use std::collections::VecDeque;

use glam::{UVec3, Vec3};

use super::readback::QueryHandle;

/// Per-receiver query lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryState {
    /// Nothing outstanding; a query is issued on the next tick
    #[default]
    Idle,
    InFlight(QueryHandle),
    /// Result consumed, next query not yet issued
    Resolved,
}

/// One resolved water sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterSample {
    pub height: f32,
    pub normal: Vec3,
    pub time_s: f32,
}

/// Bounded history of resolved samples, oldest evicted first
#[derive(Clone, Debug)]
pub struct HeightHistory {
    capacity: usize,
    samples: VecDeque<WaterSample>,
}

impl HeightHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(2),
            samples: VecDeque::with_capacity(capacity.max(2)),
        }
    }

    pub fn push(&mut self, sample: WaterSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&WaterSample> {
        self.samples.back()
    }

    pub fn previous(&self) -> Option<&WaterSample> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    /// Height between the last two samples, `lerp(prev, last, elapsed / interval)`.
    ///
    /// `elapsed` counts from the latest resolution; a single sample is returned as is.
    pub fn interpolated(&self, now_s: f32) -> Option<WaterSample> {
        let last = *self.latest()?;
        let Some(prev) = self.previous().copied() else {
            return Some(last);
        };

        let interval = last.time_s - prev.time_s;
        let t = if interval > 1e-6 {
            ((now_s - last.time_s) / interval).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let normal = prev.normal.lerp(last.normal, t).normalize_or_zero();
        Some(WaterSample {
            height: prev.height + (last.height - prev.height) * t,
            normal: if normal == Vec3::ZERO { Vec3::Y } else { normal },
            time_s: now_s,
        })
    }
}

/// A sample point in body-local space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voxel {
    pub local_position: Vec3,
    /// Index into [`VoxelGrid::receivers`] of the receiver this voxel reads from
    pub receiver: usize,
}

impl Voxel {
    pub fn is_receiver(&self, grid: &VoxelGrid, index: usize) -> bool {
        grid.receivers[self.receiver].voxel == index
    }
}

/// A voxel that owns a field query
#[derive(Clone, Debug)]
pub struct Receiver {
    /// Arena index of the voxel this receiver samples for
    pub voxel: usize,
    pub state: QueryState,
    pub history: HeightHistory,
}

/// Flat, index-addressed voxel arena plus its receivers
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    voxels: Vec<Voxel>,
    receivers: Vec<Receiver>,
    dims: UVec3,
    voxel_size: Vec3,
}

impl VoxelGrid {
    /// Fill the box `[-half_extents, half_extents]`.
    ///
    /// The voxel edge is `normalized_voxel_size` times the smallest box
    /// extent, rounded per axis so whole voxels cover the box exactly.
    pub fn build(half_extents: Vec3, normalized_voxel_size: f32, history_capacity: usize) -> Self {
        let extents = half_extents * 2.0;
        let edge = extents.min_element() * normalized_voxel_size;
        let counts = (extents / edge).round().max(Vec3::ONE);
        let dims = counts.as_uvec3();
        let voxel_size = extents / counts;

        let mut voxels = Vec::with_capacity((dims.x * dims.y * dims.z) as usize);
        let mut receivers = Vec::with_capacity((dims.x * dims.z) as usize);
        for z in 0..dims.z {
            for x in 0..dims.x {
                let receiver = receivers.len();
                receivers.push(Receiver {
                    voxel: voxels.len(),
                    state: QueryState::Idle,
                    history: HeightHistory::new(history_capacity),
                });
                for y in 0..dims.y {
                    let cell = Vec3::new(x as f32, y as f32, z as f32) + 0.5;
                    voxels.push(Voxel {
                        local_position: -half_extents + cell * voxel_size,
                        receiver,
                    });
                }
            }
        }

        log::debug!(
            "Built voxel grid {}x{}x{} ({} receivers)",
            dims.x,
            dims.y,
            dims.z,
            receivers.len()
        );
        Self {
            voxels,
            receivers,
            dims,
            voxel_size,
        }
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    pub fn receivers_mut(&mut self) -> &mut [Receiver] {
        &mut self.receivers
    }

    /// World position of every receiver's voxel, in receiver order
    pub fn receiver_positions(&self, to_world: impl Fn(Vec3) -> Vec3) -> Vec<Vec3> {
        self.receivers
            .iter()
            .map(|r| to_world(self.voxels[r.voxel].local_position))
            .collect()
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}
