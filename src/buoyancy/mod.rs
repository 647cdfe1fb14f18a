//! Buoyancy: latency-tolerant water queries and force integration on rigid bodies.

mod body;
mod buoyant;
mod plane_fit;
mod readback;
mod voxel;

pub use body::{RigidBody, STANDARD_GRAVITY};
pub use buoyant::{BuoyantBody, ForceReport};
pub use plane_fit::{fit_plane, PlaneFit, PlaneFollower};
pub use readback::{QueryHandle, ReadbackQueue, SampleService, SamplePoll};
pub use voxel::{HeightHistory, QueryState, Receiver, Voxel, VoxelGrid, WaterSample};
