//! Asynchronous field readback with frame latency.
//!
//! A request is captured on the first frame resolution after it is issued and
//! becomes pollable once `latency_frames` frames have been resolved. Results
//! travel as raw bytes and are decoded on poll, like a staging-buffer copy.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::error::{ConfigError, QueryError};
use crate::ocean::{ProbeSource, ProbeTexel};

/// Finished requests nobody polls for this many frames are dropped
pub const UNCLAIMED_EXPIRY_FRAMES: u32 = 8;

/// Opaque identifier of one outstanding request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryHandle(u64);

impl QueryHandle {
    /// For services that number their own requests
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Result of polling a request
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SamplePoll {
    pub ready: bool,
    pub error: Option<QueryError>,
    pub height: f32,
    pub slope_x: f32,
    pub slope_z: f32,
}

impl SamplePoll {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn failed(error: QueryError) -> Self {
        Self {
            ready: true,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn completed(texel: ProbeTexel) -> Self {
        Self {
            ready: true,
            error: None,
            height: texel.height,
            slope_x: texel.slope_x,
            slope_z: texel.slope_z,
        }
    }

    /// `normalize(-slopeX, 1, -slopeZ)`
    pub fn normal(&self) -> Vec3 {
        Vec3::new(-self.slope_x, 1.0, -self.slope_z).normalize()
    }
}

/// Fire-and-forget sampling of the published surface
pub trait SampleService {
    fn request_sample(&mut self, world_x: f32, world_z: f32) -> QueryHandle;

    /// Once a poll reports `ready` the handle is consumed
    fn poll_sample(&mut self, handle: QueryHandle) -> SamplePoll;

    /// Drop a request; its result is never delivered
    fn cancel(&mut self, handle: QueryHandle);
}

#[derive(Debug)]
enum RequestState {
    /// Not yet captured
    Queued,
    /// Captured, waiting out the remaining frames
    Copying { bytes: Vec<u8>, frames_left: u32 },
    Complete(Vec<u8>),
    Failed(QueryError),
}

#[derive(Debug)]
struct Request {
    world: Vec2,
    frames_left: u32,
    /// Frames resolved since the result became pollable
    unclaimed_frames: u32,
    state: RequestState,
}

/// In-order readback queue with a fixed latency
pub struct ReadbackQueue {
    latency_frames: u32,
    next_handle: u64,
    requests: HashMap<QueryHandle, Request>,
    delivered: u64,
    fail_every: u64,
    fail_next: u32,
}

impl ReadbackQueue {
    pub fn new(latency_frames: u32) -> Result<Self, ConfigError> {
        if !(1..=3).contains(&latency_frames) {
            return Err(ConfigError::InvalidLatency(latency_frames));
        }
        Ok(Self {
            latency_frames,
            next_handle: 0,
            requests: HashMap::new(),
            delivered: 0,
            fail_every: 0,
            fail_next: 0,
        })
    }

    pub fn latency_frames(&self) -> u32 {
        self.latency_frames
    }

    /// Applies to requests issued from now on
    pub fn set_latency(&mut self, latency_frames: u32) -> Result<(), ConfigError> {
        if !(1..=3).contains(&latency_frames) {
            return Err(ConfigError::InvalidLatency(latency_frames));
        }
        self.latency_frames = latency_frames;
        Ok(())
    }

    /// Requests issued and not yet consumed or cancelled
    pub fn outstanding(&self) -> usize {
        self.requests.len()
    }

    /// Fail every `n`-th delivered request (0 disables)
    pub fn inject_faults(&mut self, every_nth: u64) {
        self.fail_every = every_nth;
    }

    /// Fail the next `count` delivered requests
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    fn delivery_fails(&mut self) -> bool {
        self.delivered += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        self.fail_every > 0 && self.delivered % self.fail_every == 0
    }

    /// Advance one frame: capture queued requests against `source` and age copies.
    ///
    /// With no source every queued request fails with `NoField`. Results left
    /// unpolled for more than [`UNCLAIMED_EXPIRY_FRAMES`] frames are discarded.
    pub fn resolve_frame(&mut self, source: Option<&dyn ProbeSource>) {
        let mut handles: Vec<QueryHandle> = self.requests.keys().copied().collect();
        handles.sort_by_key(|h| h.0);
        let mut expired = 0usize;

        for handle in handles {
            let Some(request) = self.requests.get_mut(&handle) else {
                continue;
            };
            if matches!(request.state, RequestState::Complete(_) | RequestState::Failed(_)) {
                request.unclaimed_frames += 1;
                if request.unclaimed_frames > UNCLAIMED_EXPIRY_FRAMES {
                    self.requests.remove(&handle);
                    expired += 1;
                    continue;
                }
            }
            let state = std::mem::replace(&mut request.state, RequestState::Queued);
            let delivered_before = matches!(state, RequestState::Complete(_));
            let next = match advance(state, request, source) {
                RequestState::Complete(_) if !delivered_before && self.delivery_fails() => {
                    RequestState::Failed(QueryError::Readback)
                }
                other => other,
            };
            if let Some(request) = self.requests.get_mut(&handle) {
                request.state = next;
            }
        }
        if expired > 0 {
            log::debug!("Dropped {} unclaimed readback results", expired);
        }
    }
}

/// One frame of progress for a single request
fn advance(state: RequestState, request: &Request, source: Option<&dyn ProbeSource>) -> RequestState {
    let state = match (state, source) {
        (RequestState::Queued, None) => return RequestState::Failed(QueryError::NoField),
        (RequestState::Queued, Some(source)) => RequestState::Copying {
            bytes: bytemuck::bytes_of(&source.probe(request.world)).to_vec(),
            frames_left: request.frames_left,
        },
        (other, _) => other,
    };

    match state {
        RequestState::Copying { bytes, frames_left } if frames_left <= 1 => RequestState::Complete(bytes),
        RequestState::Copying { bytes, frames_left } => RequestState::Copying {
            bytes,
            frames_left: frames_left - 1,
        },
        other => other,
    }
}

impl SampleService for ReadbackQueue {
    fn request_sample(&mut self, world_x: f32, world_z: f32) -> QueryHandle {
        let handle = QueryHandle(self.next_handle);
        self.next_handle += 1;

        let world = Vec2::new(world_x, world_z);
        let state = if world.is_finite() {
            RequestState::Queued
        } else {
            RequestState::Failed(QueryError::NonFinitePosition)
        };
        self.requests.insert(
            handle,
            Request {
                world,
                frames_left: self.latency_frames,
                unclaimed_frames: 0,
                state,
            },
        );
        handle
    }

    fn poll_sample(&mut self, handle: QueryHandle) -> SamplePoll {
        let ready = match self.requests.get(&handle) {
            None => return SamplePoll::failed(QueryError::UnknownHandle),
            Some(request) => matches!(
                request.state,
                RequestState::Complete(_) | RequestState::Failed(_)
            ),
        };
        if !ready {
            return SamplePoll::pending();
        }

        match self.requests.remove(&handle).map(|r| r.state) {
            Some(RequestState::Complete(bytes)) if bytes.len() == std::mem::size_of::<ProbeTexel>() => {
                SamplePoll::completed(bytemuck::pod_read_unaligned(&bytes))
            }
            Some(RequestState::Failed(error)) => SamplePoll::failed(error),
            _ => SamplePoll::failed(QueryError::Readback),
        }
    }

    fn cancel(&mut self, handle: QueryHandle) {
        self.requests.remove(&handle);
    }
}
