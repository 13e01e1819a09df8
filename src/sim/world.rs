//! Presentation/physics collaborator interface
//!
//! The simulation never integrates physics or draws anything itself. It issues
//! movement targets and impulses through this trait and reads positions back.
//! Every query returns immediately; a stale handle must be tolerated by the
//! implementation (no panics, no effect).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::agent::AgentKind;
use crate::settings::AgentStartStats;

/// Opaque handle to a body owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentHandle(pub u32);

/// First collider hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub handle: AgentHandle,
    pub point: Vec3,
}

/// Engine-side operations the simulation depends on
pub trait World {
    /// Resize the platform for a new level. No-op by default.
    fn prepare_level(&mut self, _map_size: f32) {}

    /// Create a body for an agent and return its handle
    fn spawn_agent(&mut self, kind: AgentKind, position: Vec3, stats: &AgentStartStats)
    -> AgentHandle;

    /// Move a body toward `target` this frame (kinematic move)
    fn move_agent(&mut self, handle: AgentHandle, target: Vec3);

    /// Apply an instantaneous impulse to a body
    fn apply_impulse(&mut self, handle: AgentHandle, impulse: Vec3);

    /// Turn a body to face `direction`. Purely visual by default.
    fn face(&mut self, _handle: AgentHandle, _direction: Vec3) {}

    /// First collider along a ray, within `max_range`
    fn raycast_first(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<RayHit>;

    /// Intersect the camera ray through `cursor` with the ground plane
    fn screen_ray_onto_ground_plane(&self, cursor: Vec2) -> Option<Vec3>;

    /// Stop the body colliding now and remove it after `after_delay` seconds
    fn destroy_agent(&mut self, handle: AgentHandle, after_delay: f32);

    /// Current position of a body, `None` if it no longer exists
    fn position(&self, handle: AgentHandle) -> Option<Vec3>;
}
