//! Headless reference world
//!
//! A small kinematic stand-in for the engine: spheres on a circular platform,
//! gravity, impulses, ray casts and delayed destruction. Used by the tests and
//! the native demo runner. Top-down camera: screen cursor (x, y) maps to the
//! ground point (x, 0, y).

use glam::{Vec2, Vec3};

use super::agent::AgentKind;
use super::world::{AgentHandle, RayHit, World};
use crate::consts::SPAWN_HEIGHT;
use crate::settings::AgentStartStats;

/// Downward acceleration (units/s²)
pub const GRAVITY: f32 = 9.81;
/// Horizontal velocity lost per second while grounded (fraction)
pub const GROUND_FRICTION: f32 = 4.0;
/// Collision radius of every body
pub const BODY_RADIUS: f32 = 0.5;

#[derive(Debug, Clone)]
struct Body {
    handle: AgentHandle,
    kind: AgentKind,
    position: Vec3,
    velocity: Vec3,
    collidable: bool,
    despawn_in: Option<f32>,
}

/// Kinematic world for tests and headless runs
#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    bodies: Vec<Body>,
    next_handle: u32,
    platform_radius: f32,
}

impl HeadlessWorld {
    pub fn new(map_size: f32) -> Self {
        Self {
            bodies: Vec::new(),
            next_handle: 1,
            platform_radius: map_size,
        }
    }

    pub fn platform_radius(&self) -> f32 {
        self.platform_radius
    }

    fn body(&self, handle: AgentHandle) -> Option<&Body> {
        self.bodies.iter().find(|b| b.handle == handle)
    }

    fn body_mut(&mut self, handle: AgentHandle) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.handle == handle)
    }

    /// Integrate one physics step
    pub fn step(&mut self, dt: f32) {
        let platform_radius = self.platform_radius;
        for body in &mut self.bodies {
            body.velocity.y -= GRAVITY * dt;
            body.position += body.velocity * dt;

            let over_platform =
                Vec2::new(body.position.x, body.position.z).length() <= platform_radius;
            if over_platform && body.position.y < SPAWN_HEIGHT && body.velocity.y <= 0.0 {
                body.position.y = SPAWN_HEIGHT;
                body.velocity.y = 0.0;
                let keep = (1.0 - GROUND_FRICTION * dt).max(0.0);
                body.velocity.x *= keep;
                body.velocity.z *= keep;
            }

            if let Some(t) = body.despawn_in.as_mut() {
                *t -= dt;
            }
        }
        self.bodies
            .retain(|b| b.despawn_in.is_none_or(|t| t > 0.0));
    }

    pub fn velocity(&self, handle: AgentHandle) -> Option<Vec3> {
        self.body(handle).map(|b| b.velocity)
    }

    /// Teleport a body (tests, scripted knock-offs)
    pub fn set_position(&mut self, handle: AgentHandle, position: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.position = position;
        }
    }

    pub fn contains(&self, handle: AgentHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn is_collidable(&self, handle: AgentHandle) -> bool {
        self.body(handle).is_some_and(|b| b.collidable)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn count_kind(&self, kind: AgentKind) -> usize {
        self.bodies.iter().filter(|b| b.kind == kind).count()
    }
}

/// Distance along a unit ray to the first intersection with a sphere
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = center - origin;
    let tca = oc.dot(dir);
    let d2 = oc.length_squared() - tca * tca;
    let r2 = radius * radius;
    if d2 > r2 {
        return None;
    }
    let thc = (r2 - d2).sqrt();
    let t0 = tca - thc;
    let t1 = tca + thc;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

impl World for HeadlessWorld {
    fn prepare_level(&mut self, map_size: f32) {
        log::info!("Platform radius {} -> {}", self.platform_radius, map_size);
        self.platform_radius = map_size;
    }

    fn spawn_agent(
        &mut self,
        kind: AgentKind,
        position: Vec3,
        _stats: &AgentStartStats,
    ) -> AgentHandle {
        let handle = AgentHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.push(Body {
            handle,
            kind,
            position,
            velocity: Vec3::ZERO,
            collidable: true,
            despawn_in: None,
        });
        handle
    }

    fn move_agent(&mut self, handle: AgentHandle, target: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.position = target;
        }
    }

    fn apply_impulse(&mut self, handle: AgentHandle, impulse: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.velocity += impulse;
        }
    }

    fn raycast_first(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        self.bodies
            .iter()
            .filter(|b| b.collidable)
            // The shooter's own body contains the origin
            .filter(|b| b.position.distance(origin) > BODY_RADIUS)
            .filter_map(|b| {
                ray_sphere(origin, dir, b.position, BODY_RADIUS)
                    .filter(|t| *t <= max_range)
                    .map(|t| (t, b.handle))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, handle)| RayHit {
                handle,
                point: origin + dir * t,
            })
    }

    fn screen_ray_onto_ground_plane(&self, cursor: Vec2) -> Option<Vec3> {
        cursor
            .is_finite()
            .then(|| Vec3::new(cursor.x, 0.0, cursor.y))
    }

    fn destroy_agent(&mut self, handle: AgentHandle, after_delay: f32) {
        if after_delay <= 0.0 {
            self.bodies.retain(|b| b.handle != handle);
            return;
        }
        match self.body_mut(handle) {
            Some(body) => {
                body.collidable = false;
                if body.despawn_in.is_none() {
                    body.despawn_in = Some(after_delay);
                }
            }
            None => log::debug!("destroy_agent on unknown handle {:?}", handle),
        }
    }

    fn position(&self, handle: AgentHandle) -> Option<Vec3> {
        self.body(handle).map(|b| b.position)
    }
}
