//! Ring Out - arena survival simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (agents, movement policies, combat, waves, rounds)
//! - `settings`: Data-driven level table and game balance
//!
//! Rendering, physics integration, audio and input polling live outside this
//! crate. The simulation talks to them through [`sim::World`].

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Height of an agent's center above the ground plane when standing
    pub const SPAWN_HEIGHT: f32 = 0.5;
    /// An agent this close to the ground plane counts as grounded (jump gate)
    pub const GROUND_TOLERANCE: f32 = 0.51;
    /// Distance enemies spawn inside the platform edge
    pub const SPAWN_EDGE_INSET: f32 = 1.0;
    /// Angular step between consecutive spawns on the ring.
    /// Independent of wave size, so spawn slots repeat after ten enemies.
    pub const SPAWN_ANGLE_STEP: f32 = std::f32::consts::TAU / 10.0;

    /// Stat scale gained per level index
    pub const LEVEL_MODIFIER_STEP: f32 = 1.2;
}

/// Enemy stat multiplier for a level index
#[inline]
pub fn level_modifier(level: usize) -> f32 {
    1.0 + level as f32 * consts::LEVEL_MODIFIER_STEP
}

/// Convert polar (r, theta) on the ground plane to a world position at `height`
#[inline]
pub fn ring_position(r: f32, theta: f32, height: f32) -> Vec3 {
    Vec3::new(r * theta.cos(), height, r * theta.sin())
}

/// Project a vector onto the ground plane (drop the vertical component)
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
