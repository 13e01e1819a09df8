//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulated time only (driven by `dt`)
//! - Stable iteration order (player first, then enemies in roster order)
//! - No rendering or platform dependencies; those sit behind [`World`]

pub mod agent;
pub mod combat;
pub mod director;
pub mod headless;
pub mod policy;
pub mod round;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod world;

pub use agent::{Agent, AgentId, AgentKind, ChargeState, HitOutcome, Skill, Skills};
pub use combat::{CombatResolver, HitEvent, HitSource, Resolution};
pub use director::{DirectorSignal, WaveDirector};
pub use headless::HeadlessWorld;
pub use policy::{AttackIntent, Intent, PolicyContext};
pub use round::{CommandError, Hud, RoundController};
pub use scheduler::{Scheduler, Task};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::TickInput;
pub use world::{AgentHandle, RayHit, World};
