//! Combat resolution
//!
//! Turns hit reports (the player's attack ray, projectile or melee contact
//! from the physics layer) into `get_hit` calls plus a knockback impulse.
//! A (source, target) pair is applied at most once per tick, so duplicate
//! collision reports in one frame cannot double-count damage.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::agent::{AgentId, HitOutcome};
use super::policy::AttackIntent;
use super::state::GameState;
use super::world::{AgentHandle, World};
use crate::settings::CombatSettings;

/// Who caused a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitSource {
    /// The player's attack ray
    PlayerAttack,
    /// Contact with another agent's body
    Agent(AgentId),
    /// A projectile tracked by the presentation layer
    Projectile(u32),
}

/// A hit reported to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub source: HitSource,
    pub target: AgentHandle,
    pub damage: f32,
    /// Impulse to apply to the target; zero for none
    pub knockback: Vec3,
}

/// A hit that landed on a live agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub target: AgentId,
    pub outcome: HitOutcome,
}

/// Per-tick hit mediator
#[derive(Debug, Default)]
pub struct CombatResolver {
    applied: HashSet<(HitSource, AgentHandle)>,
}

impl CombatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last tick's hits
    pub fn begin_tick(&mut self) {
        self.applied.clear();
    }

    /// Apply one reported hit. Misses, stale handles, dead attackers and
    /// duplicates resolve to `None` with no state change.
    pub fn resolve<W: World + ?Sized>(
        &mut self,
        event: &HitEvent,
        state: &mut GameState,
        world: &mut W,
    ) -> Option<Resolution> {
        if let HitSource::Agent(attacker) = event.source {
            let attacker_alive = state.agent(attacker).is_some_and(|a| a.alive);
            if !attacker_alive {
                log::debug!("Ignoring hit from dead or unknown agent {:?}", attacker);
                return None;
            }
        }

        let Some(target) = state.live_agent_by_handle_mut(event.target) else {
            log::debug!("Hit on {:?} has no live agent, treating as a miss", event.target);
            return None;
        };

        if !self.applied.insert((event.source, event.target)) {
            log::debug!(
                "Duplicate hit {:?} -> {:?} this tick, ignored",
                event.source,
                event.target
            );
            return None;
        }

        let outcome = target.get_hit(event.damage);
        if outcome != HitOutcome::Ignored && event.knockback != Vec3::ZERO {
            world.apply_impulse(event.target, event.knockback);
        }
        log::debug!("{:?} hit {:?}: {:?}", event.source, target.id, outcome);

        Some(Resolution {
            target: target.id,
            outcome,
        })
    }

    /// Fire the player's attack ray and apply the first enemy it meets
    pub fn resolve_attack<W: World + ?Sized>(
        &mut self,
        attack: &AttackIntent,
        combat: &CombatSettings,
        state: &mut GameState,
        world: &mut W,
    ) -> Option<Resolution> {
        let hit = world.raycast_first(attack.origin, attack.direction, combat.attack_range)?;

        let is_enemy = state
            .enemies
            .iter()
            .any(|e| e.alive && e.handle == hit.handle);
        if !is_enemy {
            log::debug!("Attack ray hit {:?}, not a live enemy", hit.handle);
            return None;
        }

        let event = HitEvent {
            source: HitSource::PlayerAttack,
            target: hit.handle,
            damage: combat.attack_damage,
            knockback: attack.direction * combat.knockback,
        };
        self.resolve(&event, state, world)
    }
}
