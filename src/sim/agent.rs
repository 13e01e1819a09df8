//! Agents: the player and every enemy variant
//!
//! One data record for all kinds. Behaviour differences live in
//! [`super::policy`], dispatched on [`AgentKind`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::world::AgentHandle;
use crate::settings::{AgentStartStats, FallBounds};

/// Stable identifier assigned by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Agent variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Player,
    /// Walks straight at the player
    Enemy,
    /// Stands still, winds up, then lunges
    ChargeEnemy,
}

/// A player capability that can be lost between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    MoveX,
    MoveZ,
    Shoot,
    Jump,
}

impl Skill {
    pub const ALL: [Skill; 4] = [Skill::MoveX, Skill::MoveZ, Skill::Shoot, Skill::Jump];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::MoveX => "Move left/right",
            Skill::MoveZ => "Move forward/back",
            Skill::Shoot => "Shoot",
            Skill::Jump => "Jump",
        }
    }
}

/// Player capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub can_move_x: bool,
    pub can_move_z: bool,
    pub can_shoot: bool,
    pub can_jump: bool,
}

impl Skills {
    pub const ALL: Skills = Skills {
        can_move_x: true,
        can_move_z: true,
        can_shoot: true,
        can_jump: true,
    };

    pub const NONE: Skills = Skills {
        can_move_x: false,
        can_move_z: false,
        can_shoot: false,
        can_jump: false,
    };

    pub fn has(&self, skill: Skill) -> bool {
        match skill {
            Skill::MoveX => self.can_move_x,
            Skill::MoveZ => self.can_move_z,
            Skill::Shoot => self.can_shoot,
            Skill::Jump => self.can_jump,
        }
    }

    /// Permanently clear a flag. Returns false if it was already cleared.
    /// Flags are never set back during a game.
    pub fn clear(&mut self, skill: Skill) -> bool {
        let flag = match skill {
            Skill::MoveX => &mut self.can_move_x,
            Skill::MoveZ => &mut self.can_move_z,
            Skill::Shoot => &mut self.can_shoot,
            Skill::Jump => &mut self.can_jump,
        };
        std::mem::replace(flag, false)
    }

    /// Flags that are still set, in a stable order
    pub fn available(&self) -> Vec<Skill> {
        Skill::ALL.into_iter().filter(|s| self.has(*s)).collect()
    }
}

/// Charge enemy duty cycle state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeState {
    /// True while winding up, false while cooling down
    pub charging: bool,
    /// Unbounded below; the lunge triggers at the configured threshold
    pub percentage: f32,
    /// Last direction toward the player, used for the lunge
    pub facing: Vec3,
}

impl Default for ChargeState {
    fn default() -> Self {
        Self {
            charging: true,
            percentage: 0.0,
            facing: Vec3::X,
        }
    }
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Agent was already dead; nothing changed
    Ignored,
    /// Agent survived with this much health
    Damaged { remaining: f32 },
    /// This hit killed the agent. Reported exactly once per agent.
    Killed,
}

/// A simulated agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub handle: AgentHandle,
    pub max_health: f32,
    pub current_health: f32,
    pub movement_speed: f32,
    /// Mirror of the presentation layer's position
    pub position: Vec3,
    pub alive: bool,
    /// Only meaningful for the player; enemies carry `Skills::NONE`
    pub skills: Skills,
    /// Only meaningful for charge enemies
    pub charge: ChargeState,
    /// Set while the hit flash is showing
    #[serde(default)]
    pub hit_flash: bool,
}

impl Agent {
    /// A fresh player with every skill
    pub fn player(id: AgentId, handle: AgentHandle, position: Vec3, stats: &AgentStartStats) -> Self {
        Self {
            id,
            kind: AgentKind::Player,
            handle,
            max_health: stats.start_health,
            current_health: stats.start_health,
            movement_speed: stats.start_speed,
            position,
            alive: true,
            skills: Skills::ALL,
            charge: ChargeState::default(),
            hit_flash: false,
        }
    }

    /// An enemy with health scaled by `level_modifier`, applied once here
    pub fn enemy(
        id: AgentId,
        kind: AgentKind,
        handle: AgentHandle,
        position: Vec3,
        stats: &AgentStartStats,
        level_modifier: f32,
    ) -> Self {
        let health = stats.start_health * level_modifier;
        Self {
            id,
            kind,
            handle,
            max_health: health,
            current_health: health,
            movement_speed: stats.start_speed,
            position,
            alive: true,
            skills: Skills::NONE,
            charge: ChargeState::default(),
            hit_flash: false,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == AgentKind::Player
    }

    /// Apply damage. Lethal damage zeroes health and kills the agent once;
    /// a dead agent ignores further hits.
    pub fn get_hit(&mut self, damage: f32) -> HitOutcome {
        if !self.alive {
            return HitOutcome::Ignored;
        }

        let damage = if !damage.is_finite() || damage < 0.0 {
            log::warn!("Agent {:?} got invalid damage {}, treating as 0", self.id, damage);
            0.0
        } else {
            damage
        };

        if self.current_health - damage <= 0.0 {
            self.current_health = 0.0;
            self.alive = false;
            HitOutcome::Killed
        } else {
            self.current_health -= damage;
            HitOutcome::Damaged {
                remaining: self.current_health,
            }
        }
    }

    /// Ring-out check: leaving the vertical band is lethal
    pub fn check_fallen(&mut self, y: f32, bounds: &FallBounds) -> HitOutcome {
        if !self.alive || !bounds.is_out(y) {
            return HitOutcome::Ignored;
        }
        log::info!("{:?} {:?} left the arena at y={:.2}", self.kind, self.id, y);
        self.current_health = 0.0;
        self.alive = false;
        HitOutcome::Killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grunt() -> Agent {
        Agent::enemy(
            AgentId(1),
            AgentKind::Enemy,
            AgentHandle(1),
            Vec3::ZERO,
            &AgentStartStats::new(10.0, 2.0),
            1.0,
        )
    }

    #[test]
    fn test_get_hit_damages() {
        let mut agent = grunt();
        assert_eq!(agent.get_hit(3.0), HitOutcome::Damaged { remaining: 7.0 });
        assert!(agent.alive);
    }

    #[test]
    fn test_exact_lethal_hit_kills() {
        let mut agent = grunt();
        assert_eq!(agent.get_hit(10.0), HitOutcome::Killed);
        assert!(!agent.alive);
        assert_eq!(agent.current_health, 0.0);
    }

    #[test]
    fn test_dead_agent_ignores_hits() {
        let mut agent = grunt();
        agent.get_hit(50.0);
        assert_eq!(agent.get_hit(1.0), HitOutcome::Ignored);
        assert_eq!(agent.current_health, 0.0);
    }

    #[test]
    fn test_negative_damage_is_zero() {
        let mut agent = grunt();
        assert_eq!(agent.get_hit(-5.0), HitOutcome::Damaged { remaining: 10.0 });
    }

    #[test]
    fn test_non_finite_damage_is_zero() {
        let mut agent = grunt();
        for damage in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(agent.get_hit(damage), HitOutcome::Damaged { remaining: 10.0 });
        }
        assert!(agent.alive);

        assert_eq!(agent.check_fallen(-5.0, &FallBounds::default()), HitOutcome::Killed);
        assert!(!agent.alive);
        assert_eq!(agent.current_health, 0.0);
    }

    #[test]
    fn test_ring_out_kills_whatever_the_health() {
        let mut agent = grunt();
        agent.current_health = f32::NAN;
        assert_eq!(agent.check_fallen(30.0, &FallBounds::default()), HitOutcome::Killed);
        assert!(!agent.alive);
        assert_eq!(agent.current_health, 0.0);
        assert_eq!(agent.check_fallen(30.0, &FallBounds::default()), HitOutcome::Ignored);
    }

    #[test]
    fn test_level_modifier_applied_at_spawn() {
        let stats = AgentStartStats::new(10.0, 1.0);
        let agent = Agent::enemy(
            AgentId(2),
            AgentKind::ChargeEnemy,
            AgentHandle(2),
            Vec3::ZERO,
            &stats,
            crate::level_modifier(2),
        );
        assert!((agent.max_health - 34.0).abs() < 1e-4);
        assert_eq!(agent.max_health, agent.current_health);
        assert_eq!(agent.skills, Skills::NONE);
    }

    #[test]
    fn test_check_fallen() {
        let bounds = FallBounds::default();
        let mut agent = grunt();
        assert_eq!(agent.check_fallen(0.5, &bounds), HitOutcome::Ignored);
        assert_eq!(agent.check_fallen(-0.01, &bounds), HitOutcome::Killed);
        assert!(!agent.alive);

        let mut escaped = grunt();
        assert_eq!(escaped.check_fallen(25.0, &bounds), HitOutcome::Killed);
    }

    #[test]
    fn test_skills_clear_is_permanent() {
        let mut skills = Skills::ALL;
        assert!(skills.clear(Skill::Jump));
        assert!(!skills.clear(Skill::Jump));
        assert!(!skills.has(Skill::Jump));
        assert_eq!(
            skills.available(),
            vec![Skill::MoveX, Skill::MoveZ, Skill::Shoot]
        );
    }

    proptest! {
        #[test]
        fn health_never_increases(hits in proptest::collection::vec(-5.0f32..20.0, 0..30)) {
            let mut agent = grunt();
            let mut last = agent.current_health;
            let mut kills = 0;
            for damage in hits {
                if agent.get_hit(damage) == HitOutcome::Killed {
                    kills += 1;
                }
                prop_assert!(agent.current_health <= last);
                prop_assert!(agent.current_health >= 0.0);
                prop_assert_eq!(agent.current_health == 0.0, !agent.alive);
                last = agent.current_health;
            }
            prop_assert!(kills <= 1);
        }
    }
}
