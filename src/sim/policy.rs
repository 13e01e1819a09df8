//! Movement policies
//!
//! Each tick every live agent turns its state plus the world view into an
//! [`Intent`]. Policies never touch the world or other agents; the round
//! controller executes the intent afterwards.

use glam::Vec3;

use super::agent::{Agent, AgentKind};
use super::tick::TickInput;
use super::world::World;
use crate::consts::GROUND_TOLERANCE;
use crate::planar;
use crate::settings::{ChargeSettings, CombatSettings};

/// Request to fire the player's attack ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub origin: Vec3,
    /// Unit aim direction on the ground plane
    pub direction: Vec3,
}

/// What an agent wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// Kinematic move target
    pub move_to: Option<Vec3>,
    /// Direction to turn toward
    pub facing: Option<Vec3>,
    /// Impulse to apply (jump, lunge)
    pub impulse: Option<Vec3>,
    pub attack: Option<AttackIntent>,
}

impl Intent {
    pub fn is_idle(&self) -> bool {
        *self == Intent::default()
    }
}

/// Shared read-only view the policies need
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext {
    pub player_position: Option<Vec3>,
    pub combat: CombatSettings,
    pub charge: ChargeSettings,
    pub dt: f32,
}

/// Dispatch on agent kind
pub fn intent_for<W: World + ?Sized>(
    agent: &mut Agent,
    input: &TickInput,
    ctx: &PolicyContext,
    world: &W,
) -> Intent {
    if !agent.alive {
        return Intent::default();
    }
    match agent.kind {
        AgentKind::Player => player_intent(agent, input, &ctx.combat, world, ctx.dt),
        AgentKind::Enemy => match ctx.player_position {
            Some(target) => pursuit_intent(agent, target, ctx.dt),
            None => Intent::default(),
        },
        AgentKind::ChargeEnemy => match ctx.player_position {
            Some(target) => charge_intent(agent, target, &ctx.charge, ctx.dt),
            None => Intent::default(),
        },
    }
}

/// Player: two gated axes, edge-triggered jump, held fire
pub fn player_intent<W: World + ?Sized>(
    agent: &Agent,
    input: &TickInput,
    combat: &CombatSettings,
    world: &W,
    dt: f32,
) -> Intent {
    let skills = agent.skills;
    let mut intent = Intent::default();

    let x = if skills.can_move_x { input.axis_x } else { 0.0 };
    let z = if skills.can_move_z { input.axis_z } else { 0.0 };
    let step = Vec3::new(x, 0.0, z).normalize_or_zero() * agent.movement_speed * dt;
    if step != Vec3::ZERO {
        intent.move_to = Some(agent.position + step);
    }

    // Grounded check stops mid-air and double jumps
    if input.jump && skills.can_jump && agent.position.y <= GROUND_TOLERANCE {
        intent.impulse = Some(Vec3::Y * combat.jump_impulse);
    }

    if input.fire && skills.can_shoot {
        let aim_point = input
            .cursor
            .and_then(|cursor| world.screen_ray_onto_ground_plane(cursor));
        if let Some(point) = aim_point {
            let direction = planar(point - agent.position).normalize_or_zero();
            if direction != Vec3::ZERO {
                intent.attack = Some(AttackIntent {
                    origin: agent.position,
                    direction,
                });
            }
        }
    }

    intent
}

/// Pursuit: straight at the player, recomputed every tick
pub fn pursuit_intent(agent: &Agent, player_position: Vec3, dt: f32) -> Intent {
    let dir = (player_position - agent.position).normalize_or_zero();
    if dir == Vec3::ZERO {
        return Intent::default();
    }
    Intent {
        move_to: Some(agent.position + dir * agent.movement_speed * dt),
        facing: Some(dir),
        ..Default::default()
    }
}

/// Charge: wind up while facing the player, lunge at the threshold, cool down
pub fn charge_intent(
    agent: &mut Agent,
    player_position: Vec3,
    settings: &ChargeSettings,
    dt: f32,
) -> Intent {
    let mut intent = Intent::default();
    let state = &mut agent.charge;

    if state.charging {
        state.percentage += settings.rate * dt;

        let to_player = planar(player_position - agent.position).normalize_or_zero();
        if to_player != Vec3::ZERO {
            state.facing = to_player;
        }
        intent.facing = Some(state.facing);

        if state.percentage >= settings.threshold {
            intent.impulse = Some(state.facing * settings.lunge_impulse);
            state.charging = false;
            log::debug!("Charge enemy {:?} lunges", agent.id);
        }
    } else {
        state.percentage -= settings.rate * dt;
        if state.percentage <= 0.0 {
            state.charging = true;
        }
    }

    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SPAWN_HEIGHT;
    use crate::settings::AgentStartStats;
    use crate::sim::agent::{AgentId, Skill};
    use crate::sim::headless::HeadlessWorld;
    use crate::sim::world::AgentHandle;
    use glam::Vec2;

    fn player_at(position: Vec3) -> Agent {
        Agent::player(
            AgentId(1),
            AgentHandle(1),
            position,
            &AgentStartStats::new(10.0, 5.0),
        )
    }

    fn enemy_at(kind: AgentKind, position: Vec3) -> Agent {
        Agent::enemy(
            AgentId(2),
            kind,
            AgentHandle(2),
            position,
            &AgentStartStats::new(3.0, 2.0),
            1.0,
        )
    }

    #[test]
    fn test_player_diagonal_is_normalized() {
        let world = HeadlessWorld::new(10.0);
        let player = player_at(Vec3::new(0.0, SPAWN_HEIGHT, 0.0));
        let input = TickInput {
            axis_x: 1.0,
            axis_z: 1.0,
            ..Default::default()
        };
        let intent = player_intent(&player, &input, &CombatSettings::default(), &world, 0.1);
        let step = intent.move_to.unwrap() - player.position;
        assert!((step.length() - 0.5).abs() < 1e-5);
        assert!((step.x - step.z).abs() < 1e-6);
    }

    #[test]
    fn test_player_axis_gated_by_skill() {
        let world = HeadlessWorld::new(10.0);
        let mut player = player_at(Vec3::new(0.0, SPAWN_HEIGHT, 0.0));
        player.skills.clear(Skill::MoveX);
        let input = TickInput {
            axis_x: 1.0,
            ..Default::default()
        };
        let intent = player_intent(&player, &input, &CombatSettings::default(), &world, 0.1);
        assert!(intent.move_to.is_none());

        let input = TickInput {
            axis_x: 1.0,
            axis_z: -1.0,
            ..Default::default()
        };
        let intent = player_intent(&player, &input, &CombatSettings::default(), &world, 0.1);
        let step = intent.move_to.unwrap() - player.position;
        assert_eq!(step.x, 0.0);
        assert!((step.z + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let world = HeadlessWorld::new(10.0);
        let combat = CombatSettings::default();
        let input = TickInput {
            jump: true,
            ..Default::default()
        };

        let grounded = player_at(Vec3::new(0.0, 0.5, 0.0));
        let intent = player_intent(&grounded, &input, &combat, &world, 0.1);
        assert_eq!(intent.impulse, Some(Vec3::Y * combat.jump_impulse));

        let airborne = player_at(Vec3::new(0.0, 0.52, 0.0));
        let intent = player_intent(&airborne, &input, &combat, &world, 0.1);
        assert!(intent.impulse.is_none());

        let mut grounded_no_skill = grounded.clone();
        grounded_no_skill.skills.clear(Skill::Jump);
        let intent = player_intent(&grounded_no_skill, &input, &combat, &world, 0.1);
        assert!(intent.impulse.is_none());
    }

    #[test]
    fn test_fire_aims_at_cursor() {
        let world = HeadlessWorld::new(10.0);
        let player = player_at(Vec3::new(1.0, SPAWN_HEIGHT, 1.0));
        let input = TickInput {
            fire: true,
            cursor: Some(Vec2::new(1.0, 5.0)),
            ..Default::default()
        };
        let intent = player_intent(&player, &input, &CombatSettings::default(), &world, 0.1);
        let attack = intent.attack.unwrap();
        assert!((attack.direction - Vec3::Z).length() < 1e-5);
        assert_eq!(attack.origin, player.position);

        let mut disarmed = player.clone();
        disarmed.skills.clear(Skill::Shoot);
        let intent = player_intent(&disarmed, &input, &CombatSettings::default(), &world, 0.1);
        assert!(intent.attack.is_none());
    }

    #[test]
    fn test_pursuit_heads_for_player() {
        let enemy = enemy_at(AgentKind::Enemy, Vec3::new(4.0, 0.5, 0.0));
        let intent = pursuit_intent(&enemy, Vec3::new(0.0, 0.5, 0.0), 0.5);
        let target = intent.move_to.unwrap();
        assert!((target - Vec3::new(3.0, 0.5, 0.0)).length() < 1e-5);

        let on_top = pursuit_intent(&enemy, enemy.position, 0.5);
        assert!(on_top.is_idle());
    }

    #[test]
    fn test_charge_lunges_on_fifth_second() {
        let settings = ChargeSettings::default();
        let mut enemy = enemy_at(AgentKind::ChargeEnemy, Vec3::new(5.0, 0.5, 0.0));
        let player = Vec3::new(0.0, 0.5, 0.0);

        for _ in 0..4 {
            let intent = charge_intent(&mut enemy, player, &settings, 1.0);
            assert!(intent.impulse.is_none());
            assert!(enemy.charge.charging);
        }
        let intent = charge_intent(&mut enemy, player, &settings, 1.0);
        assert_eq!(enemy.charge.percentage, 100.0);
        assert!(!enemy.charge.charging);
        let impulse = intent.impulse.unwrap();
        assert!((impulse - Vec3::new(-30.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_charge_cools_down_then_recharges() {
        let settings = ChargeSettings::default();
        let mut enemy = enemy_at(AgentKind::ChargeEnemy, Vec3::new(5.0, 0.5, 0.0));
        enemy.charge.charging = false;
        enemy.charge.percentage = 30.0;
        let player = Vec3::ZERO;

        let intent = charge_intent(&mut enemy, player, &settings, 1.0);
        assert!(intent.is_idle());
        assert!(!enemy.charge.charging);

        charge_intent(&mut enemy, player, &settings, 1.0);
        assert!((enemy.charge.percentage + 10.0).abs() < 1e-5);
        assert!(enemy.charge.charging);
    }

    #[test]
    fn test_dead_agents_do_nothing() {
        let world = HeadlessWorld::new(10.0);
        let mut enemy = enemy_at(AgentKind::Enemy, Vec3::new(4.0, 0.5, 0.0));
        enemy.get_hit(100.0);
        let ctx = PolicyContext {
            player_position: Some(Vec3::ZERO),
            combat: CombatSettings::default(),
            charge: ChargeSettings::default(),
            dt: 0.1,
        };
        let intent = intent_for(&mut enemy, &TickInput::default(), &ctx, &world);
        assert!(intent.is_idle());
    }
}
