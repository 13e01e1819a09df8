//! Wave and level director
//!
//! Spawns each level's roster on a ring inside the platform edge, and decides
//! what an agent's death means for the round.

use super::agent::{Agent, AgentId};
use super::state::GameState;
use super::world::World;
use crate::consts::{SPAWN_EDGE_INSET, SPAWN_HEIGHT};
use crate::settings::{AgentStartStats, Settings, SettingsError};
use crate::{level_modifier, ring_position};

/// What a death means for the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorSignal {
    /// The player died
    RoundLost,
    /// An enemy died and others remain
    EnemyRemoved { remaining: usize },
    /// The roster emptied and `current_level` advanced to `next_level`
    LevelComplete { next_level: usize },
    /// The roster emptied on the final level
    GameWon,
    /// Unknown or already-removed agent
    Ignored,
}

/// Level bookkeeping on top of [`GameState`]
#[derive(Debug, Default)]
pub struct WaveDirector;

impl WaveDirector {
    pub fn new() -> Self {
        Self
    }

    /// Spawn every wave entry of level `index`. Returns the number spawned.
    pub fn start_level<W: World + ?Sized>(
        &self,
        index: usize,
        settings: &Settings,
        state: &mut GameState,
        world: &mut W,
    ) -> Result<usize, SettingsError> {
        let level = settings.level(index)?;
        level.validate(index)?;

        state.current_level = index;
        state.map_size = level.map_size;
        world.prepare_level(level.map_size);

        let modifier = level_modifier(index);
        let radius = level.map_size - SPAWN_EDGE_INSET;
        let mut slot = 0usize;

        for entry in &level.wave {
            let scaled = AgentStartStats::new(entry.stats.start_health * modifier, entry.stats.start_speed);
            for _ in 0..entry.count {
                let theta = slot as f32 * settings.spawn_angle_step;
                let position = ring_position(radius, theta, SPAWN_HEIGHT);
                let handle = world.spawn_agent(entry.enemy, position, &scaled);
                let id = state.next_agent_id();
                state.enemies.push(Agent::enemy(
                    id,
                    entry.enemy,
                    handle,
                    position,
                    &entry.stats,
                    modifier,
                ));
                slot += 1;
            }
        }

        log::info!(
            "Level {} started: map size {}, {} enemies, modifier {:.2}",
            index,
            level.map_size,
            slot,
            modifier
        );
        Ok(slot)
    }

    /// Handle a death reported while playing
    pub fn on_agent_died(
        &self,
        id: AgentId,
        settings: &Settings,
        state: &mut GameState,
    ) -> DirectorSignal {
        if state.player.as_ref().is_some_and(|p| p.id == id) {
            return DirectorSignal::RoundLost;
        }

        let before = state.enemies.len();
        state.enemies.retain(|e| e.id != id);
        if state.enemies.len() == before {
            log::debug!("Death of unknown agent {:?} ignored", id);
            return DirectorSignal::Ignored;
        }

        let remaining = state.enemies.len();
        if remaining > 0 {
            return DirectorSignal::EnemyRemoved { remaining };
        }

        if state.current_level < settings.last_level() {
            state.current_level += 1;
            log::info!("Level complete, advancing to {}", state.current_level);
            DirectorSignal::LevelComplete {
                next_level: state.current_level,
            }
        } else {
            log::info!("Final level complete");
            DirectorSignal::GameWon
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LevelSettings, WaveEntry};
    use crate::sim::agent::AgentKind;
    use crate::sim::headless::HeadlessWorld;
    use glam::Vec3;
    use proptest::prelude::*;

    fn one_level(count: u32) -> Settings {
        Settings {
            levels: vec![LevelSettings {
                map_size: 6.0,
                wave: vec![WaveEntry {
                    enemy: AgentKind::Enemy,
                    count,
                    stats: AgentStartStats::new(10.0, 1.0),
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_spawns_on_ring() {
        let settings = one_level(3);
        let mut state = GameState::default();
        let mut world = HeadlessWorld::new(1.0);
        let spawned = WaveDirector::new()
            .start_level(0, &settings, &mut state, &mut world)
            .unwrap();
        assert_eq!(spawned, 3);
        assert_eq!(world.platform_radius(), 6.0);

        for (i, enemy) in state.enemies.iter().enumerate() {
            let planar = Vec3::new(enemy.position.x, 0.0, enemy.position.z);
            assert!((planar.length() - 5.0).abs() < 1e-4);
            let expected = ring_position(5.0, i as f32 * settings.spawn_angle_step, SPAWN_HEIGHT);
            assert!((enemy.position - expected).length() < 1e-4);
            assert_eq!(world.position(enemy.handle), Some(enemy.position));
        }
    }

    #[test]
    fn test_eleventh_spawn_reuses_first_slot() {
        let settings = one_level(11);
        let mut state = GameState::default();
        let mut world = HeadlessWorld::new(6.0);
        WaveDirector::new()
            .start_level(0, &settings, &mut state, &mut world)
            .unwrap();
        let first = state.enemies[0].position;
        let eleventh = state.enemies[10].position;
        assert!((first - eleventh).length() < 1e-3);
    }

    #[test]
    fn test_invalid_level_fails_fast() {
        let mut settings = one_level(2);
        settings.levels[0].map_size = -3.0;
        let mut state = GameState::default();
        let mut world = HeadlessWorld::new(6.0);
        let director = WaveDirector::new();
        assert!(matches!(
            director.start_level(0, &settings, &mut state, &mut world),
            Err(SettingsError::NonPositiveMapSize { .. })
        ));
        assert!(matches!(
            director.start_level(4, &settings, &mut state, &mut world),
            Err(SettingsError::LevelOutOfRange { .. })
        ));
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_deaths_drive_level_completion() {
        let mut settings = one_level(2);
        settings.levels.push(settings.levels[0].clone());
        let mut state = GameState::default();
        let mut world = HeadlessWorld::new(6.0);
        let director = WaveDirector::new();
        director
            .start_level(0, &settings, &mut state, &mut world)
            .unwrap();

        let a = state.enemies[0].id;
        let b = state.enemies[1].id;
        assert_eq!(
            director.on_agent_died(a, &settings, &mut state),
            DirectorSignal::EnemyRemoved { remaining: 1 }
        );
        assert_eq!(
            director.on_agent_died(a, &settings, &mut state),
            DirectorSignal::Ignored
        );
        assert_eq!(
            director.on_agent_died(b, &settings, &mut state),
            DirectorSignal::LevelComplete { next_level: 1 }
        );
        assert_eq!(state.current_level, 1);

        director
            .start_level(1, &settings, &mut state, &mut world)
            .unwrap();
        let ids: Vec<_> = state.enemies.iter().map(|e| e.id).collect();
        let mut last = DirectorSignal::Ignored;
        for id in ids {
            last = director.on_agent_died(id, &settings, &mut state);
        }
        assert_eq!(last, DirectorSignal::GameWon);
    }

    proptest! {
        #[test]
        fn spawn_health_scales_once(level in 0usize..5, health in 0.5f32..50.0) {
            let mut settings = Settings::default();
            for lvl in &mut settings.levels {
                for entry in &mut lvl.wave {
                    entry.stats.start_health = health;
                }
            }
            let mut state = GameState::default();
            let mut world = HeadlessWorld::new(10.0);
            WaveDirector::new().start_level(level, &settings, &mut state, &mut world).unwrap();

            let expected = health * (1.0 + level as f32 * 1.2);
            for enemy in &state.enemies {
                prop_assert!((enemy.max_health - expected).abs() <= expected * 1e-5);
                prop_assert_eq!(enemy.max_health, enemy.current_health);
            }

            // Advancing the level index later does not rescale anyone
            state.current_level += 1;
            for enemy in &state.enemies {
                prop_assert!((enemy.max_health - expected).abs() <= expected * 1e-5);
            }
        }
    }
}
