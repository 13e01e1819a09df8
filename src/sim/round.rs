//! Round controller
//!
//! Owns the game state and is the only component that changes the phase:
//!
//! ```text
//! Menu -> Playing <-> BetweenRound -> Playing
//!            |             |
//!            +--> GameOver <+--> Menu
//! ```
//!
//! The per-tick body lives in [`super::tick`].

use glam::Vec3;
use thiserror::Error;

use super::agent::{Agent, AgentId, AgentKind, HitOutcome, Skill};
use super::combat::{CombatResolver, Resolution};
use super::director::{DirectorSignal, WaveDirector};
use super::scheduler::{Scheduler, Task};
use super::state::{GameEvent, GamePhase, GameState};
use super::world::World;
use crate::consts::SPAWN_HEIGHT;
use crate::settings::{Settings, SettingsError};

/// Rejected UI commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("`{command}` is not allowed during {phase:?}")]
    WrongPhase {
        command: &'static str,
        phase: GamePhase,
    },
    #[error("skill {0:?} has already been removed")]
    SkillUnavailable(Skill),
    #[error("no player in the current game")]
    NoPlayer,
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Counters for the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub phase: GamePhase,
    /// 0-based level index
    pub level: usize,
    pub level_count: usize,
    /// Waves started this game
    pub round: u32,
    pub enemies_remaining: usize,
    pub player_health: f32,
    pub player_max_health: f32,
    pub skills: Vec<Skill>,
}

impl Hud {
    /// One-line summary, e.g. for a text HUD or logs
    pub fn text(&self) -> String {
        format!(
            "Level {}/{} | Round {} | Enemies {} | HP {:.1}/{:.1}",
            self.level + 1,
            self.level_count,
            self.round,
            self.enemies_remaining,
            self.player_health,
            self.player_max_health
        )
    }
}

/// Top-level state machine driving the simulation
#[derive(Debug)]
pub struct RoundController {
    pub(super) settings: Settings,
    pub(super) state: GameState,
    pub(super) director: WaveDirector,
    pub(super) combat: CombatResolver,
    pub(super) scheduler: Scheduler,
    pub(super) events: Vec<GameEvent>,
}

impl RoundController {
    /// Validate settings up front; an invalid level table never reaches play
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            state: GameState::default(),
            director: WaveDirector::new(),
            combat: CombatResolver::new(),
            scheduler: Scheduler::new(),
            events: Vec::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn player(&self) -> Option<&Agent> {
        self.state.player.as_ref()
    }

    /// Take every notification raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> Hud {
        let (player_health, player_max_health, skills) = match &self.state.player {
            Some(p) => (p.current_health, p.max_health, p.skills.available()),
            None => (0.0, 0.0, Vec::new()),
        };
        Hud {
            phase: self.state.phase,
            level: self.state.current_level,
            level_count: self.settings.levels.len(),
            round: self.state.round,
            enemies_remaining: self.state.enemies_remaining(),
            player_health,
            player_max_health,
            skills,
        }
    }

    /// Start a fresh game at level 0 with a full-skilled player
    pub fn start_game<W: World + ?Sized>(&mut self, world: &mut W) -> Result<(), CommandError> {
        match self.state.phase {
            GamePhase::Menu | GamePhase::GameOver => {}
            phase => {
                return Err(CommandError::WrongPhase {
                    command: "start_game",
                    phase,
                });
            }
        }

        self.clear_roster(world);
        self.scheduler.clear();
        self.state = GameState::default();

        self.director
            .start_level(0, &self.settings, &mut self.state, world)?;

        let center = Vec3::new(0.0, SPAWN_HEIGHT, 0.0);
        let handle = world.spawn_agent(AgentKind::Player, center, &self.settings.player);
        let id = self.state.next_agent_id();
        self.state.player = Some(Agent::player(id, handle, center, &self.settings.player));

        log::info!("New game started");
        self.enter_playing();
        Ok(())
    }

    /// Give up one skill; the next wave spawns immediately
    pub fn choose_skill_to_remove<W: World + ?Sized>(
        &mut self,
        skill: Skill,
        world: &mut W,
    ) -> Result<(), CommandError> {
        if self.state.phase != GamePhase::BetweenRound {
            return Err(CommandError::WrongPhase {
                command: "choose_skill_to_remove",
                phase: self.state.phase,
            });
        }
        let player = self.state.player.as_mut().ok_or(CommandError::NoPlayer)?;
        if !player.skills.clear(skill) {
            return Err(CommandError::SkillUnavailable(skill));
        }

        log::info!("Player gave up {}", skill.as_str());
        self.events.push(GameEvent::SkillRemoved { skill });
        self.resume_round(world)
    }

    fn resume_round<W: World + ?Sized>(&mut self, world: &mut W) -> Result<(), CommandError> {
        let level = self.state.current_level;
        self.director
            .start_level(level, &self.settings, &mut self.state, world)?;
        self.enter_playing();
        Ok(())
    }

    fn enter_playing(&mut self) {
        self.state.phase = GamePhase::Playing;
        self.state.round += 1;
        self.scheduler.cancel(|t| *t == Task::FallenCheck);
        self.scheduler
            .schedule(self.settings.timers.fallen_check_interval, Task::FallenCheck);
        self.events.push(GameEvent::LevelStarted {
            level: self.state.current_level,
            enemies: self.state.enemies.len(),
        });
    }

    fn leave_playing(&mut self, phase: GamePhase) {
        self.state.phase = phase;
        self.scheduler.cancel(|t| *t == Task::FallenCheck);
    }

    fn enter_between_round<W: World + ?Sized>(&mut self, next_level: usize, world: &mut W) {
        self.leave_playing(GamePhase::BetweenRound);
        self.events.push(GameEvent::LevelTransition { level: next_level });

        let available = match self.state.player.as_mut() {
            Some(player) => {
                let center = Vec3::new(0.0, SPAWN_HEIGHT, 0.0);
                world.move_agent(player.handle, center);
                player.position = center;
                player.skills.available()
            }
            None => Vec::new(),
        };

        if available.is_empty() {
            log::info!("No skills left to give up, resuming");
            if let Err(err) = self.resume_round(world) {
                log::error!("Could not start level {}: {}", next_level, err);
                self.game_over(false, world);
            }
            return;
        }

        self.events.push(GameEvent::SkillChoiceRequired { available });
    }

    pub(super) fn game_over<W: World + ?Sized>(&mut self, won: bool, world: &mut W) {
        log::info!(
            "Game over ({}) at level {}",
            if won { "won" } else { "lost" },
            self.state.current_level
        );
        self.leave_playing(GamePhase::GameOver);
        for enemy in self.state.enemies.drain(..) {
            world.destroy_agent(enemy.handle, 0.0);
        }
        self.events.push(GameEvent::GameOver { won });
    }

    fn clear_roster<W: World + ?Sized>(&mut self, world: &mut W) {
        if let Some(player) = self.state.player.take() {
            world.destroy_agent(player.handle, 0.0);
        }
        for enemy in self.state.enemies.drain(..) {
            world.destroy_agent(enemy.handle, 0.0);
        }
    }

    /// Follow-up for a hit that landed
    pub(super) fn apply_resolution<W: World + ?Sized>(
        &mut self,
        resolution: Resolution,
        world: &mut W,
    ) {
        match resolution.outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Damaged { remaining } => {
                self.flash(resolution.target);
                self.events.push(GameEvent::AgentDamaged {
                    id: resolution.target,
                    health: remaining,
                });
            }
            HitOutcome::Killed => self.on_killed(resolution.target, world),
        }
    }

    fn flash(&mut self, id: AgentId) {
        if let Some(agent) = self.state.agent_mut(id) {
            agent.hit_flash = true;
            let task = Task::ClearHitFlash(id);
            self.scheduler.cancel(|t| *t == task);
            self.scheduler.schedule(self.settings.timers.hit_flash, task);
        }
    }

    /// Death side effects, then let the director decide what it means
    pub(super) fn on_killed<W: World + ?Sized>(&mut self, id: AgentId, world: &mut W) {
        let Some(agent) = self.state.agent_mut(id) else {
            return;
        };
        agent.hit_flash = false;
        let (kind, handle) = (agent.kind, agent.handle);

        self.scheduler.cancel(|t| *t == Task::ClearHitFlash(id));
        world.destroy_agent(handle, self.settings.timers.death_grace);
        self.events.push(GameEvent::AgentDied { id, kind });

        if self.state.phase != GamePhase::Playing {
            return;
        }

        match self
            .director
            .on_agent_died(id, &self.settings, &mut self.state)
        {
            DirectorSignal::RoundLost => self.game_over(false, world),
            DirectorSignal::LevelComplete { next_level } => {
                self.enter_between_round(next_level, world)
            }
            DirectorSignal::GameWon => self.game_over(true, world),
            DirectorSignal::EnemyRemoved { remaining } => {
                log::debug!("{} enemies remaining", remaining);
            }
            DirectorSignal::Ignored => {}
        }
    }
}
