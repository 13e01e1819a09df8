//! Fixed-order simulation tick
//!
//! One tick per frame: timers, then the player's move and attack, then each
//! enemy in roster order, then hits reported by the physics layer.

use glam::Vec2;

use super::agent::{Agent, HitOutcome};
use super::combat::HitEvent;
use super::policy::{Intent, PolicyContext, intent_for};
use super::round::RoundController;
use super::scheduler::Task;
use super::state::{GameEvent, GamePhase};
use super::world::World;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement axis, -1..=1
    pub axis_x: f32,
    /// Vertical (depth) movement axis, -1..=1
    pub axis_z: f32,
    /// Fire button held
    pub fire: bool,
    /// Jump pressed this frame (edge)
    pub jump: bool,
    /// Escape/quit pressed this frame (edge)
    pub quit: bool,
    /// Cursor in screen space, if over the viewport
    pub cursor: Option<Vec2>,
    /// Hits reported by the physics layer since the last tick
    pub hits: Vec<HitEvent>,
}

impl TickInput {
    /// Clear edge-triggered inputs after they have been consumed
    pub fn clear_edges(&mut self) {
        self.jump = false;
        self.quit = false;
        self.hits.clear();
    }
}

impl RoundController {
    /// Advance the game by one frame of `dt` simulated seconds
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W, input: &TickInput, dt: f32) {
        let entered = self.state.phase;
        self.scheduler.advance(dt);
        for task in self.scheduler.take_due() {
            self.run_task(task, world);
        }

        match self.state.phase {
            GamePhase::Menu => {
                if input.quit {
                    self.events.push(GameEvent::QuitRequested);
                }
            }
            // A game that ended during this tick's timers holds for one tick
            GamePhase::GameOver if entered == GamePhase::GameOver => {
                log::info!("Returning to menu");
                self.state.phase = GamePhase::Menu;
            }
            GamePhase::GameOver => {}
            // Paused: only the quit edge is honoured
            GamePhase::BetweenRound => {
                if input.quit {
                    self.game_over(false, world);
                }
            }
            GamePhase::Playing => {
                if input.quit {
                    self.game_over(false, world);
                    return;
                }
                self.step_playing(world, input, dt);
            }
        }
    }

    fn run_task<W: World + ?Sized>(&mut self, task: Task, world: &mut W) {
        match task {
            Task::ClearHitFlash(id) => {
                if let Some(agent) = self.state.agent_mut(id) {
                    agent.hit_flash = false;
                }
            }
            Task::FallenCheck => {
                if self.state.phase != GamePhase::Playing {
                    return;
                }
                self.check_fallen(world);
                if self.state.phase == GamePhase::Playing {
                    self.scheduler
                        .schedule(self.settings.timers.fallen_check_interval, Task::FallenCheck);
                }
            }
        }
    }

    /// Ring-out poll over every live agent, player first
    fn check_fallen<W: World + ?Sized>(&mut self, world: &mut W) {
        let bounds = self.settings.fall_bounds;
        let mut fallen = Vec::new();
        for agent in self
            .state
            .player
            .iter_mut()
            .chain(self.state.enemies.iter_mut())
        {
            if !agent.alive {
                continue;
            }
            let y = world.position(agent.handle).map_or(agent.position.y, |p| p.y);
            if agent.check_fallen(y, &bounds) == HitOutcome::Killed {
                fallen.push(agent.id);
            }
        }
        for id in fallen {
            if self.state.phase != GamePhase::Playing {
                break;
            }
            self.on_killed(id, world);
        }
    }

    /// Refresh mirrored positions from the presentation layer
    fn sync_positions<W: World + ?Sized>(&mut self, world: &W) {
        for agent in self
            .state
            .player
            .iter_mut()
            .chain(self.state.enemies.iter_mut())
            .filter(|a| a.alive)
        {
            match world.position(agent.handle) {
                Some(position) => agent.position = position,
                None => log::warn!("No body for live agent {:?}", agent.id),
            }
        }
    }

    fn step_playing<W: World + ?Sized>(&mut self, world: &mut W, input: &TickInput, dt: f32) {
        self.combat.begin_tick();
        self.sync_positions(&*world);

        let mut ctx = PolicyContext {
            player_position: None,
            combat: self.settings.combat,
            charge: self.settings.charge,
            dt,
        };

        // Player first
        let attack = match self.state.player.as_mut() {
            Some(player) if player.alive => {
                let intent = intent_for(player, input, &ctx, &*world);
                execute(player, &intent, world);
                intent.attack
            }
            _ => None,
        };
        if let Some(attack) = attack {
            let combat = self.settings.combat;
            if let Some(res) = self
                .combat
                .resolve_attack(&attack, &combat, &mut self.state, world)
            {
                self.apply_resolution(res, world);
            }
            if self.state.phase != GamePhase::Playing {
                return;
            }
        }

        // Then enemies in roster order, each seeing the moves applied so far
        for i in 0..self.state.enemies.len() {
            ctx.player_position = self
                .state
                .player
                .as_ref()
                .filter(|p| p.alive)
                .map(|p| p.position);
            let enemy = &mut self.state.enemies[i];
            let intent = intent_for(enemy, input, &ctx, &*world);
            execute(enemy, &intent, world);
        }

        for event in &input.hits {
            if self.state.phase != GamePhase::Playing {
                break;
            }
            if let Some(res) = self.combat.resolve(event, &mut self.state, world) {
                self.apply_resolution(res, world);
            }
        }
    }
}

/// Hand an intent to the presentation layer and mirror the move
fn execute<W: World + ?Sized>(agent: &mut Agent, intent: &Intent, world: &mut W) {
    if let Some(direction) = intent.facing {
        world.face(agent.handle, direction);
    }
    if let Some(target) = intent.move_to {
        world.move_agent(agent.handle, target);
        agent.position = target;
    }
    if let Some(impulse) = intent.impulse {
        world.apply_impulse(agent.handle, impulse);
    }
}
