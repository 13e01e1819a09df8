//! Game state and notifications
//!
//! Everything the round controller owns: phase, level index, the roster and
//! the outgoing event queue.

use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId, AgentKind, Skill};
use super::world::AgentHandle;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a start command
    Menu,
    /// Active gameplay
    Playing,
    /// Level cleared; simulation paused until a skill is given up
    BetweenRound,
    /// Run ended; enemies cleared, returns to the menu on the next tick
    GameOver,
}

/// Notifications for the presentation/UI layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: usize, enemies: usize },
    LevelTransition { level: usize },
    SkillChoiceRequired { available: Vec<Skill> },
    SkillRemoved { skill: Skill },
    AgentDamaged { id: AgentId, health: f32 },
    AgentDied { id: AgentId, kind: AgentKind },
    GameOver { won: bool },
    QuitRequested,
}

/// Round state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    /// Index into the level table
    pub current_level: usize,
    /// Waves started this game
    pub round: u32,
    /// Platform size of the current level
    pub map_size: f32,
    pub player: Option<Agent>,
    /// Live enemies in spawn order
    pub enemies: Vec<Agent>,
    /// Next agent ID
    next_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Menu,
            current_level: 0,
            round: 0,
            map_size: 0.0,
            player: None,
            enemies: Vec::new(),
            next_id: 1,
        }
    }
}

impl GameState {
    /// Allocate a new agent ID
    pub fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of live enemies
    pub fn enemies_remaining(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.player
            .iter()
            .chain(self.enemies.iter())
            .find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.player
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|a| a.id == id)
    }

    /// Live agent owning a presentation handle
    pub fn live_agent_by_handle_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        self.player
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|a| a.alive && a.handle == handle)
    }
}
