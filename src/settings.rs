//! Game settings and level table
//!
//! Static configuration consumed by the simulation. Loaded from JSON or
//! taken from [`Settings::default`], and validated before a game starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::SPAWN_ANGLE_STEP;
use crate::sim::AgentKind;

/// Configuration errors, reported when settings are loaded or a level is started
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("level table is empty")]
    NoLevels,
    #[error("level {level} has an empty wave")]
    EmptyWave { level: usize },
    #[error("level {level} has non-positive map size {map_size}")]
    NonPositiveMapSize { level: usize, map_size: f32 },
    #[error("{who} has non-positive start health {health}")]
    NonPositiveHealth { who: String, health: f32 },
    #[error("{who} has negative start speed {speed}")]
    NegativeSpeed { who: String, speed: f32 },
    #[error("wave entry in level {level} uses {kind:?}, which is not an enemy type")]
    NotAnEnemy { level: usize, kind: AgentKind },
    #[error("fall bounds are inverted: min {min_y} >= max {max_y}")]
    InvertedFallBounds { min_y: f32, max_y: f32 },
    #[error("timer `{name}` must be positive, got {value}")]
    NonPositiveTimer { name: &'static str, value: f32 },
    #[error("level index {index} out of range ({count} levels)")]
    LevelOutOfRange { index: usize, count: usize },
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Starting stats for an agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentStartStats {
    pub start_health: f32,
    pub start_speed: f32,
}

impl AgentStartStats {
    pub const fn new(start_health: f32, start_speed: f32) -> Self {
        Self {
            start_health,
            start_speed,
        }
    }

    fn validate(&self, who: impl Into<String>) -> Result<(), SettingsError> {
        if !(self.start_health > 0.0) {
            return Err(SettingsError::NonPositiveHealth {
                who: who.into(),
                health: self.start_health,
            });
        }
        if !(self.start_speed >= 0.0) {
            return Err(SettingsError::NegativeSpeed {
                who: who.into(),
                speed: self.start_speed,
            });
        }
        Ok(())
    }
}

/// One group of identical enemies in a level's wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveEntry {
    pub enemy: AgentKind,
    pub count: u32,
    pub stats: AgentStartStats,
}

/// A level: platform size and the wave that spawns on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    pub map_size: f32,
    pub wave: Vec<WaveEntry>,
}

impl LevelSettings {
    /// Total number of enemies the wave spawns
    pub fn enemy_count(&self) -> usize {
        self.wave.iter().map(|e| e.count as usize).sum()
    }

    pub(crate) fn validate(&self, level: usize) -> Result<(), SettingsError> {
        if !(self.map_size > 0.0) {
            return Err(SettingsError::NonPositiveMapSize {
                level,
                map_size: self.map_size,
            });
        }
        if self.wave.is_empty() || self.enemy_count() == 0 {
            return Err(SettingsError::EmptyWave { level });
        }
        for entry in &self.wave {
            if entry.enemy == AgentKind::Player {
                return Err(SettingsError::NotAnEnemy {
                    level,
                    kind: entry.enemy,
                });
            }
            entry.stats.validate(format!("level {level} {:?}", entry.enemy))?;
        }
        Ok(())
    }
}

/// Player attack and jump tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    /// Damage dealt by one player attack
    pub attack_damage: f32,
    /// Maximum reach of the attack ray
    pub attack_range: f32,
    /// Impulse applied to an enemy along the aim direction on hit
    pub knockback: f32,
    /// Upward impulse for a jump
    pub jump_impulse: f32,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            attack_damage: 1.0,
            attack_range: 10.0,
            knockback: 10.0,
            jump_impulse: 5.0,
        }
    }
}

/// Charge enemy duty cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeSettings {
    /// Charge percentage gained (charging) or lost (cooling) per second
    pub rate: f32,
    /// Percentage at which the lunge fires
    pub threshold: f32,
    /// Forward impulse of the lunge
    pub lunge_impulse: f32,
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            rate: 20.0,
            threshold: 100.0,
            lunge_impulse: 30.0,
        }
    }
}

/// Vertical band an agent must stay inside; leaving it is a ring-out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallBounds {
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for FallBounds {
    fn default() -> Self {
        Self {
            min_y: 0.0,
            max_y: 20.0,
        }
    }
}

impl FallBounds {
    /// Returns true if `y` is outside the band
    pub fn is_out(&self, y: f32) -> bool {
        y < self.min_y || y > self.max_y
    }
}

/// Cadences of the deferred timers, in simulated seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    /// Period of the fallen-off-platform poll
    pub fallen_check_interval: f32,
    /// Delay before a dead agent's body is removed by the presentation layer
    pub death_grace: f32,
    /// Duration of the hit flash after taking damage
    pub hit_flash: f32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            fallen_check_interval: 2.0,
            death_grace: 2.0,
            hit_flash: 0.1,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player: AgentStartStats,
    pub levels: Vec<LevelSettings>,
    pub combat: CombatSettings,
    pub charge: ChargeSettings,
    pub fall_bounds: FallBounds,
    pub timers: TimerSettings,
    /// Angle between consecutive enemy spawns on the ring (radians)
    pub spawn_angle_step: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let grunt = AgentStartStats::new(3.0, 2.0);
        let charger = AgentStartStats::new(5.0, 0.0);
        let wave = |enemy, count, stats| WaveEntry {
            enemy,
            count,
            stats,
        };

        Self {
            player: AgentStartStats::new(10.0, 5.0),
            levels: vec![
                LevelSettings {
                    map_size: 10.0,
                    wave: vec![wave(AgentKind::Enemy, 3, grunt)],
                },
                LevelSettings {
                    map_size: 10.0,
                    wave: vec![wave(AgentKind::Enemy, 5, grunt)],
                },
                LevelSettings {
                    map_size: 12.0,
                    wave: vec![
                        wave(AgentKind::Enemy, 4, grunt),
                        wave(AgentKind::ChargeEnemy, 1, charger),
                    ],
                },
                LevelSettings {
                    map_size: 12.0,
                    wave: vec![
                        wave(AgentKind::Enemy, 6, grunt),
                        wave(AgentKind::ChargeEnemy, 2, charger),
                    ],
                },
                LevelSettings {
                    map_size: 15.0,
                    wave: vec![
                        wave(AgentKind::Enemy, 6, grunt),
                        wave(AgentKind::ChargeEnemy, 4, charger),
                    ],
                },
            ],
            combat: CombatSettings::default(),
            charge: ChargeSettings::default(),
            fall_bounds: FallBounds::default(),
            timers: TimerSettings::default(),
            spawn_angle_step: SPAWN_ANGLE_STEP,
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded settings from {} ({} levels)",
            path.display(),
            settings.levels.len()
        );
        Ok(settings)
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.player.validate("player")?;

        if self.levels.is_empty() {
            return Err(SettingsError::NoLevels);
        }
        for (index, level) in self.levels.iter().enumerate() {
            level.validate(index)?;
        }

        if self.fall_bounds.min_y >= self.fall_bounds.max_y {
            return Err(SettingsError::InvertedFallBounds {
                min_y: self.fall_bounds.min_y,
                max_y: self.fall_bounds.max_y,
            });
        }

        let timers = [
            ("fallen_check_interval", self.timers.fallen_check_interval),
            ("charge.rate", self.charge.rate),
            ("charge.threshold", self.charge.threshold),
        ];
        for (name, value) in timers {
            if !(value > 0.0) {
                return Err(SettingsError::NonPositiveTimer { name, value });
            }
        }

        Ok(())
    }

    /// Look up a level, failing on an out-of-range index
    pub fn level(&self, index: usize) -> Result<&LevelSettings, SettingsError> {
        self.levels.get(index).ok_or(SettingsError::LevelOutOfRange {
            index,
            count: self.levels.len(),
        })
    }

    /// Index of the final level
    pub fn last_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.levels.len(), 5);
        assert_eq!(settings.last_level(), 4);
    }

    #[test]
    fn test_empty_wave_rejected() {
        let mut settings = Settings::default();
        settings.levels[2].wave.clear();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::EmptyWave { level: 2 })
        ));
    }

    #[test]
    fn test_all_zero_counts_rejected() {
        let mut settings = Settings::default();
        settings.levels[1].wave[0].count = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::EmptyWave { level: 1 })
        ));
    }

    #[test]
    fn test_non_positive_map_size_rejected() {
        let mut settings = Settings::default();
        settings.levels[0].map_size = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NonPositiveMapSize { level: 0, .. })
        ));
    }

    #[test]
    fn test_no_levels_rejected() {
        let settings = Settings {
            levels: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::NoLevels)));
    }

    #[test]
    fn test_player_in_wave_rejected() {
        let mut settings = Settings::default();
        settings.levels[0].wave[0].enemy = AgentKind::Player;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NotAnEnemy { level: 0, .. })
        ));
    }

    #[test]
    fn test_inverted_fall_bounds_rejected() {
        let mut settings = Settings::default();
        settings.fall_bounds = FallBounds {
            min_y: 5.0,
            max_y: 1.0,
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvertedFallBounds { .. })
        ));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{
            "player": { "start_health": 4.0, "start_speed": 3.0 },
            "levels": [
                { "map_size": 8.0, "wave": [
                    { "enemy": "Enemy", "count": 2, "stats": { "start_health": 1.0, "start_speed": 1.0 } }
                ] }
            ]
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.player.start_health, 4.0);
        assert_eq!(settings.levels.len(), 1);
        assert_eq!(settings.levels[0].enemy_count(), 2);
        assert_eq!(settings.combat, CombatSettings::default());
        assert_eq!(settings.fall_bounds.max_y, 20.0);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let json = r#"{ "levels": [ { "map_size": -1.0, "wave": [] } ] }"#;
        assert!(matches!(
            Settings::from_json(json),
            Err(SettingsError::NonPositiveMapSize { .. })
        ));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_fall_bounds() {
        let bounds = FallBounds::default();
        assert!(bounds.is_out(-0.1));
        assert!(bounds.is_out(20.5));
        assert!(!bounds.is_out(0.0));
        assert!(!bounds.is_out(20.0));
    }

    #[test]
    fn test_level_lookup() {
        let settings = Settings::default();
        assert!(settings.level(0).is_ok());
        assert!(matches!(
            settings.level(9),
            Err(SettingsError::LevelOutOfRange { index: 9, count: 5 })
        ));
    }
}
