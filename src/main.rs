//! Ring Out headless runner
//!
//! Drives the simulation against the kinematic [`HeadlessWorld`] with a
//! seeded bot standing in for the player. Useful for balancing level tables
//! and for reproducing runs from a seed.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use ring_out::consts::{MAX_SUBSTEPS, SIM_DT};
use ring_out::planar;
use ring_out::settings::Settings;
use ring_out::sim::{
    AgentId, GameEvent, GamePhase, HeadlessWorld, HitEvent, HitSource, RoundController, Skill,
    TickInput, World,
};

/// Distance at which an enemy body touches the player
const CONTACT_RANGE: f32 = 1.0;
/// Damage dealt when an enemy touches the player
const CONTACT_DAMAGE: f32 = 1.0;
/// Knockback applied to the player on contact
const CONTACT_KNOCKBACK: f32 = 3.0;

#[derive(Parser)]
#[command(name = "ring-out")]
#[command(about = "Run Ring Out headless with a scripted player")]
struct Args {
    /// Level table and balance as JSON (defaults to the built-in table)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Bot RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Stop after this many frames
    #[arg(long, default_value_t = 36_000)]
    frames: u32,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_settings: bool,
}

/// Scripted player plus the contact reporting a physics engine would do
struct Bot {
    rng: Pcg32,
    touching: HashSet<AgentId>,
}

impl Bot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            touching: HashSet::new(),
        }
    }

    /// Fill this tick's input from the current state
    fn drive(&mut self, ctrl: &RoundController, world: &HeadlessWorld, input: &mut TickInput) {
        let state = ctrl.state();
        let Some(player) = state.player.as_ref().filter(|p| p.alive) else {
            return;
        };

        let nearest = state
            .enemies
            .iter()
            .filter(|e| e.alive)
            .min_by(|a, b| {
                a.position
                    .distance_squared(player.position)
                    .total_cmp(&b.position.distance_squared(player.position))
            });

        // Kite away from the closest enemy, drift back toward the middle
        let mut heading = Vec3::ZERO;
        if let Some(enemy) = nearest {
            let away = planar(player.position - enemy.position);
            if away.length() < 3.0 {
                heading += away.normalize_or_zero();
            }
        }
        if planar(player.position).length() > state.map_size * 0.5 {
            heading -= planar(player.position).normalize_or_zero();
        }
        if heading == Vec3::ZERO {
            heading = Vec3::new(
                self.rng.random_range(-1.0..=1.0),
                0.0,
                self.rng.random_range(-1.0..=1.0),
            );
        }
        input.axis_x = heading.x.clamp(-1.0, 1.0);
        input.axis_z = heading.z.clamp(-1.0, 1.0);
        input.jump = self.rng.random_bool(0.005);

        input.fire = nearest.is_some();
        input.cursor = nearest.map(|e| Vec2::new(e.position.x, e.position.z));

        // Contact is reported on entry only
        let mut now_touching = HashSet::new();
        for enemy in state.enemies.iter().filter(|e| e.alive) {
            let Some(position) = world.position(enemy.handle) else {
                continue;
            };
            if position.distance(player.position) > CONTACT_RANGE {
                continue;
            }
            now_touching.insert(enemy.id);
            if !self.touching.contains(&enemy.id) {
                input.hits.push(HitEvent {
                    source: HitSource::Agent(enemy.id),
                    target: player.handle,
                    damage: CONTACT_DAMAGE,
                    knockback: planar(player.position - position).normalize_or_zero()
                        * CONTACT_KNOCKBACK,
                });
            }
        }
        self.touching = now_touching;
    }

    fn pick_skill(&mut self, available: &[Skill]) -> Option<Skill> {
        if available.is_empty() {
            return None;
        }
        Some(available[self.rng.random_range(0..available.len())])
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if args.print_settings {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let mut world = HeadlessWorld::new(1.0);
    let mut ctrl = RoundController::new(settings).context("invalid settings")?;
    let mut bot = Bot::new(args.seed);
    let mut input = TickInput::default();
    let mut frame_rng = Pcg32::seed_from_u64(args.seed.wrapping_add(1));

    ctrl.start_game(&mut world)?;
    log::info!("Seed {} | {}", args.seed, ctrl.hud().text());

    let mut accumulator = 0.0;
    let mut result = None;

    'frames: for frame in 0..args.frames {
        // Jittered frame time exercises the fixed-step accumulator
        accumulator += frame_rng.random_range(0.012..0.022f32);

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            if ctrl.phase() == GamePhase::Playing {
                bot.drive(&ctrl, &world, &mut input);
            }
            ctrl.tick(&mut world, &input, SIM_DT);
            world.step(SIM_DT);
            input.clear_edges();
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in ctrl.drain_events() {
            match event {
                GameEvent::SkillChoiceRequired { available }
                    if ctrl.phase() == GamePhase::BetweenRound =>
                {
                    if let Some(skill) = bot.pick_skill(&available) {
                        ctrl.choose_skill_to_remove(skill, &mut world)?;
                    }
                }
                GameEvent::LevelStarted { level, enemies } => {
                    log::info!("Level {} begins with {} enemies", level + 1, enemies);
                }
                GameEvent::GameOver { won } => result = Some(won),
                GameEvent::QuitRequested => break 'frames,
                other => log::debug!("{:?}", other),
            }
        }

        if frame % 600 == 0 {
            log::info!("{}", ctrl.hud().text());
        }
        if ctrl.phase() == GamePhase::Menu {
            break;
        }
    }

    let hud = ctrl.hud();
    match result {
        Some(true) => println!("Won after {} rounds", hud.round),
        Some(false) => println!(
            "Lost on level {}/{} after {} rounds",
            hud.level + 1,
            hud.level_count,
            hud.round
        ),
        None => println!("Still running after {} frames: {}", args.frames, hud.text()),
    }
    Ok(())
}
