use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collision::{self, Collision};
use crate::components::{CloneKind, Difficulty, Dir, Pos, PowerupKind};
use crate::error::MazeError;
use crate::maze::{self, Maze};
use crate::powerup::{self, ActiveEffect, Pickup, PowerupSystem};
use crate::recorder::{MoveOutcome, MoveRecorder};
use crate::shadow::{self, ShadowClone};
use crate::spawn::SpawnScheduler;

pub const DEFAULT_GRID_W: usize = 31;
pub const DEFAULT_GRID_H: usize = 21;
/// Held-key pacing while the speed effect is up.
pub const SPEED_PACE_MS: u64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Last as long as possible; there is no way out.
    #[default]
    Survival,
    /// A goal tile sits at the far end of the maze.
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Caught,
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub width: usize,
    pub height: usize,
    pub difficulty: Difficulty,
    pub objective: Objective,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_W,
            height: DEFAULT_GRID_H,
            difficulty: Difficulty::default(),
            objective: Objective::default(),
        }
    }
}

/// Discrete happenings a sound or HUD layer may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    CloneSpawned { kind: CloneKind, at: Pos },
    PickupSpawned(Pickup),
    PickupCollected(PowerupKind),
    EffectExpired(PowerupKind),
    CloneThawed,
    /// A clone reached the cloaked player. Sent once per overlap, not every tick.
    CloakAbsorbedHit,
    RunEnded { outcome: RunOutcome, score_secs: u64 },
}

/// Everything belonging to one run. Replaced wholesale on restart.
#[derive(Debug, Clone)]
pub struct RunState {
    config: RunConfig,
    maze: Maze,
    goal: Option<Pos>,
    player: Pos,
    recorder: MoveRecorder,
    clones: Vec<ShadowClone>,
    powerups: PowerupSystem,
    scheduler: SpawnScheduler,
    tick: u64,
    now_ms: u64,
    running: bool,
    outcome: Option<RunOutcome>,
    shielded: bool,
    events: Vec<GameEvent>,
}

impl RunState {
    pub fn new(config: RunConfig, rng: &mut impl Rng) -> Result<Self, MazeError> {
        let mut maze = maze::generate(config.width, config.height, rng)?;
        let goal = match config.objective {
            Objective::Survival => None,
            Objective::Escape => maze.place_goal_farthest(maze::START),
        };
        Ok(Self::with_maze(config, maze, goal))
    }

    /// Starts a run on a prepared maze. The player begins on [`maze::START`].
    pub fn with_maze(config: RunConfig, maze: Maze, goal: Option<Pos>) -> Self {
        tracing::info!(
            width = maze.width(),
            height = maze.height(),
            difficulty = config.difficulty.label(),
            objective = ?config.objective,
            "run started"
        );
        Self {
            config,
            maze,
            goal,
            player: maze::START,
            recorder: MoveRecorder::new(),
            clones: Vec::new(),
            powerups: PowerupSystem::new(),
            scheduler: SpawnScheduler::new(config.difficulty),
            tick: 0,
            now_ms: 0,
            running: true,
            outcome: None,
            shielded: false,
            events: Vec::new(),
        }
    }

    /// Attempts one step of the player. Ignored once the run is over.
    pub fn try_move(&mut self, dir: Dir) -> MoveOutcome {
        if !self.running {
            return MoveOutcome::Rejected;
        }
        let outcome = self.recorder.try_move(&self.maze, self.player, dir);
        if let MoveOutcome::Accepted(next) = outcome {
            self.player = next;
        }
        outcome
    }

    /// Runs one frame at `now_ms` milliseconds into the run.
    ///
    /// Order is fixed: timers, pickup placement, clone spawning, clone
    /// movement, collisions, then pickups and the goal against the player's
    /// current tile.
    pub fn tick(&mut self, now_ms: u64, rng: &mut impl Rng) {
        if !self.running {
            return;
        }
        self.tick += 1;
        self.now_ms = now_ms.max(self.now_ms);
        let now = self.now_ms;

        if self.powerups.thaw(now, &mut self.clones) {
            self.events.push(GameEvent::CloneThawed);
        }
        if let Some(kind) = self.powerups.expire(now) {
            self.events.push(GameEvent::EffectExpired(kind));
        }

        self.maybe_spawn_pickup(rng);

        let spawns = self.scheduler.poll(self.tick, self.recorder.len(), rng);
        for _ in 0..spawns {
            if let Some(clone) = shadow::spawn_clone(self.recorder.history(), self.tick, rng) {
                tracing::debug!(
                    tick = self.tick,
                    kind = ?clone.kind(),
                    replay_len = clone.snapshot().len(),
                    "clone spawned"
                );
                self.events.push(GameEvent::CloneSpawned {
                    kind: clone.kind(),
                    at: clone.position(),
                });
                self.clones.push(clone);
            }
        }

        for clone in self.clones.iter_mut() {
            clone.advance(self.tick, rng);
        }

        match collision::resolve(self.player, &self.clones, self.powerups.effect(now), now) {
            Collision::Clear => self.shielded = false,
            Collision::Shielded => {
                if !self.shielded {
                    self.events.push(GameEvent::CloakAbsorbedHit);
                }
                self.shielded = true;
            }
            Collision::Caught => {
                self.finish(RunOutcome::Caught);
                return;
            }
        }

        if let Some(kind) = self.powerups.collect(self.player, now, &mut self.clones) {
            tracing::info!(kind = kind.label(), tick = self.tick, "pickup collected");
            self.events.push(GameEvent::PickupCollected(kind));
        }

        if self.maze.is_goal(self.player) {
            self.finish(RunOutcome::Escaped);
        }
    }

    fn maybe_spawn_pickup(&mut self, rng: &mut impl Rng) {
        if self.tick % powerup::SPAWN_CADENCE_TICKS != 0 {
            return;
        }
        if rng.gen::<f64>() >= powerup::SPAWN_CHANCE {
            return;
        }
        match self.powerups.spawn_pickup(&self.maze, self.player, rng) {
            Ok(pickup) => self.events.push(GameEvent::PickupSpawned(pickup)),
            Err(err) => tracing::debug!(tick = self.tick, %err, "pickup skipped"),
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.running = false;
        self.outcome = Some(outcome);
        let score_secs = self.score_secs();
        tracing::info!(
            ?outcome,
            score_secs,
            ticks = self.tick,
            clones = self.clones.len(),
            "run ended"
        );
        self.events.push(GameEvent::RunEnded {
            outcome,
            score_secs,
        });
    }

    /// Places a pickup on a chosen tile, bypassing the random cadence.
    pub fn place_pickup(&mut self, pickup: Pickup) -> bool {
        self.maze.is_open(pickup.pos) && self.powerups.place(pickup)
    }

    /// Adds an already-built clone, for scripted scenarios.
    pub fn push_clone(&mut self, clone: ShadowClone) {
        self.clones.push(clone);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> RunConfig {
        self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn goal(&self) -> Option<Pos> {
        self.goal
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn history(&self) -> &[Pos] {
        self.recorder.history()
    }

    pub fn clones(&self) -> &[ShadowClone] {
        &self.clones
    }

    pub fn pickups(&self) -> &[Pickup] {
        self.powerups.pickups()
    }

    pub fn effect(&self) -> Option<ActiveEffect> {
        self.powerups.effect(self.now_ms)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn spawn_interval(&self) -> u32 {
        self.scheduler.interval()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn score_secs(&self) -> u64 {
        self.now_ms / 1000
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Delay between held-key steps, shortened while speed is active.
    pub fn move_pace_ms(&self, base_ms: u64) -> u64 {
        if self.powerups.is_active(PowerupKind::Speed, self.now_ms) {
            base_ms.min(SPEED_PACE_MS)
        } else {
            base_ms
        }
    }
}
