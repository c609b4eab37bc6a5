use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Pos, PowerupKind};
use crate::error::PowerupError;
use crate::maze::Maze;
use crate::shadow::ShadowClone;

pub const SPAWN_ATTEMPTS: u32 = 200;
/// A placement attempt happens every this many ticks...
pub const SPAWN_CADENCE_TICKS: u64 = 600;
/// ...and goes ahead with this probability.
pub const SPAWN_CHANCE: f64 = 0.9;

pub const SPEED_MS: u64 = 6000;
pub const CLOAK_MS: u64 = 6000;
pub const FREEZE_MS: u64 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub pos: Pos,
    pub kind: PowerupKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEffect {
    pub kind: PowerupKind,
    pub expires_at_ms: u64,
}

impl ActiveEffect {
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }
}

fn duration_ms(kind: PowerupKind) -> u64 {
    match kind {
        PowerupKind::Speed => SPEED_MS,
        PowerupKind::Cloak => CLOAK_MS,
        PowerupKind::Freeze => FREEZE_MS,
    }
}

/// Pickups lying in the maze, the single effect in force, and the freeze window.
#[derive(Debug, Clone, Default)]
pub struct PowerupSystem {
    pickups: Vec<Pickup>,
    effect: Option<ActiveEffect>,
    freeze_until_ms: Option<u64>,
}

impl PowerupSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// The effect in force at `now_ms`, if any.
    pub fn effect(&self, now_ms: u64) -> Option<ActiveEffect> {
        self.effect.filter(|e| e.is_active(now_ms))
    }

    pub fn is_active(&self, kind: PowerupKind, now_ms: u64) -> bool {
        self.effect(now_ms).is_some_and(|e| e.kind == kind)
    }

    /// Drops a pickup of random kind on a free interior tile.
    ///
    /// Rejection-samples up to [`SPAWN_ATTEMPTS`] tiles, skipping walls, the
    /// player's tile and tiles that already hold a pickup.
    pub fn spawn_pickup(
        &mut self,
        maze: &Maze,
        player: Pos,
        rng: &mut impl Rng,
    ) -> Result<Pickup, PowerupError> {
        let max_x = maze.width().saturating_sub(2).max(1);
        let max_y = maze.height().saturating_sub(2).max(1);
        for _ in 0..SPAWN_ATTEMPTS {
            let pos = Pos::new(rng.gen_range(1..=max_x), rng.gen_range(1..=max_y));
            if !maze.is_open(pos) || pos == player {
                continue;
            }
            if self.pickups.iter().any(|p| p.pos == pos) {
                continue;
            }
            let kind = *PowerupKind::ALL
                .choose(rng)
                .unwrap_or(&PowerupKind::Speed);
            let pickup = Pickup { pos, kind };
            self.pickups.push(pickup);
            return Ok(pickup);
        }
        Err(PowerupError::NoSpawnTarget {
            attempts: SPAWN_ATTEMPTS,
        })
    }

    /// Inserts a pickup directly, e.g. for scripted layouts. Occupied tiles are ignored.
    pub fn place(&mut self, pickup: Pickup) -> bool {
        if self.pickups.iter().any(|p| p.pos == pickup.pos) {
            return false;
        }
        self.pickups.push(pickup);
        true
    }

    /// Consumes the pickup under `player`, if any, and applies it.
    pub fn collect(
        &mut self,
        player: Pos,
        now_ms: u64,
        clones: &mut [ShadowClone],
    ) -> Option<PowerupKind> {
        let idx = self.pickups.iter().position(|p| p.pos == player)?;
        let pickup = self.pickups.swap_remove(idx);
        self.apply(pickup.kind, now_ms, clones);
        Some(pickup.kind)
    }

    /// Replaces any current effect. Freeze also stops every clone alive right now.
    pub fn apply(&mut self, kind: PowerupKind, now_ms: u64, clones: &mut [ShadowClone]) {
        let expires_at_ms = now_ms + duration_ms(kind);
        self.effect = Some(ActiveEffect {
            kind,
            expires_at_ms,
        });
        if kind == PowerupKind::Freeze {
            for clone in clones.iter_mut() {
                clone.set_frozen(true);
            }
            self.freeze_until_ms = Some(expires_at_ms);
        }
    }

    /// Clears the effect once its time is up, returning what expired.
    pub fn expire(&mut self, now_ms: u64) -> Option<PowerupKind> {
        let effect = self.effect?;
        if effect.is_active(now_ms) {
            return None;
        }
        self.effect = None;
        Some(effect.kind)
    }

    /// Unfreezes every clone once the freeze window has passed. Runs independently
    /// of [`expire`](Self::expire), so a later pickup cannot cut a freeze short.
    pub fn thaw(&mut self, now_ms: u64, clones: &mut [ShadowClone]) -> bool {
        match self.freeze_until_ms {
            Some(until) if now_ms >= until => {
                for clone in clones.iter_mut() {
                    clone.set_frozen(false);
                }
                self.freeze_until_ms = None;
                true
            }
            _ => false,
        }
    }
}
