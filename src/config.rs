use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::Difficulty;
use crate::error::StorageError;
use crate::game::{Objective, RunConfig, DEFAULT_GRID_H, DEFAULT_GRID_W};
use crate::storage;

pub const DEFAULT_TICK_MS: u64 = 16;
pub const DEFAULT_RENDER_FPS: u64 = 60;
pub const DEFAULT_MOVE_PACE_MS: u64 = 140;

pub const TICK_MS_ENV: &str = "SHADOW_TICK_MS";
pub const FPS_ENV: &str = "SHADOW_FPS";
pub const SEED_ENV: &str = "SHADOW_SEED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub objective: Objective,
    pub width: usize,
    pub height: usize,
    /// Fixed maze/randomness seed; `None` draws a fresh one per run.
    pub seed: Option<u64>,
    pub tick_ms: u64,
    pub render_fps: u64,
    pub move_pace_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            objective: Objective::Survival,
            width: DEFAULT_GRID_W,
            height: DEFAULT_GRID_H,
            seed: None,
            tick_ms: DEFAULT_TICK_MS,
            render_fps: DEFAULT_RENDER_FPS,
            move_pace_ms: DEFAULT_MOVE_PACE_MS,
        }
    }
}

impl Settings {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            width: self.width,
            height: self.height,
            difficulty: self.difficulty,
            objective: self.objective,
        }
    }

    /// Applies `SHADOW_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Non-numeric and zero values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };
        if let Some(v) = positive(TICK_MS_ENV) {
            self.tick_ms = v;
        }
        if let Some(v) = positive(FPS_ENV) {
            self.render_fps = v;
        }
        if let Some(v) = lookup(SEED_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            self.seed = Some(v);
        }
        self
    }
}

pub fn load_settings(path: &Path) -> Settings {
    storage::read_json(path).unwrap_or_default()
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), StorageError> {
    storage::write_json_atomic(path, settings)
}
