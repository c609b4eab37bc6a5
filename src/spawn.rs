use rand::Rng;

use crate::components::Difficulty;

/// Effective interval never drops below this many ticks.
pub const EFFECTIVE_FLOOR: u32 = 20;
/// Ratcheting stops once the base interval reaches this.
pub const INTERVAL_MIN: u32 = 60;
/// Spawns wait until the player has made more moves than this.
pub const HISTORY_THRESHOLD: usize = 8;

const BASELINE: u32 = 280;
const BASELINE_STEP: u32 = 80;
const BASELINE_MIN: u32 = 80;
const BONUS_BASE_CHANCE: f64 = 0.02;
const BONUS_STEP_CHANCE: f64 = 0.03;

/// Decides on which ticks clones appear and tightens the pace after each wave.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    interval: u32,
    difficulty: Difficulty,
}

impl SpawnScheduler {
    pub fn new(difficulty: Difficulty) -> Self {
        let interval = BASELINE
            .saturating_sub(difficulty.level() * BASELINE_STEP)
            .max(BASELINE_MIN);
        Self {
            interval,
            difficulty,
        }
    }

    /// Base interval in ticks. Only ever decreases.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn effective_interval(&self) -> u32 {
        let scale = 1.0 + self.difficulty.level() as f64 * 0.6;
        ((self.interval as f64 / scale).floor() as u32).max(EFFECTIVE_FLOOR)
    }

    pub fn bonus_chance(&self) -> f64 {
        BONUS_BASE_CHANCE + self.difficulty.level() as f64 * BONUS_STEP_CHANCE
    }

    /// Number of clones to create on `tick`: 0, 1, or 2 when the bonus roll hits.
    pub fn poll(&mut self, tick: u64, history_len: usize, rng: &mut impl Rng) -> u32 {
        if tick % self.effective_interval() as u64 != 0 || history_len <= HISTORY_THRESHOLD {
            return 0;
        }
        self.ratchet();
        if rng.gen::<f64>() < self.bonus_chance() {
            2
        } else {
            1
        }
    }

    fn ratchet(&mut self) {
        if self.interval > INTERVAL_MIN {
            let step = 1 + self.difficulty.level();
            self.interval = self.interval.saturating_sub(step).max(INTERVAL_MIN);
            tracing::trace!(interval = self.interval, "spawn interval tightened");
        }
    }
}
