use rand::Rng;

use crate::components::{CloneKind, Pos};

/// Longest slice of history a clone will replay.
pub const SNAPSHOT_CAP: usize = 800;
/// Below this many recorded moves there is nothing worth chasing with.
pub const MIN_HISTORY: usize = 4;

const WRAITH_BASE_CHANCE: f64 = 0.12;
const WRAITH_RAMP_CAP: f64 = 0.20;
const WRAITH_RAMP_TICKS: f64 = 5000.0;

const LURCH_BASE_CHANCE: f64 = 0.006;
const LURCH_RAMP_CAP: f64 = 0.05;
const LURCH_RAMP_TICKS: f64 = 40000.0;
const LURCH_MAX: usize = 40;

/// Probability that a clone spawned at `tick` is a wraith.
pub fn wraith_chance(tick: u64) -> f64 {
    WRAITH_BASE_CHANCE + WRAITH_RAMP_CAP.min(tick as f64 / WRAITH_RAMP_TICKS)
}

/// Per-tick probability that a wraith lurches ahead in its replay.
pub fn lurch_chance(tick: u64) -> f64 {
    LURCH_BASE_CHANCE + LURCH_RAMP_CAP.min(tick as f64 / LURCH_RAMP_TICKS)
}

/// An entity replaying a frozen suffix of the player's movement.
#[derive(Debug, Clone)]
pub struct ShadowClone {
    snapshot: Box<[Pos]>,
    cursor: usize,
    kind: CloneKind,
    frozen: bool,
    spawn_tick: u64,
}

/// Snapshots the tail of `history` into a new clone, or `None` if the history is too short.
pub fn spawn_clone(history: &[Pos], tick: u64, rng: &mut impl Rng) -> Option<ShadowClone> {
    if history.len() < MIN_HISTORY {
        return None;
    }
    let start = history.len() - history.len().min(SNAPSHOT_CAP);
    let kind = if rng.gen::<f64>() < wraith_chance(tick) {
        CloneKind::Wraith
    } else {
        CloneKind::Basic
    };
    ShadowClone::new(&history[start..], kind, tick)
}

impl ShadowClone {
    /// Returns `None` for an empty snapshot: a clone must always have somewhere to stand.
    pub fn new(snapshot: &[Pos], kind: CloneKind, spawn_tick: u64) -> Option<Self> {
        if snapshot.is_empty() {
            return None;
        }
        Some(Self {
            snapshot: snapshot.into(),
            cursor: 0,
            kind,
            frozen: false,
            spawn_tick,
        })
    }

    /// Moves the replay forward for `tick`.
    ///
    /// Frozen clones hold still without losing their place, and a clone does not
    /// move on the tick it spawned. Basic clones take exactly one snapshot step;
    /// wraiths may first lurch up to forty steps ahead. Once the last
    /// index is reached the clone stays there.
    pub fn advance(&mut self, tick: u64, rng: &mut impl Rng) {
        if self.frozen || tick <= self.spawn_tick {
            return;
        }
        let last = self.snapshot.len() - 1;
        match self.kind {
            CloneKind::Basic => {}
            CloneKind::Wraith => {
                if rng.gen::<f64>() < lurch_chance(tick) {
                    let reach = LURCH_MAX.min(self.snapshot.len());
                    let jump = rng.gen_range(1..=reach);
                    self.cursor = (self.cursor + jump).min(last);
                }
            }
        }
        self.cursor = (self.cursor + 1).min(last);
    }

    pub fn position(&self) -> Pos {
        self.snapshot[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn snapshot(&self) -> &[Pos] {
        &self.snapshot
    }

    pub fn kind(&self) -> CloneKind {
        self.kind
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor + 1 == self.snapshot.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn age(&self, tick: u64) -> u64 {
        tick.saturating_sub(self.spawn_tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line(n: usize) -> Vec<Pos> {
        (0..n).map(|i| Pos::new(i + 1, 1)).collect()
    }

    #[test]
    fn short_history_spawns_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(spawn_clone(&line(3), 100, &mut rng).is_none());
        assert!(spawn_clone(&line(4), 100, &mut rng).is_some());
    }

    #[test]
    fn snapshot_is_a_capped_suffix() {
        let mut rng = StdRng::seed_from_u64(1);
        let clone = spawn_clone(&line(10), 0, &mut rng).unwrap();
        assert_eq!(clone.snapshot(), line(10).as_slice());

        let long = line(1000);
        let clone = spawn_clone(&long, 0, &mut rng).unwrap();
        assert_eq!(clone.snapshot().len(), SNAPSHOT_CAP);
        assert_eq!(clone.snapshot(), &long[200..]);
        assert_eq!(clone.position(), long[200]);
    }

    #[test]
    fn basic_clone_replays_one_step_per_tick_then_holds() {
        let mut rng = StdRng::seed_from_u64(2);
        let path = line(5);
        let mut clone = ShadowClone::new(&path, CloneKind::Basic, 10).unwrap();

        let mut seen = vec![clone.position()];
        clone.advance(10, &mut rng);
        assert_eq!(clone.position(), path[0], "no movement on the spawn tick");
        for tick in 11..20 {
            clone.advance(tick, &mut rng);
            seen.push(clone.position());
        }
        let expected: Vec<Pos> = path
            .iter()
            .copied()
            .chain(std::iter::repeat(path[4]).take(5))
            .collect();
        assert_eq!(seen, expected);
        assert!(clone.is_exhausted());
    }

    #[test]
    fn wraith_cursor_never_retreats_or_overruns() {
        let mut rng = StdRng::seed_from_u64(3);
        let path = line(300);
        let mut clone = ShadowClone::new(&path, CloneKind::Wraith, 0).unwrap();
        let mut prev = clone.cursor();
        let mut lurched = false;
        for tick in 1..400_u64 {
            clone.advance(tick + 40_000, &mut rng);
            let cur = clone.cursor();
            assert!(cur >= prev);
            assert!(cur < path.len());
            assert!(cur - prev <= LURCH_MAX + 1, "advanced {} in one tick", cur - prev);
            lurched |= cur > prev + 1;
            prev = cur;
        }
        assert!(lurched, "a late-run wraith should lurch at least once in 400 ticks");
    }

    #[test]
    fn lurch_on_a_short_snapshot_is_bounded_by_its_length() {
        let mut rng = StdRng::seed_from_u64(5);
        let path = line(10);
        let mut jumps = Vec::new();
        for _ in 0..2000 {
            let mut clone = ShadowClone::new(&path, CloneKind::Wraith, 0).unwrap();
            clone.advance(1_000_000, &mut rng);
            jumps.push(clone.cursor());
        }
        assert!(jumps.iter().all(|&c| c >= 1 && c <= path.len() - 1));
        let lurched: Vec<usize> = jumps.into_iter().filter(|&c| c > 1).collect();
        assert!(lurched.len() > 50, "only {} lurches", lurched.len());
        // Jumps are drawn from 1..=10 here, so only 8, 9 or 10 land on the end.
        let at_end = lurched.iter().filter(|&&c| c == path.len() - 1).count();
        assert!(at_end * 2 < lurched.len(), "{at_end} of {} hit the end", lurched.len());
    }

    #[test]
    fn lurch_never_exceeds_forty_steps_plus_the_regular_one() {
        let mut rng = StdRng::seed_from_u64(6);
        let path = line(SNAPSHOT_CAP);
        let mut widest = 0;
        for _ in 0..200 {
            let mut clone = ShadowClone::new(&path, CloneKind::Wraith, 0).unwrap();
            let mut prev = clone.cursor();
            for tick in 1..=SNAPSHOT_CAP as u64 {
                clone.advance(tick + 40_000, &mut rng);
                let step = clone.cursor() - prev;
                assert!(step >= 1 || clone.is_exhausted());
                assert!(step <= LURCH_MAX.min(path.len()) + 1);
                widest = widest.max(step);
                prev = clone.cursor();
            }
        }
        assert!(widest > 30, "widest lurch only {widest}");
    }

    #[test]
    fn age_counts_ticks_since_spawn() {
        let clone = ShadowClone::new(&line(4), CloneKind::Basic, 120).unwrap();
        assert_eq!(clone.age(100), 0);
        assert_eq!(clone.age(120), 0);
        assert_eq!(clone.age(150), 30);
    }

    #[test]
    fn frozen_clone_keeps_its_place() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut clone = ShadowClone::new(&line(8), CloneKind::Basic, 0).unwrap();
        clone.advance(1, &mut rng);
        clone.advance(2, &mut rng);
        clone.set_frozen(true);
        for tick in 3..50 {
            clone.advance(tick, &mut rng);
        }
        assert_eq!(clone.cursor(), 2);
        clone.set_frozen(false);
        clone.advance(50, &mut rng);
        assert_eq!(clone.cursor(), 3);
    }

    #[test]
    fn chances_ramp_and_cap() {
        assert!((wraith_chance(0) - 0.12).abs() < 1e-12);
        assert!((wraith_chance(1000) - 0.32).abs() < 1e-12);
        assert!((wraith_chance(1_000_000) - 0.32).abs() < 1e-12);
        assert!((lurch_chance(0) - 0.006).abs() < 1e-12);
        assert!((lurch_chance(10_000_000) - 0.056).abs() < 1e-12);
    }
}
