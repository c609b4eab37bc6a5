use serde::{Deserialize, Serialize};

/// Tile coordinate. `x` grows rightward, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbor in `dir`, or `None` when it would leave the non-negative quadrant.
    pub fn step(self, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = self.x.checked_add_signed(dx)?;
        let ny = self.y.checked_add_signed(dy)?;
        Some(Pos { x: nx, y: ny })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneKind {
    Basic,
    Wraith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    Speed,
    Cloak,
    Freeze,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [PowerupKind::Speed, PowerupKind::Cloak, PowerupKind::Freeze];

    pub fn label(self) -> &'static str {
        match self {
            PowerupKind::Speed => "SPEED",
            PowerupKind::Cloak => "CLOAK",
            PowerupKind::Freeze => "FREEZE",
        }
    }
}

/// Difficulty level, persisted as the integer 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn level(self) -> u32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Difficulty::Easy),
            1 => Ok(Difficulty::Normal),
            2 => Ok(Difficulty::Hard),
            other => Err(format!("difficulty must be 0, 1 or 2 (got {other})")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.level() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_refuses_to_underflow() {
        assert_eq!(Pos::new(0, 3).step(Dir::Left), None);
        assert_eq!(Pos::new(2, 0).step(Dir::Up), None);
        assert_eq!(Pos::new(2, 3).step(Dir::Right), Some(Pos::new(3, 3)));
    }

    #[test]
    fn difficulty_serializes_as_integer() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "2");
        let back: Difficulty = serde_json::from_str("0").unwrap();
        assert_eq!(back, Difficulty::Easy);
        assert!(serde_json::from_str::<Difficulty>("3").is_err());
    }
}
