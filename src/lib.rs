//! Core of a maze-survival game in which the player is hunted by clones that
//! replay the player's own recorded moves.

pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod maze;
pub mod powerup;
pub mod recorder;
pub mod shadow;
pub mod spawn;
pub mod storage;

pub use components::{CloneKind, Difficulty, Dir, Pos, PowerupKind};
pub use config::Settings;
pub use error::{MazeError, PowerupError, StorageError};
pub use game::{GameEvent, Objective, RunConfig, RunOutcome, RunState};
pub use maze::{Maze, Tile};
pub use powerup::{ActiveEffect, Pickup};
pub use recorder::MoveOutcome;
pub use shadow::ShadowClone;
