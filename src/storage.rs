use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::components::Difficulty;
use crate::error::StorageError;
use crate::game::RunOutcome;

pub const LEADERBOARD_LEN: usize = 10;

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub records_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths, StorageError> {
    let proj = ProjectDirs::from("com", "shadow-clone", "ShadowCloneEscape")
        .ok_or(StorageError::NoDataDir)?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        records_path: dir.join("records.json"),
        log_path: dir.join("shadow-clone.log"),
        data_dir: dir,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub secs: u64,
    pub difficulty: Difficulty,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Records {
    pub best_secs: u64,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub new_record: bool,
    /// Zero-based leaderboard position, if the run made the cut.
    pub rank: Option<usize>,
}

impl Records {
    pub fn submit(&mut self, secs: u64, difficulty: Difficulty, outcome: RunOutcome) -> Submission {
        let new_record = secs > self.best_secs;
        if new_record {
            self.best_secs = secs;
        }
        // Ties go below existing entries.
        let idx = self.leaderboard.partition_point(|e| e.secs >= secs);
        let rank = if idx < LEADERBOARD_LEN {
            self.leaderboard.insert(
                idx,
                LeaderboardEntry {
                    secs,
                    difficulty,
                    outcome,
                },
            );
            self.leaderboard.truncate(LEADERBOARD_LEN);
            Some(idx)
        } else {
            None
        };
        Submission { new_record, rank }
    }
}

/// Missing or unreadable files yield empty records.
pub fn load_records(path: &Path) -> Records {
    read_json(path).unwrap_or_default()
}

pub fn save_records(path: &Path, records: &Records) -> Result<(), StorageError> {
    write_json_atomic(path, records)
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let s = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&s) {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring malformed file");
            None
        }
    }
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(&tmp, data).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    atomic_rename(&tmp, path)
}

fn atomic_rename(from: &Path, to: &Path) -> Result<(), StorageError> {
    // Windows refuses to rename over an existing file.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).map_err(|source| StorageError::Io {
        path: to.to_path_buf(),
        source,
    })
}
