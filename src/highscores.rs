//! Persisted high score
//!
//! A single integer. The session reads it at start and writes it back only
//! when a run beats it.

use std::io;
use std::path::{Path, PathBuf};

/// Default file name next to the executable's working directory
pub const DEFAULT_HIGH_SCORE_FILE: &str = "high_score.txt";

/// Load/save capability injected into the session
pub trait HighScoreStore {
    /// Previously saved high score (0 if none)
    fn load(&self) -> u64;
    fn save(&mut self, score: u64) -> io::Result<()>;
}

/// Plain-text file holding one integer
#[derive(Debug, Clone)]
pub struct FileHighScore {
    path: PathBuf,
}

impl FileHighScore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileHighScore {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_SCORE_FILE)
    }
}

impl HighScoreStore for FileHighScore {
    fn load(&self) -> u64 {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => match text.trim().parse() {
                Ok(score) => {
                    log::info!("Loaded high score {}", score);
                    score
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable high score in {}: {}", self.path.display(), e);
                    0
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No high score found, starting fresh");
                0
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                0
            }
        }
    }

    fn save(&mut self, score: u64) -> io::Result<()> {
        std::fs::write(&self.path, score.to_string())?;
        log::info!("High score {} saved to {}", score, self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScore {
    pub score: u64,
    pub saves: u32,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&self) -> u64 {
        self.score
    }

    fn save(&mut self, score: u64) -> io::Result<()> {
        self.score = score;
        self.saves += 1;
        Ok(())
    }
}

/// Persist `score` if it beats `previous`. Returns the new best.
pub fn record_if_better<S: HighScoreStore + ?Sized>(
    store: &mut S,
    previous: u64,
    score: u64,
) -> io::Result<u64> {
    if score > previous {
        store.save(score)?;
        Ok(score)
    } else {
        Ok(previous)
    }
}
