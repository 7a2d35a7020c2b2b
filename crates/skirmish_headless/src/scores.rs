//! Persisted best-score list.
//!
//! A JSON array of `{"player": ..., "score": ...}` records kept in
//! descending score order. A missing file is an empty board.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for score file operations.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// Failed to read or write the file.
    #[error("Score file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a score list.
    #[error("Failed to parse score file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name.
    pub player: String,
    /// Points scored.
    pub score: u32,
}

/// Best scores, highest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBoard {
    entries: Vec<ScoreEntry>,
}

impl ScoreBoard {
    /// Load a board; a missing file yields an empty one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let mut board: Self = serde_json::from_str(&json)?;
        board.sort();
        Ok(board)
    }

    /// Write the board as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Add a result, keeping the order. Equal scores keep arrival order.
    pub fn record(&mut self, player: impl Into<String>, score: u32) {
        self.entries.push(ScoreEntry {
            player: player.into(),
            score,
        });
        self.sort();
    }

    /// Entries, highest score first.
    #[must_use]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Number of recorded matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    }
}

/// Record one result in the board at `path`.
pub fn record_score<P: AsRef<Path>>(path: P, player: &str, score: u32) -> Result<ScoreBoard, ScoreError> {
    let path = path.as_ref();
    let mut board = ScoreBoard::load(path)?;
    board.record(player, score);
    board.save(path)?;
    tracing::info!(player, score, path = %path.display(), "score recorded");
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_keeps_descending_order() {
        let mut board = ScoreBoard::default();
        board.record("ann", 40);
        board.record("bob", 90);
        board.record("cat", 40);
        let order: Vec<_> = board.entries().iter().map(|e| e.player.as_str()).collect();
        assert_eq!(order, vec!["bob", "ann", "cat"]);
    }

    #[test]
    fn test_missing_file_is_empty_board() {
        let dir = tempdir().unwrap();
        let board = ScoreBoard::load(dir.path().join("none.json")).unwrap();
        assert!(board.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");

        record_score(&path, "ann", 30).unwrap();
        let board = record_score(&path, "bob", 60).unwrap();
        assert_eq!(board.len(), 2);

        let loaded = ScoreBoard::load(&path).unwrap();
        assert_eq!(loaded, board);
        assert_eq!(loaded.entries()[0].player, "bob");

        // Plain JSON list on disk
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.trim_start().starts_with('['));
    }

    #[test]
    fn test_unsorted_file_is_sorted_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, r#"[{"player":"a","score":1},{"player":"b","score":5}]"#).unwrap();
        let board = ScoreBoard::load(&path).unwrap();
        assert_eq!(board.entries()[0].score, 5);
    }

    #[test]
    fn test_garbage_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(ScoreBoard::load(&path), Err(ScoreError::Parse(_))));
    }
}
