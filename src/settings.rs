//! Settings and high-score persistence using TOML
//!
//! Stores everything in ~/.config/blokrs/settings.toml (or platform
//! equivalent). The core never reads this file; the shell loads it at
//! startup and saves it at session boundaries.

use crate::config::{GRID_SIZES, TRAY_MAX};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// High-score table length.
pub const MAX_HIGH_SCORES: usize = 5;
/// Player name length cap.
pub const MAX_NAME_LEN: usize = 5;

/// Persisted game settings plus the high-score table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pieces offered per set (1-4)
    pub tray_count: usize,
    /// Grid side length (10, 15 or 20)
    pub grid_size: usize,
    pub sound_on: bool,
    /// Name prefilled on the game-over card
    pub player_name: String,
    pub high_scores: Vec<HighScoreEntry>,
}

/// One finished game worth remembering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    pub highest_combo: u32,
    pub grid_size: usize,
    pub tray_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tray_count: 4,
            grid_size: 10,
            sound_on: true,
            player_name: "PLAYR".to_string(),
            high_scores: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blokrs", "blokrs").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or fall back to defaults. Out-of-range
    /// values are clamped rather than rejected.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Settings>(&contents)
                .map(Settings::clamped)
                .unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Force every field into its documented range.
    pub fn clamped(mut self) -> Self {
        self.tray_count = self.tray_count.clamp(1, TRAY_MAX);
        if !GRID_SIZES.contains(&self.grid_size) {
            self.grid_size = 10;
        }
        self.player_name = sanitize_name(&self.player_name);
        if self.player_name.is_empty() {
            self.player_name = "PLAYR".to_string();
        }
        self.high_scores.sort_by(|a, b| b.score.cmp(&a.score));
        self.high_scores.truncate(MAX_HIGH_SCORES);
        self
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), String> {
        let Some(dir) = Self::config_dir() else {
            return Err("Could not determine config directory".to_string());
        };

        let Some(path) = Self::settings_path() else {
            return Err("Could not determine settings path".to_string());
        };

        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create config dir: {}", e))?;

        let contents =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize: {}", e))?;

        fs::write(&path, contents).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Insert a finished game into the table, keeping it sorted descending
    /// and capped.
    pub fn add_high_score(&mut self, entry: HighScoreEntry) {
        self.high_scores.push(entry);
        self.high_scores.sort_by(|a, b| b.score.cmp(&a.score));
        self.high_scores.truncate(MAX_HIGH_SCORES);
    }

    /// Best persisted score; seeds the running high score shown in play.
    pub fn best_score(&self) -> u64 {
        self.high_scores.first().map(|e| e.score).unwrap_or(0)
    }
}

/// Uppercase letters only, cut to the length cap.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_NAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_string(),
            score,
            highest_combo: 3,
            grid_size: 10,
            tray_count: 4,
        }
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.tray_count, 4);
        assert_eq!(s.grid_size, 10);
        assert!(s.sound_on);
        assert_eq!(s.player_name, "PLAYR");
        assert_eq!(s.best_score(), 0);
    }

    #[test]
    fn test_clamped_fixes_out_of_range_values() {
        let s = Settings {
            tray_count: 9,
            grid_size: 12,
            player_name: "a very long name 42".to_string(),
            ..Settings::default()
        }
        .clamped();
        assert_eq!(s.tray_count, 4);
        assert_eq!(s.grid_size, 10);
        assert_eq!(s.player_name, "AVERY");
    }

    #[test]
    fn test_clamped_restores_an_empty_name() {
        let s = Settings {
            player_name: "123".to_string(),
            ..Settings::default()
        }
        .clamped();
        assert_eq!(s.player_name, "PLAYR");
    }

    #[test]
    fn test_high_scores_stay_sorted_and_capped() {
        let mut s = Settings::default();
        for (i, score) in [300u64, 100, 500, 200, 400, 250, 50].iter().enumerate() {
            s.add_high_score(entry(&format!("P{}", i), *score));
        }
        let scores: Vec<u64> = s.high_scores.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![500, 400, 300, 250, 200]);
        assert_eq!(s.best_score(), 500);
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let mut s = Settings::default();
        s.add_high_score(entry("ABC", 1234));
        let text = toml::to_string_pretty(&s).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.high_scores.len(), 1);
        assert_eq!(back.high_scores[0].score, 1234);
        assert_eq!(back.player_name, "PLAYR");
    }
}
