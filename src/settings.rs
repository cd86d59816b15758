//! Player preferences
//!
//! Persisted as JSON next to the scores in the same key/value backend.

use serde::{Deserialize, Serialize};

use crate::highscores::{KeyValueStorage, StorageError};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 200,
            QualityPreset::High => 500,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Hit bursts, miss puffs, kick rings
    pub particles: bool,

    // === Coaching ===
    /// Plain coach messages (prompts that gate progress always show)
    pub coach_messages: bool,

    // === Accessibility ===
    /// Reduced motion (no particles or rings)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            coach_messages: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "meerkat_settings";

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle cap (0 disables effects)
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load from the backend, falling back to defaults
    pub fn load(storage: &dyn KeyValueStorage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unavailable: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn KeyValueStorage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).map_err(|e| StorageError::Rejected {
            key: Self::STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        storage.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
