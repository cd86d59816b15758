//! Meerkat Training Camp - football mini-games round engine
//!
//! Core modules:
//! - `sim`: Deterministic engine pieces (collision, physics, phases, scheduler, input, placement)
//! - `games`: The six mini-games and the `Session` that drives one of them
//! - `highscores`: Best-score store over a key/value backend (LocalStorage on web)
//! - `coach`: Coach notifications and acknowledgement prompts
//! - `tuning`: Data-driven game balance
//! - `platform`: Browser glue (wasm32 only)

pub mod coach;
pub mod games;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use coach::{CoachQueue, Notifier};
pub use games::{GameKind, Session};
pub use highscores::{Better, MemoryStorage, ScoreStore};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed frame rate every per-frame animation step is tuned for
    pub const FRAME_RATE: f64 = 60.0;
    /// Duration of one fixed frame in milliseconds
    pub const FRAME_MS: f64 = 1000.0 / FRAME_RATE;
    /// Maximum catch-up frames per display refresh to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Countdown timers are re-evaluated at most this often (~20 Hz)
    pub const COUNTDOWN_POLL_MS: f64 = 50.0;

    /// Default rejection-sampling budget per entity
    pub const PLACEMENT_ATTEMPTS: u32 = 100;

    /// Namespace prefix for every persisted key
    pub const STORAGE_NAMESPACE: &str = "meerkat_";
}

/// Number of whole frames covering `ms` milliseconds at the fixed frame rate
#[inline]
pub fn frames_for_ms(ms: f64) -> u32 {
    (ms / consts::FRAME_MS).round().max(0.0) as u32
}

/// Unit vector for a screen-space angle (y grows downward)
#[inline]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Round to one decimal place, the precision times are shown and stored at
#[inline]
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_for_ms() {
        assert_eq!(frames_for_ms(500.0), 30);
        assert_eq!(frames_for_ms(800.0), 48);
        assert_eq!(frames_for_ms(-5.0), 0);
    }

    #[test]
    fn test_round_tenths() {
        assert!((round_tenths(12.345) - 12.3).abs() < 1e-9);
        assert!((round_tenths(7.96) - 8.0).abs() < 1e-9);
    }
}
