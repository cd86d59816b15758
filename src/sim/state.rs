//! Round bookkeeping and shared entity types
//!
//! Only cumulative counters and the score store outlive a round; everything
//! here is rebuilt by the game at the start of each one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Circle;

/// One round (shot, wave, level, formation) of a game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 0-based index within the run
    pub index: u32,
    /// Difficulty step; grows with the index
    pub difficulty: u32,
    /// Wall-clock start (ms)
    pub started_at_ms: f64,
}

impl Round {
    pub fn first(now_ms: f64) -> Self {
        Self {
            index: 0,
            difficulty: 0,
            started_at_ms: now_ms,
        }
    }

    /// The round after this one
    pub fn next(&self, now_ms: f64) -> Self {
        let index = self.index + 1;
        Self {
            index,
            difficulty: index,
            started_at_ms: now_ms,
        }
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_at_ms).max(0.0)
    }
}

/// A target to hit or an obstacle to avoid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub shape: Circle,
    /// Points for hitting it (targets) or penalty units (obstacles)
    pub value: u32,
    pub color: u32,
    pub hit: bool,
    /// Hit shake intensity, decays to zero
    pub wobble: f32,
}

impl Target {
    pub fn new(shape: Circle, value: u32, color: u32) -> Self {
        Self {
            shape,
            value,
            color,
            hit: false,
            wobble: 0.0,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.shape.center
    }

    /// Mark as hit and start the wobble
    pub fn strike(&mut self) {
        self.hit = true;
        self.wobble = 1.0;
    }

    /// Decay the wobble by `rate`
    pub fn settle(&mut self, rate: f32) {
        if self.wobble > 0.0 {
            self.wobble = (self.wobble - rate).max(0.0);
        }
    }
}

/// Outcome of one round in a fixed-length run (shots faced, waves defended)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Won,
    Lost,
}

/// Per-round results of a fixed-length run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTrack {
    results: Vec<Option<RoundResult>>,
}

impl ResultTrack {
    pub fn new(len: usize) -> Self {
        Self {
            results: vec![None; len],
        }
    }

    pub fn record(&mut self, index: usize, result: RoundResult) {
        if let Some(slot) = self.results.get_mut(index) {
            *slot = Some(result);
        }
    }

    pub fn wins(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| **r == Some(RoundResult::Won))
            .count() as u32
    }

    /// Rounds with a result so far
    pub fn played(&self) -> u32 {
        self.results.iter().flatten().count() as u32
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<RoundResult>] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_progression() {
        let round = Round::first(1000.0);
        let next = round.next(2500.0);
        assert_eq!(next.index, 1);
        assert_eq!(next.difficulty, 1);
        assert_eq!(next.elapsed_ms(3000.0), 500.0);
        assert_eq!(next.elapsed_ms(2000.0), 0.0);
    }

    #[test]
    fn test_result_track() {
        let mut track = ResultTrack::new(10);
        track.record(0, RoundResult::Won);
        track.record(1, RoundResult::Lost);
        track.record(2, RoundResult::Won);
        // Out of range is ignored
        track.record(10, RoundResult::Won);
        assert_eq!(track.wins(), 2);
        assert_eq!(track.played(), 3);
    }

    #[test]
    fn test_target_wobble_settles() {
        let mut target = Target::new(Circle::new(Vec2::ZERO, 10.0), 20, 0xe88a2a);
        target.strike();
        assert!(target.hit);
        for _ in 0..40 {
            target.settle(0.03);
        }
        assert_eq!(target.wobble, 0.0);
    }
}
