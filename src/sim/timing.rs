//! Oscillating timing bar

use serde::{Deserialize, Serialize};

/// Marker sweeping [0, 1] back and forth over a target zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingMarker {
    /// Current position in [0, 1]
    pub position: f32,
    /// Signed change per tick
    pub velocity: f32,
    pub zone_start: f32,
    pub zone_width: f32,
}

impl TimingMarker {
    /// Marker at 0 moving right at `speed` per tick
    pub fn new(speed: f32, zone_start: f32, zone_width: f32) -> Self {
        Self {
            position: 0.0,
            velocity: speed.abs(),
            zone_start,
            zone_width,
        }
    }

    /// Advance one tick, reversing exactly at the bounds
    pub fn tick(&mut self) {
        self.position += self.velocity;
        if self.position >= 1.0 {
            self.position = 1.0;
            self.velocity = -self.velocity.abs();
        }
        if self.position <= 0.0 {
            self.position = 0.0;
            self.velocity = self.velocity.abs();
        }
    }

    #[inline]
    pub fn zone_end(&self) -> f32 {
        self.zone_start + self.zone_width
    }

    /// Inclusive on both zone edges
    #[inline]
    pub fn in_zone(&self) -> bool {
        self.position >= self.zone_start && self.position <= self.zone_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reverses_at_one() {
        let mut marker = TimingMarker::new(0.3, 0.4, 0.2);
        marker.tick();
        marker.tick();
        marker.tick();
        assert!((marker.position - 0.9).abs() < 1e-6);
        marker.tick();
        assert_eq!(marker.position, 1.0);
        assert!(marker.velocity < 0.0);
        marker.tick();
        assert!((marker.position - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_zone_edges_count() {
        let mut marker = TimingMarker::new(0.1, 0.25, 0.25);
        marker.position = 0.25;
        assert!(marker.in_zone());
        marker.position = 0.5;
        assert!(marker.in_zone());
        marker.position = 0.5001;
        assert!(!marker.in_zone());
        marker.position = 0.2499;
        assert!(!marker.in_zone());
    }

    proptest! {
        #[test]
        fn prop_marker_stays_in_unit_range(speed in 0.001f32..0.4, ticks in 1usize..2000) {
            let mut marker = TimingMarker::new(speed, 0.3, 0.2);
            for _ in 0..ticks {
                let before = marker.velocity;
                marker.tick();
                prop_assert!((0.0..=1.0).contains(&marker.position));
                // Direction only flips on a bound
                if marker.velocity.signum() != before.signum() {
                    prop_assert!(marker.position == 0.0 || marker.position == 1.0);
                }
                if marker.position == 1.0 {
                    prop_assert!(marker.velocity < 0.0);
                }
                if marker.position == 0.0 {
                    prop_assert!(marker.velocity > 0.0);
                }
            }
        }
    }
}
