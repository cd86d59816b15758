//! Collision tests and rejection-sampling placement
//!
//! Everything here works in logical playfield coordinates (origin top-left,
//! y grows downward), the space the games and the input router agree on.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A circle (ball, target, cone, slot hit area)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned rectangle (goal mouth, goal zone, spawn bounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Shrink by `pad` on every side; `None` once nothing is left
    pub fn inset(&self, pad: f32) -> Option<Rect> {
        let size = self.size - Vec2::splat(pad * 2.0);
        if size.x < 0.0 || size.y < 0.0 {
            return None;
        }
        Some(Rect {
            origin: self.origin + Vec2::splat(pad),
            size,
        })
    }

    /// Uniform sample inside the rectangle
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let min = self.min();
        let max = self.max();
        Vec2::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
        )
    }
}

/// True iff the two circles overlap (touching does not count)
#[inline]
pub fn circle_overlap(a: &Circle, b: &Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// True iff the circle overlaps the rectangle (closest-point test)
pub fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let closest = circle.center.clamp(rect.min(), rect.max());
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// Strict axis-aligned containment (points on the edge are outside)
#[inline]
pub fn point_in_rect(p: Vec2, rect: &Rect) -> bool {
    let min = rect.min();
    let max = rect.max();
    p.x > min.x && p.x < max.x && p.y > min.y && p.y < max.y
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// A keep-out zone: sampled centres must be further than `min_distance` away
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clearance {
    pub center: Vec2,
    pub min_distance: f32,
}

impl Clearance {
    pub fn new(center: Vec2, min_distance: f32) -> Self {
        Self {
            center,
            min_distance,
        }
    }

    #[inline]
    pub fn admits(&self, p: Vec2) -> bool {
        p.distance(self.center) > self.min_distance
    }
}

/// Sample positions in `bounds` until `accept` holds, at most `max_attempts` times
///
/// Returns `None` on exhaustion. Callers skip the entity in that case rather
/// than retrying, so a round may end up with fewer entities than requested.
pub fn place_with_rejection<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &Rect,
    max_attempts: u32,
    mut accept: impl FnMut(Vec2) -> bool,
) -> Option<Vec2> {
    for _ in 0..max_attempts {
        let candidate = bounds.sample(rng);
        if accept(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Place one circle per requested radius without overlaps
///
/// Each centre is sampled inside `bounds` shrunk by its own radius, keeps
/// `gap` of free space to every circle placed before it, and stays clear of
/// every zone. Entities whose sampling is exhausted are left out.
pub fn scatter<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &Rect,
    radii: &[f32],
    gap: f32,
    zones: &[Clearance],
    max_attempts: u32,
) -> Vec<Circle> {
    let mut placed: Vec<Circle> = Vec::with_capacity(radii.len());

    for &radius in radii {
        let Some(area) = bounds.inset(radius) else {
            log::warn!("No room to place radius {} inside {:?}", radius, bounds);
            continue;
        };
        let spot = place_with_rejection(rng, &area, max_attempts, |p| {
            zones.iter().all(|z| z.admits(p))
                && placed
                    .iter()
                    .all(|c| p.distance(c.center) >= c.radius + radius + gap)
        });
        match spot {
            Some(center) => placed.push(Circle::new(center, radius)),
            None => log::warn!(
                "Placement exhausted after {} attempts, skipping entity {}",
                max_attempts,
                placed.len()
            ),
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::Cell;

    #[test]
    fn test_circle_overlap() {
        let a = Circle::new(Vec2::new(0.0, 0.0), 10.0);
        let b = Circle::new(Vec2::new(15.0, 0.0), 6.0);
        assert!(circle_overlap(&a, &b));

        // Exactly touching is not an overlap
        let c = Circle::new(Vec2::new(16.0, 0.0), 6.0);
        assert!(!circle_overlap(&a, &c));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let rect = Rect::new(100.0, 100.0, 50.0, 50.0);

        assert!(circle_rect_overlap(
            &Circle::new(Vec2::new(95.0, 120.0), 8.0),
            &rect
        ));
        // Near a corner but outside along the diagonal
        assert!(!circle_rect_overlap(
            &Circle::new(Vec2::new(94.0, 94.0), 8.0),
            &rect
        ));
        // Fully inside
        assert!(circle_rect_overlap(
            &Circle::new(Vec2::new(125.0, 125.0), 2.0),
            &rect
        ));
    }

    #[test]
    fn test_point_in_rect() {
        let rect = Rect::new(10.0, 20.0, 50.0, 50.0);
        assert!(point_in_rect(Vec2::new(30.0, 30.0), &rect));
        assert!(!point_in_rect(Vec2::new(10.0, 30.0), &rect));
        assert!(!point_in_rect(Vec2::new(61.0, 30.0), &rect));
        assert!(!point_in_rect(Vec2::new(30.0, 71.0), &rect));
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_inset_collapses() {
        let rect = Rect::new(0.0, 0.0, 20.0, 100.0);
        assert!(rect.inset(9.0).is_some());
        assert!(rect.inset(11.0).is_none());
    }

    #[test]
    fn test_rejection_respects_budget_on_exhaustion() {
        let mut rng = Pcg32::seed_from_u64(7);
        let calls = Cell::new(0u32);
        let result = place_with_rejection(&mut rng, &Rect::new(0.0, 0.0, 10.0, 10.0), 100, |_| {
            calls.set(calls.get() + 1);
            false
        });
        assert!(result.is_none());
        assert_eq!(calls.get(), 100);
    }

    #[test]
    fn test_scatter_skips_when_crowded() {
        let mut rng = Pcg32::seed_from_u64(3);
        // Room for a handful of cones at most
        let bounds = Rect::new(0.0, 0.0, 60.0, 60.0);
        let placed = scatter(&mut rng, &bounds, &[12.0; 20], 12.0, &[], 100);
        assert!(placed.len() < 20);
        assert!(!placed.is_empty());
    }

    proptest! {
        #[test]
        fn prop_scatter_never_overlaps(seed in any::<u64>(), count in 1usize..24) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let bounds = Rect::new(0.0, 0.0, 420.0, 470.0);
            let zones = [
                Clearance::new(Vec2::new(60.0, 450.0), 60.0),
                Clearance::new(Vec2::new(375.0, 65.0), 60.0),
            ];
            let radii: Vec<f32> = (0..count).map(|i| 10.0 + (i % 3) as f32 * 6.0).collect();
            let placed = scatter(&mut rng, &bounds, &radii, 4.0, &zones, 100);

            prop_assert!(placed.len() <= count);
            for (i, a) in placed.iter().enumerate() {
                prop_assert!(a.center.x - a.radius >= bounds.min().x - 1e-3);
                prop_assert!(a.center.x + a.radius <= bounds.max().x + 1e-3);
                prop_assert!(a.center.y - a.radius >= bounds.min().y - 1e-3);
                prop_assert!(a.center.y + a.radius <= bounds.max().y + 1e-3);
                for zone in &zones {
                    prop_assert!(zone.admits(a.center));
                }
                for b in &placed[i + 1..] {
                    prop_assert!(!circle_overlap(a, b));
                }
            }
        }

        #[test]
        fn prop_rejection_never_exceeds_budget(seed in any::<u64>(), budget in 1u32..200) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let calls = Cell::new(0u32);
            let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
            let result = place_with_rejection(&mut rng, &bounds, budget, |p| {
                calls.set(calls.get() + 1);
                p.x < 5.0 && p.y < 5.0
            });
            prop_assert!(calls.get() <= budget);
            if let Some(p) = result {
                prop_assert!(p.x < 5.0 && p.y < 5.0);
            }
        }
    }
}
