//! Cosmetic feedback effects
//!
//! Particles, kick rings and score pop-ups. They decay every tick whatever
//! the round phase is and never influence gameplay.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Colour of a miss puff (churned-up turf)
pub const MUD: u32 = 0x8b4513;

/// A burst/puff particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: u32,
    pub alpha: f32,
    /// Removed once this reaches zero
    pub life: f32,
}

/// Expanding ring left behind by a kick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

/// Floating "+points" text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Popup {
    pub pos: Vec2,
    pub points: u32,
    pub offset_y: f32,
    pub alpha: f32,
}

/// All live cosmetic effects of a game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub rings: Vec<Ring>,
    pub popups: Vec<Popup>,
    #[serde(skip)]
    max_particles: usize,
}

impl Effects {
    pub fn new(max_particles: usize) -> Self {
        Self {
            max_particles,
            ..Default::default()
        }
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
        self.trim();
    }

    fn push_particle(&mut self, particle: Particle) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            // Oldest first
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    fn trim(&mut self) {
        let excess = self.particles.len().saturating_sub(self.max_particles);
        self.particles.drain(..excess);
    }

    /// Twelve particles flying out evenly from a target hit
    pub fn hit_burst<R: Rng + ?Sized>(&mut self, rng: &mut R, pos: Vec2, color: u32) {
        for i in 0..12 {
            let angle = std::f32::consts::TAU / 12.0 * i as f32;
            let speed: f32 = rng.random_range(2.0..6.0);
            self.push_particle(Particle {
                pos,
                vel: crate::unit_from_angle(angle) * speed,
                radius: rng.random_range(3.0..6.0),
                color,
                alpha: 1.0,
                life: 1.0,
            });
        }
    }

    /// Small puff of turf where a shot missed
    pub fn miss_puff<R: Rng + ?Sized>(&mut self, rng: &mut R, pos: Vec2) {
        for _ in 0..6 {
            self.push_particle(Particle {
                pos: Vec2::new(pos.x + rng.random_range(-10.0..10.0), pos.y),
                vel: Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-3.0f32..0.0)),
                radius: rng.random_range(2.0..4.0),
                color: MUD,
                alpha: 0.8,
                life: 0.8,
            });
        }
    }

    pub fn kick_ring(&mut self, pos: Vec2) {
        if self.max_particles == 0 {
            return;
        }
        self.rings.push(Ring {
            pos,
            radius: 5.0,
            alpha: 0.8,
        });
    }

    pub fn popup(&mut self, pos: Vec2, points: u32) {
        self.popups.push(Popup {
            pos,
            points,
            offset_y: 0.0,
            alpha: 1.0,
        });
    }

    /// Advance every effect one tick and drop the expired ones
    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel.y += 0.1;
            p.life -= 0.02;
            p.alpha = p.life;
        }
        self.particles.retain(|p| p.life > 0.0);

        for ring in &mut self.rings {
            ring.radius += 2.0;
            ring.alpha -= 0.05;
        }
        self.rings.retain(|r| r.alpha > 0.0);

        for popup in &mut self.popups {
            popup.offset_y -= 1.5;
            popup.alpha -= 0.02;
        }
        self.popups.retain(|p| p.alpha > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.rings.clear();
        self.popups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.rings.is_empty() && self.popups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_particles_decay_and_disappear() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut fx = Effects::new(500);
        fx.hit_burst(&mut rng, Vec2::new(100.0, 100.0), 0xf5c542);
        fx.miss_puff(&mut rng, Vec2::new(50.0, 50.0));
        fx.kick_ring(Vec2::ZERO);
        fx.popup(Vec2::ZERO, 30);
        assert_eq!(fx.particles.len(), 18);

        // Life 1.0 at 0.02 per tick
        for _ in 0..51 {
            fx.update();
        }
        assert!(fx.is_empty());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut fx = Effects::new(10);
        fx.miss_puff(&mut rng, Vec2::ZERO);
        fx.hit_burst(&mut rng, Vec2::new(1.0, 1.0), 0xffffff);
        assert_eq!(fx.particles.len(), 10);
        assert!(fx.particles.iter().all(|p| p.color == 0xffffff));
    }

    #[test]
    fn test_disabled_effects_spawn_nothing() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut fx = Effects::new(0);
        fx.hit_burst(&mut rng, Vec2::ZERO, 0);
        fx.kick_ring(Vec2::ZERO);
        assert!(fx.is_empty());
    }
}
