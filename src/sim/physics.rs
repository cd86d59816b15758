//! Per-frame body integration
//!
//! One entry point, [`integrate`], with two profiles:
//! - `Interpolated`: scripted flight from a start to a target over a fixed
//!   number of steps (shots, dives). No gravity, exact arrival.
//! - `Freefall`: gravity, drag and restitution bounces inside a box
//!   (keepie-uppies ball, dribbling player with zero gravity).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, reflect_velocity};

/// A ball/projectile/player body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Visual spin angle (radians)
    pub rotation: f32,
}

impl MovingBody {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            rotation: 0.0,
        }
    }
}

/// Progress curve for interpolated flights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Accelerates toward the target (t²)
    EaseInQuad,
    /// Fast start, soft landing (1 - (1-t)³)
    EaseOutCubic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Scripted flight between two points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub start: Vec2,
    pub target: Vec2,
    /// Progress so far, in steps
    pub progress: f32,
    /// Progress added per tick
    pub step: f32,
    /// Progress at which the flight lands
    pub total: f32,
    pub easing: Easing,
    /// Rotation added per tick
    pub spin: f32,
}

impl Flight {
    /// Flight lasting exactly `total_steps` ticks
    pub fn steps(start: Vec2, target: Vec2, total_steps: u32) -> Self {
        Self {
            start,
            target,
            progress: 0.0,
            step: 1.0,
            total: total_steps as f32,
            easing: Easing::Linear,
            spin: 0.0,
        }
    }

    /// Flight over normalized progress [0, 1], advancing `rate` per tick
    pub fn normalized(start: Vec2, target: Vec2, rate: f32) -> Self {
        Self {
            start,
            target,
            progress: 0.0,
            step: rate,
            total: 1.0,
            easing: Easing::Linear,
            spin: 0.0,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }

    /// Fraction of the flight completed, clamped to [0, 1]
    #[inline]
    pub fn fraction(&self) -> f32 {
        (self.progress / self.total).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn landed(&self) -> bool {
        self.progress >= self.total
    }

    /// Position for the current progress
    pub fn position(&self) -> Vec2 {
        if self.landed() {
            return self.target;
        }
        self.start + (self.target - self.start) * self.easing.apply(self.fraction())
    }
}

/// What happens when a free-falling body reaches the floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Floor {
    /// Bounce back up keeping `restitution` of the vertical speed
    Bounce { restitution: f32 },
    /// Stop dead on the floor (the game decides what a landing means)
    Rest,
}

/// Gravity/drag/bounce parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freefall {
    /// Added to vy every tick (px/tick²)
    pub gravity: f32,
    /// Per-axis velocity factor applied after moving
    pub drag: Vec2,
    /// Box the body must stay inside (floor = bottom edge)
    pub bounds: Rect,
    pub wall_restitution: f32,
    pub ceiling_restitution: f32,
    pub floor: Floor,
}

/// Integration profile for one body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Integration {
    Interpolated(Flight),
    Freefall(Freefall),
}

/// Contacts and arrival observed during one integration step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Interpolated flight reached its target this step
    pub arrived: bool,
    pub wall_contact: bool,
    pub ceiling_contact: bool,
    /// Downward speed at the moment of a floor contact
    pub floor_impact: Option<f32>,
}

/// Advance `body` by one tick under `profile`
pub fn integrate(body: &mut MovingBody, profile: &mut Integration) -> StepReport {
    match profile {
        Integration::Interpolated(flight) => step_flight(body, flight),
        Integration::Freefall(params) => step_freefall(body, params),
    }
}

fn step_flight(body: &mut MovingBody, flight: &mut Flight) -> StepReport {
    if flight.landed() {
        body.pos = flight.target;
        body.vel = Vec2::ZERO;
        return StepReport {
            arrived: true,
            ..Default::default()
        };
    }

    flight.progress = (flight.progress + flight.step).min(flight.total);
    let next = flight.position();
    body.vel = next - body.pos;
    body.pos = next;
    body.rotation += flight.spin;

    StepReport {
        arrived: flight.landed(),
        ..Default::default()
    }
}

fn step_freefall(body: &mut MovingBody, params: &Freefall) -> StepReport {
    let mut report = StepReport::default();

    body.vel.y += params.gravity;
    body.pos += body.vel;
    body.vel *= params.drag;

    let min = params.bounds.min();
    let max = params.bounds.max();
    let r = body.radius;

    // Walls
    if body.pos.x - r < min.x {
        body.pos.x = min.x + r;
        body.vel = bounce(body.vel, Vec2::X, params.wall_restitution);
        report.wall_contact = true;
    } else if body.pos.x + r > max.x {
        body.pos.x = max.x - r;
        body.vel = bounce(body.vel, Vec2::NEG_X, params.wall_restitution);
        report.wall_contact = true;
    }

    // Ceiling
    if body.pos.y - r < min.y {
        body.pos.y = min.y + r;
        body.vel = bounce(body.vel, Vec2::Y, params.ceiling_restitution);
        report.ceiling_contact = true;
    }

    // Floor
    if body.pos.y + r >= max.y {
        body.pos.y = max.y - r;
        report.floor_impact = Some(body.vel.y.max(0.0));
        body.vel = match params.floor {
            Floor::Bounce { restitution } => bounce(body.vel, Vec2::NEG_Y, restitution),
            Floor::Rest => Vec2::new(body.vel.x, 0.0),
        };
    }

    report
}

/// Reflect the component of `vel` heading into the surface, keeping `restitution` of it
fn bounce(vel: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    if vel.dot(normal) >= 0.0 {
        // Already separating
        return vel;
    }
    let reflected = reflect_velocity(vel, normal);
    let normal_speed = reflected.dot(normal);
    reflected - normal * normal_speed * (1.0 - restitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bouncing_box(floor: Floor) -> Freefall {
        Freefall {
            gravity: 0.25,
            drag: Vec2::ONE,
            bounds: Rect::new(0.0, 0.0, 400.0, 300.0),
            wall_restitution: 0.7,
            ceiling_restitution: 0.5,
            floor,
        }
    }

    #[test]
    fn test_interpolated_shot_lands_exactly() {
        let start = Vec2::new(100.0, 400.0);
        let target = Vec2::new(150.0, 50.0);
        let mut body = MovingBody::new(start, 12.0);
        let mut profile = Integration::Interpolated(Flight::steps(start, target, 40));

        for step in 1..=40 {
            let report = integrate(&mut body, &mut profile);
            // Never past the target before landing
            assert!(body.pos.x <= 150.0 + 1e-4);
            assert!(body.pos.y >= 50.0 - 1e-4);
            assert_eq!(report.arrived, step == 40);
        }

        let Integration::Interpolated(flight) = &profile else {
            unreachable!()
        };
        assert_eq!(flight.progress, 40.0);
        assert_eq!(body.pos, Vec2::new(150.0, 50.0));
    }

    #[test]
    fn test_interpolated_after_landing_stays_put() {
        let mut body = MovingBody::new(Vec2::ZERO, 5.0);
        let mut profile =
            Integration::Interpolated(Flight::steps(Vec2::ZERO, Vec2::new(10.0, 0.0), 2));
        integrate(&mut body, &mut profile);
        integrate(&mut body, &mut profile);
        let report = integrate(&mut body, &mut profile);
        assert!(report.arrived);
        assert_eq!(body.pos, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInQuad, Easing::EaseOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(3.0), 1.0);
        }
        assert!(Easing::EaseInQuad.apply(0.5) < 0.5);
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.5);
    }

    #[test]
    fn test_normalized_flight_completes() {
        let mut body = MovingBody::new(Vec2::ZERO, 10.0);
        let mut profile = Integration::Interpolated(
            Flight::normalized(Vec2::ZERO, Vec2::new(0.0, -100.0), 0.04)
                .with_easing(Easing::EaseInQuad),
        );
        let mut ticks = 0;
        loop {
            ticks += 1;
            if integrate(&mut body, &mut profile).arrived {
                break;
            }
            assert!(ticks < 100);
        }
        assert!((24..=26).contains(&ticks));
        assert_eq!(body.pos, Vec2::new(0.0, -100.0));
    }

    #[test]
    fn test_floor_bounce_halves_vertical_speed() {
        let mut body = MovingBody::new(Vec2::new(200.0, 150.0), 15.0);
        body.vel.y = -3.0;
        let mut profile = Integration::Freefall(bouncing_box(Floor::Bounce { restitution: 0.5 }));

        let mut contacts = 0;
        for _ in 0..2000 {
            let report = integrate(&mut body, &mut profile);
            if let Some(impact) = report.floor_impact {
                if impact < 0.5 {
                    break; // Settled
                }
                assert!((body.vel.y + impact * 0.5).abs() < 1e-4);
                contacts += 1;
            }
        }
        assert!(contacts >= 3);
    }

    #[test]
    fn test_floor_rest_reports_contact() {
        let mut body = MovingBody::new(Vec2::new(200.0, 280.0), 15.0);
        body.vel.y = 5.0;
        let mut profile = Integration::Freefall(bouncing_box(Floor::Rest));
        let report = integrate(&mut body, &mut profile);
        assert!(report.floor_impact.is_some());
        assert_eq!(body.pos.y, 285.0);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_wall_bounce_clamps_and_reflects() {
        let mut body = MovingBody::new(Vec2::new(12.0, 150.0), 10.0);
        body.vel = Vec2::new(-10.0, 0.0);
        let mut params = bouncing_box(Floor::Rest);
        params.gravity = 0.0;
        let mut profile = Integration::Freefall(params);

        let report = integrate(&mut body, &mut profile);
        assert!(report.wall_contact);
        assert_eq!(body.pos.x, 10.0);
        assert!((body.vel.x - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_ceiling_bounce() {
        let mut body = MovingBody::new(Vec2::new(200.0, 12.0), 10.0);
        body.vel = Vec2::new(0.0, -8.0);
        let mut profile = Integration::Freefall(bouncing_box(Floor::Rest));

        let report = integrate(&mut body, &mut profile);
        assert!(report.ceiling_contact);
        assert_eq!(body.pos.y, 10.0);
        // -8 + 0.25 gravity, reflected at half strength
        assert!((body.vel.y - 3.875).abs() < 1e-5);
    }
}
