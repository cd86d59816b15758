//! Shooting practice
//!
//! Ten shots at a goal holding three to five targets. A click picks the spot;
//! the ball flies there over a fixed number of frames and hits at most one
//! target on landing. Clearing every target brings a fresh set.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{CueSheet, Tier, TimedCue, tier_for};
use crate::consts::PLACEMENT_ATTEMPTS;
use crate::frames_for_ms;
use crate::highscores::{Better, high_key};
use crate::sim::{
    Action, Circle, Effects, Flight, FrameAnimation, Integration, Lifecycle, MovingBody,
    PhaseMachine, Rect, Round, SchedulerStats, SubPhase, Target, circle_overlap, integrate,
    place_with_rejection,
};
use crate::tuning::ShootingTuning;

const INTRO: &str = "Pick your spot and take your shot! Red targets are worth the most.";
const HALFWAY: &str = "Halfway there! Keep your eye on the ball.";

const TIERS: &[Tier] = &[
    Tier {
        min: 80.0,
        title: "Sharpshooter!",
        line: "What a performance! You could score from anywhere today!",
    },
    Tier {
        min: 50.0,
        title: "Great Shooting!",
        line: "Brilliant shooting, Meerkats! Your aim is getting really sharp!",
    },
    Tier {
        min: 30.0,
        title: "Good Effort!",
        line: "Good effort! Try aiming for the red targets, they're worth more points!",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "Keep Practising!",
        line: "Keep practising your shooting! Remember: pick your spot, then shoot!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShootingPhase {
    /// Waiting for a click
    Aiming,
    /// Ball in flight
    Shooting,
}

impl SubPhase for ShootingPhase {
    fn name(&self) -> &'static str {
        match self {
            ShootingPhase::Aiming => "aiming",
            ShootingPhase::Shooting => "shooting",
        }
    }
}

#[derive(Debug, Clone)]
enum Driver {
    Flight(Integration),
    /// Every target down; a new set follows
    Regenerate(FrameAnimation),
    /// Last shot taken; game over follows
    Wrapup(FrameAnimation),
}

/// What the presentation draws
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub goal: Rect,
    pub targets: Vec<Target>,
    pub ball: MovingBody,
    /// Shrinks as the ball travels away
    pub ball_scale: f32,
    pub in_flight: bool,
    /// Aim line end, while aiming
    pub aim: Option<Vec2>,
    pub spot: Vec2,
    pub shots_left: u32,
    pub score: u32,
}

pub struct Shooting {
    tuning: ShootingTuning,
    field: Vec2,
    goal: Rect,
    spot: Vec2,
    machine: PhaseMachine<ShootingPhase, Driver>,
    round: Round,
    run_started_ms: f64,
    targets: Vec<Target>,
    ball: MovingBody,
    score: u32,
    shots_left: u32,
    aim: Option<Vec2>,
    cues: CueSheet,
    effects: Effects,
    summary: Option<GameSummary>,
}

impl Shooting {
    pub fn new(field: Vec2, tuning: ShootingTuning) -> Self {
        let goal = Rect::new(field.x * 0.1, field.y * 0.05, field.x * 0.8, field.y * 0.25);
        let spot = Vec2::new(field.x / 2.0, field.y - 60.0);
        Self {
            ball: MovingBody::new(spot, tuning.ball_radius),
            shots_left: tuning.shots,
            tuning,
            field,
            goal,
            spot,
            machine: PhaseMachine::new(),
            round: Round::first(0.0),
            run_started_ms: 0.0,
            targets: Vec::new(),
            score: 0,
            aim: None,
            cues: CueSheet::default(),
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn shots_left(&self) -> u32 {
        self.shots_left
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn phase(&self) -> &Lifecycle<ShootingPhase> {
        self.machine.phase()
    }

    /// Place a fresh set of targets inside the goal
    fn generate_targets<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.machine.enter(Lifecycle::Setup);
        self.targets.clear();

        let kinds = &self.tuning.target_kinds;
        if kinds.is_empty() {
            return;
        }
        let max = self.tuning.max_targets.max(self.tuning.min_targets);
        let count = rng.random_range(self.tuning.min_targets..=max);
        let Some(area) = self.goal.inset(self.tuning.goal_padding) else {
            log::warn!("Goal too small for targets");
            return;
        };

        for i in 0..count {
            let kind = kinds[i.min(kinds.len() - 1)];
            let Some(bounds) = area.inset(kind.radius) else {
                continue;
            };
            let placed = &self.targets;
            let gap = self.tuning.target_gap;
            let spot = place_with_rejection(rng, &bounds, PLACEMENT_ATTEMPTS, |p| {
                placed
                    .iter()
                    .all(|t| p.distance(t.center()) >= t.shape.radius + kind.radius + gap)
            });
            match spot {
                Some(center) => self
                    .targets
                    .push(Target::new(Circle::new(center, kind.radius), kind.points, kind.color)),
                None => log::warn!("No room for target {} after {} attempts", i, PLACEMENT_ATTEMPTS),
            }
        }
        log::debug!("Round {}: {} targets", self.round.index + 1, self.targets.len());
    }

    fn shoot(&mut self, at: Vec2) {
        self.shots_left -= 1;
        self.aim = None;
        self.ball = MovingBody::new(self.spot, self.tuning.ball_radius);
        let flight = Flight::steps(self.spot, at, self.tuning.flight_steps).with_spin(self.tuning.spin);
        self.machine.enter_with(
            Lifecycle::Active(ShootingPhase::Shooting),
            Driver::Flight(Integration::Interpolated(flight)),
        );
    }

    fn land(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::Resolving);

        let ball = Circle::new(self.ball.pos, self.ball.radius);
        match self.targets.iter_mut().find(|t| !t.hit && circle_overlap(&ball, &t.shape)) {
            Some(target) => {
                target.strike();
                self.score += target.value;
                self.effects.hit_burst(env.rng, target.center(), target.color);
                self.effects.popup(target.center(), target.value);
                log::debug!("Hit for {} (score {})", target.value, self.score);
            }
            None => {
                self.effects.miss_puff(env.rng, self.ball.pos);
                log::debug!("Missed at {:?}", self.ball.pos);
            }
        }

        if self.shots_left == 0 {
            let delay = frames_for_ms(self.tuning.game_over_delay_ms);
            self.machine
                .enter_with(Lifecycle::Feedback, Driver::Wrapup(FrameAnimation::frames(delay)));
        } else if !self.targets.is_empty() && self.targets.iter().all(|t| t.hit) {
            let delay = frames_for_ms(self.tuning.regenerate_delay_ms);
            self.machine
                .enter_with(Lifecycle::Feedback, Driver::Regenerate(FrameAnimation::frames(delay)));
        } else {
            self.machine.enter(Lifecycle::Active(ShootingPhase::Aiming));
        }
    }

    fn regenerate(&mut self, env: &mut Env<'_>) {
        self.round = self.round.next(env.now_ms);
        self.generate_targets(env.rng);
        self.machine.enter(Lifecycle::Active(ShootingPhase::Aiming));
    }

    fn game_over(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::GameOver);
        let score = f64::from(self.score);
        let summary = GameSummary::record(
            GameKind::Shooting,
            &high_key(GameKind::Shooting.key()),
            Better::Higher,
            score,
            self.score.to_string(),
            tier_for(TIERS, score),
            env,
        );
        env.say(&summary.coach_line);
        self.summary = Some(summary);
    }
}

enum Next {
    Land,
    Regenerate,
    GameOver,
}

impl MiniGame for Shooting {
    fn kind(&self) -> GameKind {
        GameKind::Shooting
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() {
            return;
        }
        self.score = 0;
        self.shots_left = self.tuning.shots;
        self.aim = None;
        self.summary = None;
        self.ball = MovingBody::new(self.spot, self.tuning.ball_radius);
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.round = Round::first(env.now_ms);
        self.run_started_ms = env.now_ms;
        self.cues = CueSheet::new(&[TimedCue {
            at_ms: self.tuning.halfway_cue_ms,
            threshold: self.tuning.halfway_shots_left,
            line: HALFWAY,
        }]);

        self.generate_targets(env.rng);
        self.machine.enter(Lifecycle::Active(ShootingPhase::Aiming));
        log::info!("Shooting started: {} shots", self.shots_left);
        env.say(INTRO);
    }

    fn handle(&mut self, action: Action, _env: &mut Env<'_>) {
        if !self.machine.is_active(&ShootingPhase::Aiming) {
            return;
        }
        match action {
            Action::PointerMove(p) => self.aim = Some(p),
            Action::PointerDown(p) => {
                if self.shots_left == 0 || p.y > self.field.y - self.tuning.dead_zone {
                    return;
                }
                self.shoot(p);
            }
            Action::PointerUp(_) | Action::Key(_) => {}
        }
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();
        for target in &mut self.targets {
            target.settle(0.05);
        }

        if !matches!(self.machine.phase(), Lifecycle::Idle | Lifecycle::GameOver) {
            let shots_left = self.shots_left;
            if let Some(line) = self
                .cues
                .poll(env.now_ms - self.run_started_ms, |cue| shots_left <= cue.threshold)
            {
                env.say(line);
            }
        }

        let next = match self.machine.driver_mut() {
            Some(Driver::Flight(profile)) => integrate(&mut self.ball, profile).arrived.then_some(Next::Land),
            Some(Driver::Regenerate(delay)) => delay.advance().then_some(Next::Regenerate),
            Some(Driver::Wrapup(delay)) => delay.advance().then_some(Next::GameOver),
            None => None,
        };
        match next {
            Some(Next::Land) => self.land(env),
            Some(Next::Regenerate) => self.regenerate(env),
            Some(Next::GameOver) => self.game_over(env),
            None => {}
        }
    }

    fn snapshot(&self) -> Snapshot {
        let flight = match self.machine.driver() {
            Some(Driver::Flight(Integration::Interpolated(f))) => Some(f.fraction()),
            _ => None,
        };
        Snapshot {
            game: GameKind::Shooting,
            phase: self.phase_label(),
            hud: vec![format!("Score: {}", self.score), format!("Shots: {}", self.shots_left)],
            countdown: None,
            scene: GameScene::Shooting(Scene {
                goal: self.goal,
                targets: self.targets.clone(),
                ball: self.ball.clone(),
                ball_scale: 1.0 - flight.unwrap_or(0.0) * 0.3,
                in_flight: flight.is_some(),
                aim: self.aim,
                spot: self.spot,
                shots_left: self.shots_left,
                score: self.score,
            }),
            effects: self.effects.clone(),
            summary: self.summary.clone(),
        }
    }

    fn phase_label(&self) -> &'static str {
        self.machine.phase().label()
    }

    fn can_start(&self) -> bool {
        self.machine.phase().can_start()
    }

    fn scheduler_stats(&self) -> SchedulerStats {
        self.machine.scheduler_stats()
    }

    fn pending_drivers(&self) -> usize {
        self.machine.scheduler().pending()
    }

    fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::*;
    use crate::sim::InputEvent;

    fn started(seed: u64) -> TestSession<Shooting> {
        let mut s = session(Shooting::new(Vec2::new(550.0, 650.0), ShootingTuning::default()), seed);
        s.start(0.0);
        s
    }

    fn click(s: &mut TestSession<Shooting>, at: Vec2, now: f64) {
        s.input(&InputEvent::PointerDown { x: at.x, y: at.y }, now);
    }

    #[test]
    fn test_targets_fit_the_goal_without_overlap() {
        for seed in 0..30 {
            let s = started(seed);
            let game = s.game();
            let targets = game.targets();
            assert!(!targets.is_empty() && targets.len() <= 5);
            let inner = game.goal.inset(30.0).unwrap();
            for (i, a) in targets.iter().enumerate() {
                let c = a.center();
                assert!(c.x - a.shape.radius >= inner.min().x - 1e-3);
                assert!(c.x + a.shape.radius <= inner.max().x + 1e-3);
                for b in &targets[i + 1..] {
                    assert!(c.distance(b.center()) >= a.shape.radius + b.shape.radius + 4.0 - 1e-3);
                }
            }
            // Kinds follow placement order
            assert_eq!(targets[0].value, 10);
        }
    }

    #[test]
    fn test_click_in_dead_zone_is_ignored() {
        let mut s = started(1);
        let before = fingerprint(&s);
        click(&mut s, Vec2::new(275.0, 600.0), 10.0);
        assert_eq!(fingerprint(&s), before);
        assert_eq!(s.game().shots_left(), 10);
    }

    #[test]
    fn test_clicks_during_flight_are_ignored() {
        let mut s = started(2);
        click(&mut s, Vec2::new(275.0, 100.0), 10.0);
        assert_eq!(s.game().phase_label(), "shooting");
        let before = fingerprint(&s);
        click(&mut s, Vec2::new(100.0, 100.0), 20.0);
        s.input(&InputEvent::PointerMove { x: 50.0, y: 50.0 }, 20.0);
        assert_eq!(fingerprint(&s), before);
        assert_eq!(s.game().shots_left(), 9);
    }

    #[test]
    fn test_shot_on_target_scores_once() {
        let mut s = started(3);
        let target = s.game().targets()[0].clone();
        click(&mut s, target.center(), 0.0);
        run_frames(&mut s, 0.0, 40);
        assert_eq!(s.game().score(), target.value);
        assert!(s.game().targets()[0].hit);
        assert!(!s.snapshot().effects.particles.is_empty());
        assert_driver_accounting(&s);

        // The same spot again scores nothing more
        let now = run_until(&mut s, 700.0, 100, |s| s.game().phase_label() == "aiming");
        click(&mut s, target.center(), now);
        run_frames(&mut s, now, 41);
        assert_eq!(s.game().score(), target.value);
    }

    #[test]
    fn test_clearing_all_targets_regenerates() {
        let mut s = started(4);
        let mut now = 0.0;
        let count = s.game().targets().len();
        for i in 0..count {
            let at = s.game().targets()[i].center();
            click(&mut s, at, now);
            now = run_frames(&mut s, now, 40);
            if i + 1 < count {
                now = run_until(&mut s, now, 10, |s| s.game().phase_label() == "aiming");
            }
        }
        assert_eq!(s.game().phase_label(), "feedback");
        run_frames(&mut s, now, 30);
        assert_eq!(s.game().phase_label(), "aiming");
        assert!(s.game().targets().iter().all(|t| !t.hit));
        assert_eq!(s.game().round.index, 1);
        assert_driver_accounting(&s);
    }

    #[test]
    fn test_ten_misses_end_the_game() {
        let mut s = started(5);
        let mut now = 0.0;
        for _ in 0..10 {
            // Above the goal, never on a target
            click(&mut s, Vec2::new(275.0, 5.0), now);
            now = run_until(&mut s, now, 200, |s| {
                matches!(s.game().phase_label(), "aiming" | "feedback")
            });
            assert_driver_accounting(&s);
        }
        assert_eq!(s.game().shots_left(), 0);
        run_until(&mut s, now, 100, |s| s.game().phase_label() == "game_over");
        let summary = s.game().summary().unwrap();
        assert_eq!(summary.score, 0.0);
        assert!(!summary.new_best);
        assert_eq!(summary.title, "Keep Practising!");
        assert_eq!(s.game().pending_drivers(), 0);
    }

    #[test]
    fn test_halfway_cue_needs_shots_used() {
        let mut s = started(6);
        let intro = s.coach().messages().count();
        run_frames(&mut s, 12_000.0, 1);
        // All ten shots still left: cue dropped
        assert_eq!(s.coach().messages().count(), intro);
    }
}
