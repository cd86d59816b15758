//! Goalkeeper
//!
//! Ten penalties. While the striker lines up the player picks a dive (left,
//! centre or right); the ball then flies at one third of the goal while the
//! keeper dives. Guessing the striker's side is a save.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{Tier, tier_for};
use crate::highscores::{Better, high_key};
use crate::sim::{
    Action, Easing, Effects, Flight, FrameAnimation, Integration, Lane, Lifecycle, MovingBody,
    PhaseMachine, Rect, ResultTrack, Round, RoundResult, SchedulerStats, SubPhase, integrate,
};
use crate::tuning::GoalkeeperTuning;

const INTRO: &str = "Watch the striker and dive the right way! Use the arrow keys or tap a side of the goal.";
const SAVE_COLOR: u32 = 0x2ecc71;
const BALL_RADIUS: f32 = 10.0;
/// Extra ball radius at the end of a shot
const BALL_GROWTH: f32 = 4.0;

const TIERS: &[Tier] = &[
    Tier {
        min: 9.0,
        title: "LEGEND!",
        line: "What a performance! You were unbeatable between the posts!",
    },
    Tier {
        min: 7.0,
        title: "Amazing!",
        line: "Amazing goalkeeping! The strikers didn't know what to do!",
    },
    Tier {
        min: 5.0,
        title: "Great Effort!",
        line: "Great effort! Keep watching the striker's body shape.",
    },
    Tier {
        min: 3.0,
        title: "Keep Trying!",
        line: "Keep trying! Watch for the hint and react quickly.",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "Unlucky!",
        line: "Unlucky! Goalkeeping is hard. Stay on your toes next time!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalkeeperPhase {
    /// Striker lining up; dives accepted
    Aiming,
    /// Ball and keeper in motion
    Shot,
}

impl SubPhase for GoalkeeperPhase {
    fn name(&self) -> &'static str {
        match self {
            GoalkeeperPhase::Aiming => "aiming",
            GoalkeeperPhase::Shot => "shot",
        }
    }
}

#[derive(Debug, Clone)]
enum Driver {
    Aim(FrameAnimation),
    Shot(Integration),
    Result(FrameAnimation),
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub goal: Rect,
    pub keeper: Vec2,
    pub dive: Option<Lane>,
    pub ball: MovingBody,
    pub striker: Vec2,
    pub aim_progress: f32,
    /// Striker's side, while still readable
    pub hint: Option<Lane>,
    pub shot: u32,
    pub results: Vec<Option<RoundResult>>,
    pub last_result: Option<RoundResult>,
}

pub struct Goalkeeper {
    tuning: GoalkeeperTuning,
    field: Vec2,
    goal: Rect,
    striker: Vec2,
    penalty_spot: Vec2,
    machine: PhaseMachine<GoalkeeperPhase, Driver>,
    round: Round,
    lane: Lane,
    dive: Option<Lane>,
    ball: MovingBody,
    keeper_offset: f32,
    results: ResultTrack,
    last_result: Option<RoundResult>,
    effects: Effects,
    summary: Option<GameSummary>,
}

impl Goalkeeper {
    pub fn new(field: Vec2, tuning: GoalkeeperTuning) -> Self {
        let goal = Rect::new(field.x * 0.1, field.y * 0.05, field.x * 0.8, field.y * 0.45);
        let penalty_spot = Vec2::new(field.x / 2.0, field.y - 80.0);
        Self {
            results: ResultTrack::new(tuning.shots as usize),
            tuning,
            field,
            goal,
            striker: Vec2::new(field.x / 2.0, field.y - 50.0),
            penalty_spot,
            machine: PhaseMachine::new(),
            round: Round::first(0.0),
            lane: Lane::Centre,
            dive: None,
            ball: MovingBody::new(penalty_spot, BALL_RADIUS),
            keeper_offset: 0.0,
            last_result: None,
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn saves(&self) -> u32 {
        self.results.wins()
    }

    pub fn results(&self) -> &ResultTrack {
        &self.results
    }

    pub fn dive(&self) -> Option<Lane> {
        self.dive
    }

    fn keeper_pos(&self) -> Vec2 {
        Vec2::new(self.goal.center().x + self.keeper_offset, self.goal.max().y - 30.0)
    }

    /// Lane for a tap on the playfield, by thirds of the goal
    fn lane_at(&self, p: Vec2) -> Lane {
        let third = self.goal.size.x / 3.0;
        if p.x < self.goal.min().x + third {
            Lane::Left
        } else if p.x < self.goal.min().x + 2.0 * third {
            Lane::Centre
        } else {
            Lane::Right
        }
    }

    fn line_up<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.machine.enter(Lifecycle::Setup);
        self.lane = Lane::ALL[rng.random_range(0..Lane::ALL.len())];
        self.dive = None;
        self.keeper_offset = 0.0;
        self.last_result = None;
        self.ball = MovingBody::new(self.penalty_spot, BALL_RADIUS);
        self.machine.enter_with(
            Lifecycle::Active(GoalkeeperPhase::Aiming),
            Driver::Aim(FrameAnimation::normalized(self.tuning.aim_rate)),
        );
    }

    fn take_shot(&mut self) {
        let dive = *self.dive.get_or_insert(Lane::Centre);
        log::debug!("Shot {}: striker {:?}, keeper {:?}", self.round.index + 1, self.lane, dive);
        let target = Vec2::new(
            self.goal.min().x + self.goal.size.x * self.lane.fraction(),
            self.goal.center().y,
        );
        let flight = Flight::normalized(self.penalty_spot, target, self.tuning.shot_rate).with_easing(Easing::EaseInQuad);
        self.machine.enter_with(
            Lifecycle::Active(GoalkeeperPhase::Shot),
            Driver::Shot(Integration::Interpolated(flight)),
        );
    }

    /// Keeper offset from the goal centre at shot progress `t`
    fn dive_offset(&self, t: f32) -> f32 {
        let side = self.dive.map_or(0.0, Lane::side);
        let reach = self.goal.size.x * self.tuning.dive_reach;
        side * reach * Easing::EaseOutCubic.apply((t * self.tuning.dive_speed).min(1.0))
    }

    fn resolve(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::Resolving);
        let result = if self.dive == Some(self.lane) {
            self.effects.hit_burst(env.rng, self.ball.pos, SAVE_COLOR);
            RoundResult::Won
        } else {
            self.effects.miss_puff(env.rng, self.ball.pos);
            RoundResult::Lost
        };
        self.results.record(self.round.index as usize, result);
        self.last_result = Some(result);
        log::debug!("Shot {}: {:?}", self.round.index + 1, result);
        self.machine.enter_with(
            Lifecycle::Feedback,
            Driver::Result(FrameAnimation::frames(self.tuning.result_ticks)),
        );
    }

    fn next_shot(&mut self, env: &mut Env<'_>) {
        if self.round.index + 1 >= self.tuning.shots {
            self.game_over(env);
            return;
        }
        self.round = self.round.next(env.now_ms);
        self.line_up(env.rng);
    }

    fn game_over(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::GameOver);
        let saves = self.saves();
        let summary = GameSummary::record(
            GameKind::Goalkeeper,
            &high_key(GameKind::Goalkeeper.key()),
            Better::Higher,
            f64::from(saves),
            format!("{} / {}", saves, self.tuning.shots),
            tier_for(TIERS, f64::from(saves)),
            env,
        );
        env.say(&summary.coach_line);
        self.summary = Some(summary);
    }
}

enum Next {
    Shoot,
    Resolve,
    NextShot,
}

impl MiniGame for Goalkeeper {
    fn kind(&self) -> GameKind {
        GameKind::Goalkeeper
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() || self.tuning.shots == 0 {
            return;
        }
        self.results = ResultTrack::new(self.tuning.shots as usize);
        self.summary = None;
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.round = Round::first(env.now_ms);
        self.line_up(env.rng);
        log::info!("Goalkeeper started: {} shots", self.tuning.shots);
        env.say(INTRO);
    }

    fn handle(&mut self, action: Action, _env: &mut Env<'_>) {
        if !self.machine.is_active(&GoalkeeperPhase::Aiming) || self.dive.is_some() {
            return;
        }
        let lane = match action {
            Action::Key(key) => Lane::from_key(key),
            Action::PointerDown(p) => Some(self.lane_at(p)),
            Action::PointerMove(_) | Action::PointerUp(_) => None,
        };
        if let Some(lane) = lane {
            // Committing cuts the run-up short
            self.dive = Some(lane);
            self.take_shot();
        }
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();

        let next = match self.machine.driver_mut() {
            Some(Driver::Aim(aim)) => aim.advance().then_some(Next::Shoot),
            Some(Driver::Shot(profile)) => {
                let report = integrate(&mut self.ball, profile);
                let t = match profile {
                    Integration::Interpolated(flight) => flight.fraction(),
                    Integration::Freefall(_) => 1.0,
                };
                self.ball.radius = BALL_RADIUS + BALL_GROWTH * t;
                self.keeper_offset = self.dive_offset(t);
                report.arrived.then_some(Next::Resolve)
            }
            Some(Driver::Result(hold)) => hold.advance().then_some(Next::NextShot),
            None => None,
        };
        match next {
            Some(Next::Shoot) => self.take_shot(),
            Some(Next::Resolve) => self.resolve(env),
            Some(Next::NextShot) => self.next_shot(env),
            None => {}
        }
    }

    fn snapshot(&self) -> Snapshot {
        let aim_progress = match self.machine.driver() {
            Some(Driver::Aim(aim)) => aim.fraction(),
            _ => 1.0,
        };
        let aiming = self.machine.is_active(&GoalkeeperPhase::Aiming);
        Snapshot {
            game: GameKind::Goalkeeper,
            phase: self.phase_label(),
            hud: vec![
                format!("Saves: {}", self.saves()),
                format!("Shot {} / {}", (self.round.index + 1).min(self.tuning.shots), self.tuning.shots),
            ],
            countdown: None,
            scene: GameScene::Goalkeeper(Scene {
                goal: self.goal,
                keeper: self.keeper_pos(),
                dive: self.dive,
                ball: self.ball.clone(),
                striker: self.striker,
                aim_progress,
                hint: (aiming && aim_progress < self.tuning.hint_until).then_some(self.lane),
                shot: self.round.index + 1,
                results: self.results.as_slice().to_vec(),
                last_result: self.last_result,
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
