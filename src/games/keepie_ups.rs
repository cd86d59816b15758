//! Keepie-uppies
//!
//! Tap the ball to keep it off the ground. Gravity creeps up and kicks get
//! weaker as the count grows; one touch of the ground ends the run.

use glam::Vec2;
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{CueSheet, Tier, TimedCue, tier_for};
use crate::highscores::{Better, high_key};
use crate::sim::{
    Action, Effects, Floor, Freefall, Integration, Lifecycle, MovingBody, PhaseMachine, Rect,
    SchedulerStats, SubPhase, integrate,
};
use crate::tuning::KeepieUpsTuning;

const INTRO: &str = "Tap the ball to keep it up! Don't let it touch the ground!";

const CUES: [TimedCue; 3] = [
    TimedCue {
        at_ms: 8_000.0,
        threshold: 3,
        line: "Great start! Keep your eye on the ball!",
    },
    TimedCue {
        at_ms: 18_000.0,
        threshold: 8,
        line: "You're on fire! Keep it going!",
    },
    TimedCue {
        at_ms: 30_000.0,
        threshold: 15,
        line: "Incredible touch! The crowd is loving this!",
    },
];

const TIERS: &[Tier] = &[
    Tier {
        min: 20.0,
        title: "Keepie-Uppie King!",
        line: "Unbelievable! That's professional-level ball control, Meerkats!",
    },
    Tier {
        min: 10.0,
        title: "Great Touch!",
        line: "Great effort! Double figures, your touch is really coming on!",
    },
    Tier {
        min: 5.0,
        title: "Nice Try!",
        line: "Nice try! Watch the ball all the way onto your foot.",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "Keep Practising!",
        line: "Don't worry, everyone starts somewhere. Practise a few touches every day!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepieUpsPhase {
    Juggling,
}

impl SubPhase for KeepieUpsPhase {
    fn name(&self) -> &'static str {
        "juggling"
    }
}

#[derive(Debug, Clone)]
enum Driver {
    Ball(Integration),
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub ball: MovingBody,
    /// Ground line y
    pub ground: f32,
    pub kicks: u32,
    pub gravity: f32,
    pub kick: f32,
}

pub struct KeepieUps {
    tuning: KeepieUpsTuning,
    field: Vec2,
    machine: PhaseMachine<KeepieUpsPhase, Driver>,
    ball: MovingBody,
    kicks: u32,
    gravity: f32,
    kick: f32,
    run_started_ms: f64,
    cues: CueSheet,
    effects: Effects,
    summary: Option<GameSummary>,
}

impl KeepieUps {
    pub fn new(field: Vec2, tuning: KeepieUpsTuning) -> Self {
        let radius = field.x.min(field.y) * tuning.ball_scale;
        Self {
            ball: MovingBody::new(field / 2.0, radius),
            gravity: tuning.gravity,
            kick: tuning.kick,
            tuning,
            field,
            machine: PhaseMachine::new(),
            kicks: 0,
            run_started_ms: 0.0,
            cues: CueSheet::default(),
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn kicks(&self) -> u32 {
        self.kicks
    }

    pub fn ball(&self) -> &MovingBody {
        &self.ball
    }

    /// Current (gravity, kick)
    pub fn difficulty(&self) -> (f32, f32) {
        (self.gravity, self.kick)
    }

    fn ground(&self) -> f32 {
        self.field.y - self.tuning.ground_offset
    }

    fn profile(&self) -> Freefall {
        Freefall {
            gravity: self.gravity,
            drag: Vec2::new(self.tuning.horizontal_drag, 1.0),
            bounds: Rect::new(0.0, 0.0, self.field.x, self.ground()),
            wall_restitution: self.tuning.wall_restitution,
            ceiling_restitution: self.tuning.ceiling_restitution,
            floor: Floor::Rest,
        }
    }

    fn kick_at(&mut self, tap: Vec2) {
        self.ball.vel.y = self.kick;
        self.ball.vel.x += (self.ball.pos.x - tap.x) * self.tuning.nudge;
        self.kicks += 1;
        self.effects.kick_ring(self.ball.pos);

        let every = self.tuning.ramp_every.max(1);
        if self.kicks % every == 0 {
            self.gravity += self.tuning.gravity_ramp;
            self.kick = (self.kick + self.tuning.kick_ramp).min(self.tuning.weakest_kick);
            if let Some(Driver::Ball(Integration::Freefall(params))) = self.machine.driver_mut() {
                params.gravity = self.gravity;
            }
            log::debug!("{} kicks: gravity {:.2}, kick {:.1}", self.kicks, self.gravity, self.kick);
        }
    }

    fn game_over(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::GameOver);
        self.effects.miss_puff(env.rng, self.ball.pos);
        let score = f64::from(self.kicks);
        let summary = GameSummary::record(
            GameKind::KeepieUps,
            &high_key(GameKind::KeepieUps.key()),
            Better::Higher,
            score,
            self.kicks.to_string(),
            tier_for(TIERS, score),
            env,
        );
        env.say(&summary.coach_line);
        self.summary = Some(summary);
    }
}

impl MiniGame for KeepieUps {
    fn kind(&self) -> GameKind {
        GameKind::KeepieUps
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() {
            return;
        }
        self.machine.enter(Lifecycle::Setup);
        self.kicks = 0;
        self.gravity = self.tuning.gravity;
        self.kick = self.tuning.kick;
        self.summary = None;
        self.ball.pos = self.field / 2.0;
        self.ball.vel = Vec2::new(0.0, self.tuning.start_vy);
        self.ball.rotation = 0.0;
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.run_started_ms = env.now_ms;
        self.cues = CueSheet::new(&CUES);

        let profile = Integration::Freefall(self.profile());
        self.machine
            .enter_with(Lifecycle::Active(KeepieUpsPhase::Juggling), Driver::Ball(profile));
        log::info!("Keepie-uppies started");
        env.say(INTRO);
    }

    fn handle(&mut self, action: Action, _env: &mut Env<'_>) {
        if !self.machine.is_active(&KeepieUpsPhase::Juggling) {
            return;
        }
        if let Action::PointerDown(tap) = action {
            if tap.distance(self.ball.pos) < self.ball.radius * self.tuning.reach_radii {
                self.kick_at(tap);
            }
        }
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();

        let Some(Driver::Ball(profile)) = self.machine.driver_mut() else {
            return;
        };
        let report = integrate(&mut self.ball, profile);
        self.ball.rotation += self.ball.vel.x * 0.05;

        let kicks = self.kicks;
        if let Some(line) = self.cues.poll(env.now_ms - self.run_started_ms, |cue| kicks >= cue.threshold) {
            env.say(line);
        }

        if report.floor_impact.is_some() {
            self.game_over(env);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            game: GameKind::KeepieUps,
            phase: self.phase_label(),
            hud: vec![format!("Keepie-uppies: {}", self.kicks)],
            countdown: None,
            scene: GameScene::KeepieUps(Scene {
                ball: self.ball.clone(),
                ground: self.ground(),
                kicks: self.kicks,
                gravity: self.gravity,
                kick: self.kick,
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
