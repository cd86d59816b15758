//! Dribble maze
//!
//! Steer through a field of cones to the goal with the arrow keys. Each cone
//! touched adds a time penalty once. Three levels with more cones each; every
//! level keeps its own best time.

use glam::Vec2;
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{Tier, tier_for};
use crate::consts::PLACEMENT_ATTEMPTS;
use crate::highscores::{Better, high_key, level_key};
use crate::round_tenths;
use crate::sim::{
    Action, Clearance, Effects, Floor, Freefall, Integration, Lifecycle, MovingBody, PhaseMachine,
    Rect, Round, SchedulerStats, SubPhase, Target, integrate, point_in_rect, scatter,
};
use crate::tuning::DribbleTuning;

const CONE_COLOR: u32 = 0xff6b1a;

const TIPS: [&str; 3] = [
    "Use the arrow keys or WASD to dribble round the cones to the goal!",
    "More cones this time. Take it steady and keep the ball close!",
    "The full maze! Keep your head up and plan your route.",
];

/// Banded on the negated penalty count
const TIERS: &[Tier] = &[
    Tier {
        min: 0.0,
        title: "Clean Run!",
        line: "Perfect! Not a single cone touched. Close control like that wins matches!",
    },
    Tier {
        min: -2.0,
        title: "Nice Dribbling!",
        line: "Great dribbling! Just a couple of touches. Keep the ball a bit closer!",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "Level Complete!",
        line: "You made it! Slow down a little and keep the ball close to your feet.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DribblePhase {
    Running,
}

impl SubPhase for DribblePhase {
    fn name(&self) -> &'static str {
        "running"
    }
}

#[derive(Debug, Clone)]
enum Driver {
    /// Player movement; zero gravity, velocity reset every frame
    Run(Integration),
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub level: u32,
    pub player: MovingBody,
    pub cones: Vec<Target>,
    pub goal: Rect,
    pub start: Vec2,
    pub elapsed_secs: f64,
    pub penalties: u32,
}

pub struct Dribble {
    tuning: DribbleTuning,
    field: Vec2,
    goal: Rect,
    start: Vec2,
    machine: PhaseMachine<DribblePhase, Driver>,
    level: u32,
    round: Round,
    player: MovingBody,
    cones: Vec<Target>,
    penalties: u32,
    elapsed_secs: f64,
    effects: Effects,
    summary: Option<GameSummary>,
}

impl Dribble {
    pub fn new(field: Vec2, tuning: DribbleTuning) -> Self {
        let m = tuning.margin;
        let goal = Rect::new(field.x - m - tuning.goal_size, m, tuning.goal_size, tuning.goal_size);
        let start = Vec2::new(m + 20.0, field.y - m - 20.0);
        Self {
            player: MovingBody::new(start, tuning.player_size),
            tuning,
            field,
            goal,
            start,
            machine: PhaseMachine::new(),
            level: 1,
            round: Round::first(0.0),
            cones: Vec::new(),
            penalties: 0,
            elapsed_secs: 0.0,
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn cones(&self) -> &[Target] {
        &self.cones
    }

    pub fn penalties(&self) -> u32 {
        self.penalties
    }

    pub fn player(&self) -> &MovingBody {
        &self.player
    }

    fn movement_profile(&self) -> Integration {
        let inset = (self.tuning.edge_clamp - self.tuning.player_size).max(0.0);
        let field = Rect::new(0.0, 0.0, self.field.x, self.field.y);
        Integration::Freefall(Freefall {
            gravity: 0.0,
            drag: Vec2::ZERO,
            bounds: field.inset(inset).unwrap_or(field),
            wall_restitution: 0.0,
            ceiling_restitution: 0.0,
            floor: Floor::Rest,
        })
    }

    fn place_cones(&mut self, env: &mut Env<'_>) {
        let t = &self.tuning;
        let index = (self.level as usize).saturating_sub(1);
        let count = t.cones_per_level.get(index).copied().unwrap_or(0);
        let field = Rect::new(0.0, 0.0, self.field.x, self.field.y);
        let bounds = field.inset(t.margin - t.cone_radius).unwrap_or(field);
        let zones = [
            Clearance::new(self.start, t.clearance),
            Clearance::new(self.goal.center(), t.clearance),
        ];
        let gap = (t.cone_separation - 2.0 * t.cone_radius).max(0.0);

        self.cones = scatter(env.rng, &bounds, &vec![t.cone_radius; count], gap, &zones, PLACEMENT_ATTEMPTS)
            .into_iter()
            .map(|c| Target::new(c, 1, CONE_COLOR))
            .collect();
        log::debug!("Level {}: {} of {} cones placed", self.level, self.cones.len(), count);
    }

    fn finish_level(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::Resolving);

        let time = round_tenths(
            self.round.elapsed_ms(env.now_ms) / 1000.0 + f64::from(self.penalties) * self.tuning.penalty_secs,
        );
        let stars = (100.0 / time.max(0.1)).round().max(1.0);
        env.store.save_if_best(&high_key(GameKind::Dribble.key()), stars, Better::Higher);

        self.machine.enter(Lifecycle::GameOver);
        let mut summary = GameSummary::record(
            GameKind::Dribble,
            &level_key(GameKind::Dribble.key(), self.level),
            Better::Lower,
            time,
            format!("{:.1}s", time),
            tier_for(TIERS, -f64::from(self.penalties)),
            env,
        );
        summary.next_level = (self.level < self.tuning.levels()).then_some(self.level + 1);
        env.say(&summary.coach_line);
        self.summary = Some(summary);
    }
}

impl MiniGame for Dribble {
    fn kind(&self) -> GameKind {
        GameKind::Dribble
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn select_level(&mut self, level: u32) -> bool {
        if !self.machine.phase().can_start() || level == 0 || level > self.tuning.levels() {
            return false;
        }
        self.level = level;
        true
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() {
            return;
        }
        self.machine.enter(Lifecycle::Setup);
        self.summary = None;
        self.penalties = 0;
        self.elapsed_secs = 0.0;
        self.player = MovingBody::new(self.start, self.tuning.player_size);
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.place_cones(env);

        self.round = Round {
            index: self.level - 1,
            difficulty: self.level - 1,
            started_at_ms: env.now_ms,
        };
        let profile = self.movement_profile();
        self.machine
            .enter_with(Lifecycle::Active(DribblePhase::Running), Driver::Run(profile));
        log::info!("Dribble level {} started", self.level);
        let tip = TIPS[(self.level as usize - 1).min(TIPS.len() - 1)];
        env.say(tip);
    }

    fn handle(&mut self, _action: Action, _env: &mut Env<'_>) {
        // Movement comes from the held keys in `Env::movement`
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();
        for cone in &mut self.cones {
            cone.settle(0.05);
        }

        let Some(Driver::Run(profile)) = self.machine.driver_mut() else {
            return;
        };
        self.player.vel = env.movement * self.tuning.player_speed;
        integrate(&mut self.player, profile);
        self.elapsed_secs = self.round.elapsed_ms(env.now_ms) / 1000.0;

        let reach = self.tuning.player_size;
        for cone in &mut self.cones {
            if !cone.hit && self.player.pos.distance(cone.center()) < reach + cone.shape.radius / 2.0 {
                cone.strike();
                self.penalties += 1;
                self.effects.popup(cone.center(), self.tuning.penalty_secs as u32);
                log::debug!("Cone touched ({} penalties)", self.penalties);
            }
        }

        if point_in_rect(self.player.pos, &self.goal) {
            self.finish_level(env);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            game: GameKind::Dribble,
            phase: self.phase_label(),
            hud: vec![
                format!("Level {}", self.level),
                format!("Time: {:.1}s", self.elapsed_secs),
                format!("Penalties: {}", self.penalties),
            ],
            countdown: None,
            scene: GameScene::Dribble(Scene {
                level: self.level,
                player: self.player.clone(),
                cones: self.cones.clone(),
                goal: self.goal,
                start: self.start,
                elapsed_secs: self.elapsed_secs,
                penalties: self.penalties,
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
