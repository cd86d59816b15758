//! Tackle timing
//!
//! An opponent dribbles in from the left and stops in front of the defender.
//! A marker then sweeps a timing bar; tackling while it is inside the green
//! zone wins the ball. The zone shrinks and the marker speeds up each wave.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{Tier, tier_for};
use crate::highscores::{Better, high_key};
use crate::sim::{
    Action, Effects, FrameAnimation, Key, Lifecycle, PhaseMachine, ResultTrack, Round, RoundResult,
    SchedulerStats, SubPhase, TimingMarker,
};
use crate::tuning::TackleTuning;

const INTRO: &str = "Wait for the marker to hit the green zone, then press Space or tap to tackle!";
const WON_COLOR: u32 = 0x2ecc71;
const OPPONENT_START_X: f32 = -30.0;
/// Furthest the defender lunges
const LUNGE_DISTANCE: f32 = 60.0;

const TIERS: &[Tier] = &[
    Tier {
        min: 9.0,
        title: "Tackling Machine!",
        line: "Incredible defending! Nobody gets past you!",
    },
    Tier {
        min: 7.0,
        title: "Solid Defender!",
        line: "Solid defending! Your timing is spot on.",
    },
    Tier {
        min: 5.0,
        title: "Good Work!",
        line: "Good work! Wait for the green zone before you go in.",
    },
    Tier {
        min: 3.0,
        title: "Keep Practising!",
        line: "Keep practising! Timing is everything in a tackle.",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "They Got Past!",
        line: "They got past this time. Stay patient and time your tackle!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacklePhase {
    /// Opponent dribbling in
    Approaching,
    /// Marker sweeping; tackle accepted
    Timing,
}

impl SubPhase for TacklePhase {
    fn name(&self) -> &'static str {
        match self {
            TacklePhase::Approaching => "approaching",
            TacklePhase::Timing => "timing",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Driver {
    Approach,
    Timing,
    Result(FrameAnimation),
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub defender: Vec2,
    pub opponent: Vec2,
    pub marker: Option<TimingMarker>,
    pub wave: u32,
    pub lunge: f32,
    pub results: Vec<Option<RoundResult>>,
    pub last_result: Option<RoundResult>,
}

pub struct Tackle {
    tuning: TackleTuning,
    field: Vec2,
    defender: Vec2,
    machine: PhaseMachine<TacklePhase, Driver>,
    round: Round,
    opponent_x: f32,
    marker: Option<TimingMarker>,
    lunge: f32,
    results: ResultTrack,
    last_result: Option<RoundResult>,
    effects: Effects,
    summary: Option<GameSummary>,
}

impl Tackle {
    pub fn new(field: Vec2, tuning: TackleTuning) -> Self {
        Self {
            results: ResultTrack::new(tuning.waves as usize),
            tuning,
            field,
            defender: Vec2::new(field.x * 0.75, field.y * 0.55),
            machine: PhaseMachine::new(),
            round: Round::first(0.0),
            opponent_x: OPPONENT_START_X,
            marker: None,
            lunge: 0.0,
            last_result: None,
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn tackles(&self) -> u32 {
        self.results.wins()
    }

    pub fn marker(&self) -> Option<&TimingMarker> {
        self.marker.as_ref()
    }

    pub fn opponent(&self) -> Vec2 {
        Vec2::new(self.opponent_x, self.defender.y)
    }

    fn stop_x(&self) -> f32 {
        self.field.x * self.tuning.stop_at
    }

    fn kick_off(&mut self) {
        self.opponent_x = OPPONENT_START_X;
        self.marker = None;
        self.lunge = 0.0;
        self.last_result = None;
        self.machine
            .enter_with(Lifecycle::Active(TacklePhase::Approaching), Driver::Approach);
    }

    fn start_timing<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (width, speed) = self.tuning.difficulty(self.round.difficulty);
        let room = (self.tuning.zone_span - width).max(0.0);
        let zone_start = self.tuning.zone_min_start + rng.random::<f32>() * room;
        self.marker = Some(TimingMarker::new(speed, zone_start, width));
        self.machine
            .enter_with(Lifecycle::Active(TacklePhase::Timing), Driver::Timing);
    }

    fn tackle(&mut self, env: &mut Env<'_>) {
        let Some(marker) = self.marker else {
            return;
        };
        self.machine.enter(Lifecycle::Resolving);
        let result = if marker.in_zone() {
            self.effects.hit_burst(env.rng, self.opponent(), WON_COLOR);
            RoundResult::Won
        } else {
            RoundResult::Lost
        };
        self.results.record(self.round.index as usize, result);
        self.last_result = Some(result);
        log::debug!("Wave {}: {:?} at {:.3}", self.round.index + 1, result, marker.position);
        self.machine.enter_with(
            Lifecycle::Feedback,
            Driver::Result(FrameAnimation::frames(self.tuning.result_ticks)),
        );
    }

    fn next_wave(&mut self, env: &mut Env<'_>) {
        if self.round.index + 1 >= self.tuning.waves {
            self.game_over(env);
            return;
        }
        self.round = self.round.next(env.now_ms);
        self.machine.enter(Lifecycle::Setup);
        self.kick_off();
    }

    fn game_over(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::GameOver);
        let won = self.tackles();
        let summary = GameSummary::record(
            GameKind::Tackle,
            &high_key(GameKind::Tackle.key()),
            Better::Higher,
            f64::from(won),
            format!("{} / {}", won, self.tuning.waves),
            tier_for(TIERS, f64::from(won)),
            env,
        );
        env.say(&summary.coach_line);
        self.summary = Some(summary);
    }
}

enum Next {
    Timing,
    NextWave,
}

impl MiniGame for Tackle {
    fn kind(&self) -> GameKind {
        GameKind::Tackle
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() || self.tuning.waves == 0 {
            return;
        }
        self.machine.enter(Lifecycle::Setup);
        self.results = ResultTrack::new(self.tuning.waves as usize);
        self.summary = None;
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.round = Round::first(env.now_ms);
        self.kick_off();
        log::info!("Tackle started: {} waves", self.tuning.waves);
        env.say(INTRO);
    }

    fn handle(&mut self, action: Action, env: &mut Env<'_>) {
        if !self.machine.is_active(&TacklePhase::Timing) {
            return;
        }
        if matches!(
            action,
            Action::Key(Key::Confirm) | Action::Key(Key::Up) | Action::PointerDown(_)
        ) {
            self.tackle(env);
        }
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();

        let stop = self.stop_x();
        let next = match self.machine.driver_mut() {
            Some(Driver::Approach) => {
                self.opponent_x += self.tuning.approach_speed(self.round.difficulty);
                (self.opponent_x >= stop).then_some(Next::Timing)
            }
            Some(Driver::Timing) => {
                if let Some(marker) = self.marker.as_mut() {
                    marker.tick();
                }
                None
            }
            Some(Driver::Result(hold)) => {
                self.lunge = (self.lunge + self.tuning.lunge_rate).min(1.0);
                let done = hold.advance();
                if self.last_result == Some(RoundResult::Lost)
                    && hold.remaining() > self.tuning.runaway_until as f32
                {
                    self.opponent_x += self.tuning.runaway_speed;
                }
                done.then_some(Next::NextWave)
            }
            None => None,
        };
        match next {
            Some(Next::Timing) => {
                self.opponent_x = stop;
                self.start_timing(env.rng);
            }
            Some(Next::NextWave) => self.next_wave(env),
            None => {}
        }
    }

    fn snapshot(&self) -> Snapshot {
        let lunge_offset = (self.lunge * std::f32::consts::PI).sin() * LUNGE_DISTANCE;
        Snapshot {
            game: GameKind::Tackle,
            phase: self.phase_label(),
            hud: vec![
                format!("Tackles: {}", self.tackles()),
                format!("Wave {} / {}", (self.round.index + 1).min(self.tuning.waves), self.tuning.waves),
            ],
            countdown: None,
            scene: GameScene::Tackle(Scene {
                defender: self.defender - Vec2::new(lunge_offset, 0.0),
                opponent: self.opponent(),
                marker: self.marker,
                wave: self.round.index + 1,
                lunge: self.lunge,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::*;
    use crate::sim::InputEvent;

    fn started(seed: u64) -> TestSession<Tackle> {
        let mut s = session(Tackle::new(Vec2::new(550.0, 420.0), TackleTuning::default()), seed);
        s.start(0.0);
        s
    }

    fn until_timing(s: &mut TestSession<Tackle>, now: f64) -> f64 {
        run_until(s, now, 400, |s| s.game().phase_label() == "timing")
    }

    fn press(s: &mut TestSession<Tackle>, now: f64) {
        s.input(&InputEvent::KeyDown(Key::Confirm), now);
    }

    #[test]
    fn test_opponent_stops_in_front_of_defender() {
        let mut s = started(1);
        until_timing(&mut s, 0.0);
        assert_eq!(s.game().opponent().x, 550.0 * 0.42);
        let marker = s.game().marker().unwrap();
        assert!((marker.zone_width - 0.3).abs() < 1e-6);
        assert!(marker.zone_start >= 0.15 && marker.zone_end() <= 0.85 + 1e-6);
    }

    #[test]
    fn test_tackle_ignored_while_approaching() {
        let mut s = started(2);
        run_frames(&mut s, 0.0, 10);
        let before = fingerprint(&s);
        press(&mut s, 200.0);
        s.input(&InputEvent::PointerDown { x: 10.0, y: 10.0 }, 200.0);
        assert_eq!(fingerprint(&s), before);
    }

    #[test]
    fn test_tackle_in_zone_wins() {
        let mut s = started(3);
        let now = until_timing(&mut s, 0.0);
        let now = run_until(&mut s, now, 400, |s| s.game().marker().is_some_and(|m| m.in_zone()));
        press(&mut s, now);
        assert_eq!(s.game().tackles(), 1);
        assert_eq!(s.game().phase_label(), "feedback");
        assert_driver_accounting(&s);
    }

    #[test]
    fn test_early_tackle_loses_and_opponent_runs_on() {
        let mut s = started(4);
        let now = until_timing(&mut s, 0.0);
        // Marker starts at 0, left of any zone
        press(&mut s, now);
        assert_eq!(s.game().tackles(), 0);
        assert_eq!(s.game().last_result, Some(RoundResult::Lost));

        let stopped = s.game().opponent().x;
        run_frames(&mut s, now, 60);
        // 49 ticks of the 70-tick hold, 2 px each
        assert!((s.game().opponent().x - stopped - 98.0).abs() < 1e-3);

        // A second press during the result does nothing
        let before = fingerprint(&s);
        press(&mut s, now + 1000.0);
        assert_eq!(fingerprint(&s), before);
    }

    #[test]
    fn test_ten_waves_then_summary() {
        let mut s = started(5);
        let mut now = 0.0;
        for wave in 0..10 {
            now = until_timing(&mut s, now);
            if wave < 7 {
                now = run_until(&mut s, now, 400, |s| s.game().marker().is_some_and(|m| m.in_zone()));
            }
            press(&mut s, now);
            now = run_until(&mut s, now, 200, |s| {
                matches!(s.game().phase_label(), "approaching" | "game_over")
            });
            assert_driver_accounting(&s);
        }
        assert_eq!(s.game().phase_label(), "game_over");
        let summary = s.game().summary().unwrap();
        assert_eq!(summary.score_text, "7 / 10");
        assert_eq!(summary.title, "Solid Defender!");
        assert_eq!(s.game().pending_drivers(), 0);
    }
}
