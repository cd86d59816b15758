//! The six mini-games and the session that drives one of them
//!
//! Each game is a value implementing [`MiniGame`]. It owns its
//! [`PhaseMachine`](crate::sim::PhaseMachine), entities and counters; the
//! [`Session`] owns everything around it (clock, RNG, input router, score
//! store, coach sink, settings) and lends those out through [`Env`] on every
//! call.

pub mod dribble;
pub mod formation;
pub mod goalkeeper;
pub mod keepie_ups;
pub mod shooting;
pub mod tackle;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::coach::{self, AckTicket, CoachQueue, Notifier, Prompt, Tier};
use crate::highscores::{Better, ScoreStore};
use crate::settings::Settings;
use crate::sim::{Action, Effects, FrameClock, InputEvent, InputRouter, SchedulerStats, Viewport};
use crate::tuning::Tuning;

pub use dribble::Dribble;
pub use formation::Formation;
pub use goalkeeper::Goalkeeper;
pub use keepie_ups::KeepieUps;
pub use shooting::Shooting;
pub use tackle::Tackle;

/// Which mini-game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Shooting,
    Dribble,
    KeepieUps,
    Goalkeeper,
    Tackle,
    Formation,
}

impl GameKind {
    pub const ALL: [GameKind; 6] = [
        GameKind::Shooting,
        GameKind::Dribble,
        GameKind::KeepieUps,
        GameKind::Goalkeeper,
        GameKind::Tackle,
        GameKind::Formation,
    ];

    /// Storage key stem
    pub fn key(self) -> &'static str {
        match self {
            GameKind::Shooting => "shooting",
            GameKind::Dribble => "dribble",
            GameKind::KeepieUps => "keepieups",
            GameKind::Goalkeeper => "goalkeeper",
            GameKind::Tackle => "tackle",
            GameKind::Formation => "formation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::Shooting => "Shooting Practice",
            GameKind::Dribble => "Dribble Maze",
            GameKind::KeepieUps => "Keepie-Uppies",
            GameKind::Goalkeeper => "Goalkeeper",
            GameKind::Tackle => "Tackle Time",
            GameKind::Formation => "Formation Frenzy",
        }
    }

    /// Logical playfield used when the page does not dictate one
    pub fn default_playfield(self) -> Vec2 {
        match self {
            GameKind::Shooting => Vec2::new(550.0, 650.0),
            GameKind::Dribble => Vec2::new(500.0, 550.0),
            GameKind::KeepieUps => Vec2::new(500.0, 600.0),
            GameKind::Goalkeeper => Vec2::new(550.0, 500.0),
            GameKind::Tackle => Vec2::new(550.0, 420.0),
            GameKind::Formation => Vec2::new(450.0, 600.0),
        }
    }

    /// Build the game for a playfield of `size`
    pub fn create(self, tuning: &Tuning, size: Vec2) -> Box<dyn MiniGame> {
        match self {
            GameKind::Shooting => Box::new(Shooting::new(size, tuning.shooting.clone())),
            GameKind::Dribble => Box::new(Dribble::new(size, tuning.dribble.clone())),
            GameKind::KeepieUps => Box::new(KeepieUps::new(size, tuning.keepie_ups.clone())),
            GameKind::Goalkeeper => Box::new(Goalkeeper::new(size, tuning.goalkeeper.clone())),
            GameKind::Tackle => Box::new(Tackle::new(size, tuning.tackle.clone())),
            GameKind::Formation => Box::new(Formation::new(size, tuning.formation.clone())),
        }
    }
}

/// End-of-run verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game: GameKind,
    pub score: f64,
    /// Score as shown ("7 / 10", "12.4s", ...)
    pub score_text: String,
    /// Stored best after this run was recorded
    pub best: Option<f64>,
    pub new_best: bool,
    pub title: String,
    pub coach_line: String,
    /// Level unlocked by this run, for levelled games
    pub next_level: Option<u32>,
}

impl GameSummary {
    /// Save `score` under `key` if it is a new best and build the summary
    pub(crate) fn record(
        game: GameKind,
        key: &str,
        mode: Better,
        score: f64,
        score_text: String,
        verdict: Option<&Tier>,
        env: &mut Env<'_>,
    ) -> Self {
        let new_best = env.store.save_if_best(key, score, mode);
        let best = env.store.get_best(key, mode);
        log::info!(
            "{} over: {} (best {:?}{})",
            game.title(),
            score_text,
            best,
            if new_best { ", new best" } else { "" }
        );
        Self {
            game,
            score,
            score_text,
            best,
            new_best,
            title: verdict.map(|t| t.title.to_string()).unwrap_or_default(),
            coach_line: verdict.map(|t| t.line.to_string()).unwrap_or_default(),
            next_level: None,
        }
    }
}

/// Per-game scene contents of a snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scene {
    Shooting(shooting::Scene),
    Dribble(dribble::Scene),
    KeepieUps(keepie_ups::Scene),
    Goalkeeper(goalkeeper::Scene),
    Tackle(tackle::Scene),
    Formation(formation::Scene),
}

/// Read-only view of a game for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub game: GameKind,
    pub phase: &'static str,
    /// HUD lines ("Score: 40", "Shots: 6")
    pub hud: Vec<String>,
    /// Fraction of the running countdown left, if one is running
    pub countdown: Option<f32>,
    pub scene: Scene,
    pub effects: Effects,
    pub summary: Option<GameSummary>,
}

/// Everything a game may touch besides itself
pub struct Env<'a> {
    /// Wall-clock time of this call (ms)
    pub now_ms: f64,
    pub rng: &'a mut Pcg32,
    pub store: &'a mut ScoreStore,
    pub coach: &'a mut dyn Notifier,
    pub settings: &'a Settings,
    /// Composite direction of the held keys
    pub movement: Vec2,
}

impl Env<'_> {
    /// Plain coach message, if the player wants them
    pub fn say(&mut self, line: &str) {
        if self.settings.coach_messages && !line.is_empty() {
            self.coach.notify(line, coach::display_ms(line));
        }
    }

    /// Acknowledgement prompt; always shown since progress waits on it
    pub fn ask(&mut self, ticket: AckTicket, prompt: &Prompt) {
        self.coach.prompt(ticket, prompt);
    }
}

/// A mini-game driven by a [`Session`]
pub trait MiniGame {
    fn kind(&self) -> GameKind;

    /// Logical playfield size
    fn playfield(&self) -> Vec2;

    /// Pick the level the next run starts at; false if not levelled, out of
    /// range, or a run is in progress
    fn select_level(&mut self, _level: u32) -> bool {
        false
    }

    /// Begin a run; ignored unless idle or over
    fn start(&mut self, env: &mut Env<'_>);

    /// React to input; out-of-phase input is a no-op
    fn handle(&mut self, action: Action, env: &mut Env<'_>);

    /// Advance one fixed frame
    fn tick(&mut self, env: &mut Env<'_>);

    /// A prompt was answered; unknown tickets are ignored
    fn acknowledge(&mut self, _ticket: AckTicket, _env: &mut Env<'_>) {}

    fn snapshot(&self) -> Snapshot;

    fn phase_label(&self) -> &'static str;

    /// Idle or over, so a new run may begin
    fn can_start(&self) -> bool;

    fn scheduler_stats(&self) -> SchedulerStats;

    /// Live per-frame drivers (0 or 1)
    fn pending_drivers(&self) -> usize;

    fn summary(&self) -> Option<&GameSummary>;
}

impl<G: MiniGame + ?Sized> MiniGame for Box<G> {
    fn kind(&self) -> GameKind {
        (**self).kind()
    }
    fn playfield(&self) -> Vec2 {
        (**self).playfield()
    }
    fn select_level(&mut self, level: u32) -> bool {
        (**self).select_level(level)
    }
    fn start(&mut self, env: &mut Env<'_>) {
        (**self).start(env)
    }
    fn handle(&mut self, action: Action, env: &mut Env<'_>) {
        (**self).handle(action, env)
    }
    fn tick(&mut self, env: &mut Env<'_>) {
        (**self).tick(env)
    }
    fn acknowledge(&mut self, ticket: AckTicket, env: &mut Env<'_>) {
        (**self).acknowledge(ticket, env)
    }
    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }
    fn phase_label(&self) -> &'static str {
        (**self).phase_label()
    }
    fn can_start(&self) -> bool {
        (**self).can_start()
    }
    fn scheduler_stats(&self) -> SchedulerStats {
        (**self).scheduler_stats()
    }
    fn pending_drivers(&self) -> usize {
        (**self).pending_drivers()
    }
    fn summary(&self) -> Option<&GameSummary> {
        (**self).summary()
    }
}

/// One game plus the clock, RNG, input, store and coach around it
pub struct Session<G: MiniGame = Box<dyn MiniGame>, N: Notifier = CoachQueue> {
    game: G,
    seed: u64,
    rng: Pcg32,
    router: InputRouter,
    clock: FrameClock,
    store: ScoreStore,
    coach: N,
    settings: Settings,
    frames: u64,
}

impl<G: MiniGame, N: Notifier + Default> Session<G, N> {
    /// Session with an in-memory store and default settings
    pub fn headless(game: G, seed: u64) -> Self {
        Self::new(game, seed, ScoreStore::in_memory(), N::default(), Settings::default())
    }
}

impl<G: MiniGame, N: Notifier> Session<G, N> {
    pub fn new(game: G, seed: u64, store: ScoreStore, coach: N, settings: Settings) -> Self {
        let viewport = Viewport::identity(game.playfield());
        log::info!("{} session created with seed {}", game.kind().title(), seed);
        Self {
            game,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            router: InputRouter::new(viewport),
            clock: FrameClock::new(),
            store,
            coach,
            settings,
            frames: 0,
        }
    }

    /// Run `f` against the game with an [`Env`] borrowed from the session
    fn with_env<R>(&mut self, now_ms: f64, f: impl FnOnce(&mut G, &mut Env<'_>) -> R) -> R {
        let mut env = Env {
            now_ms,
            rng: &mut self.rng,
            store: &mut self.store,
            coach: &mut self.coach,
            settings: &self.settings,
            movement: self.router.movement(),
        };
        f(&mut self.game, &mut env)
    }

    /// Start (or restart) a run
    pub fn start(&mut self, now_ms: f64) {
        if !self.game.can_start() {
            log::debug!("Start ignored while {}", self.game.phase_label());
            return;
        }
        self.router.release_all();
        self.clock.reset();
        self.coach.clear();
        self.with_env(now_ms, |game, env| game.start(env));
    }

    pub fn select_level(&mut self, level: u32) -> bool {
        self.game.select_level(level)
    }

    /// Feed one raw input event
    pub fn input(&mut self, event: &InputEvent, now_ms: f64) {
        if let Some(action) = self.router.route(event) {
            self.with_env(now_ms, |game, env| game.handle(action, env));
        }
    }

    /// Display refresh at `now_ms`; runs the fixed frames it covers
    pub fn frame(&mut self, now_ms: f64) -> u32 {
        let frames = self.clock.advance(now_ms);
        for _ in 0..frames {
            self.step(now_ms);
        }
        frames
    }

    /// Exactly one fixed frame
    pub fn step(&mut self, now_ms: f64) {
        self.frames += 1;
        self.with_env(now_ms, |game, env| game.tick(env));
    }

    /// Hand a prompt's ticket back
    pub fn acknowledge(&mut self, ticket: AckTicket, now_ms: f64) {
        self.coach.dismiss(ticket);
        self.with_env(now_ms, |game, env| game.acknowledge(ticket, env));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.router.set_viewport(viewport);
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fixed frames run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ScoreStore {
        &mut self.store
    }

    pub fn coach(&self) -> &N {
        &self.coach
    }

    pub fn coach_mut(&mut self) -> &mut N {
        &mut self.coach
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
