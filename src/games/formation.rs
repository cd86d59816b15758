//! Formation memory
//!
//! Each round shows some of the team in their positions, hides them, and asks
//! the player to drag everyone from the bench back into place before the
//! clock runs out. Coach Andy talks between rounds; every one of his prompts
//! has to be acknowledged before play moves on.

use std::cmp::Ordering;

use glam::Vec2;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Serialize;

use super::{Env, GameKind, GameSummary, MiniGame, Scene as GameScene, Snapshot};
use crate::coach::{AckTicket, Prompt, TicketBook, Tier, tier_for};
use crate::frames_for_ms;
use crate::highscores::{Better, high_key};
use crate::sim::{
    Action, BenchLayout, Effects, FrameAnimation, Hand, Lifecycle, PhaseMachine, PlacementBoard,
    Round, SchedulerStats, SubPhase,
};
use crate::tuning::FormationTuning;

struct GridSlot {
    x: f32,
    y: f32,
    name: &'static str,
}

/// Every position a round can use, in playfield fractions
const GRID: [GridSlot; 10] = [
    GridSlot { x: 0.2, y: 0.15, name: "Left Wing" },
    GridSlot { x: 0.5, y: 0.12, name: "Centre Forward" },
    GridSlot { x: 0.8, y: 0.15, name: "Right Wing" },
    GridSlot { x: 0.2, y: 0.38, name: "Left Midfield" },
    GridSlot { x: 0.5, y: 0.35, name: "Centre Mid" },
    GridSlot { x: 0.8, y: 0.38, name: "Right Midfield" },
    GridSlot { x: 0.2, y: 0.6, name: "Left Back" },
    GridSlot { x: 0.5, y: 0.58, name: "Centre Back" },
    GridSlot { x: 0.8, y: 0.6, name: "Right Back" },
    GridSlot { x: 0.5, y: 0.82, name: "Goalkeeper" },
];

const PLAYERS: [&str; 10] = [
    "Saoirse", "Alessia", "Clara", "Orla", "Elspeth", "Olivia", "Chloe", "Becky", "Vivienne", "Helena",
];

const COACH: &str = "Coach Andy";
const TEAM: &str = "Meerkats";

struct Ramble {
    andy: &'static str,
    interrupt: &'static str,
}

const OPENING: &[Ramble] = &[
    Ramble {
        andy: "Right, Meerkats, formations are VERY important. When I played for the county under-12s we lined up 4-3-3. It was pouring down and I'd forgotten my shinpads, so I used rolled-up newspapers and...",
        interrupt: "ANDY! Just tell us where to stand!",
    },
    Ramble {
        andy: "Formations are all about shape. Diamonds, triangles, never rectangles, rectangles are for doors. Which reminds me, the kitchen window needs fixing this weekend...",
        interrupt: "Coach Andy, we get it! Show us!",
    },
    Ramble {
        andy: "Positioning is everything. I once stood in the wrong place for a whole half and nobody noticed until the ref asked why we had two goalkeepers...",
        interrupt: "ANDY!! Just show us where to go!",
    },
];

const SHOWING: &[Ramble] = &[
    Ramble {
        andy: "See those spots? Memorise them! Like my shopping list. Except I always forget the milk. Every single time...",
        interrupt: "We're LOOKING, Andy! Shh!",
    },
    Ramble {
        andy: "Watch where everyone goes, it's crucial. Almost as crucial as remembering where I parked at the supermarket. Forty-five minutes, that took...",
        interrupt: "ANDY! We're trying to concentrate!",
    },
    Ramble {
        andy: "Brain power! Did you know goldfish have quite good memories? My uncle had one called Kevin who...",
        interrupt: "Nobody cares about Kevin the fish! We're memorising!",
    },
];

const ALL_CORRECT: &[Ramble] = &[
    Ramble {
        andy: "Brilliant! Perfect positions! Better than when I put the barbecue right next to the fence and the neighbours called the fire brigade...",
        interrupt: "Thanks Andy! Next round!",
    },
    Ramble {
        andy: "YES! Nailed it! Better than the shelf I nailed up, which fell down at 3am and scared the cat so badly...",
        interrupt: "ANDY! Can we just play?!",
    },
];

const PARTLY_CORRECT: &[Ramble] = &[
    Ramble {
        andy: "Not bad! Some right is better than none. Like my third driving test, when the examiner said I was improving...",
        interrupt: "Just show us the next one, Andy!",
    },
    Ramble {
        andy: "Almost! Mistakes help you learn. I once put salt in my tea instead of sugar. Then again the next day. And the day after...",
        interrupt: "Salt and sugar THREE times?! Next round!",
    },
];

const MOSTLY_WRONG: &[Ramble] = &[
    Ramble {
        andy: "Hmm, not quite, but that's how we learn! I once wore my shirt inside out to work all day and nobody said a word until...",
        interrupt: "ANDY PLEASE! Let us try again!",
    },
    Ramble {
        andy: "A bit muddled there! Even the best get confused. I once celebrated a goal the whole length of the pitch before I saw the offside flag...",
        interrupt: "We don't need the life story! Again!",
    },
];

const FAREWELL: &[Ramble] = &[
    Ramble {
        andy: "Well done, Meerkats! What a session! Reminds me of my 1000-piece jigsaw. Three pieces missing, and one turned up in the dog's bed...",
        interrupt: "GREAT GAME EVERYONE! Ignore Andy!",
    },
    Ramble {
        andy: "Fantastic effort! I'm so proud I could cry. I did cry at a match once, but that was the ball in the face during the warm-up...",
        interrupt: "Oh here we go again... WELL DONE MEERKATS!",
    },
];

const TIERS: &[Tier] = &[
    Tier {
        min: 200.0,
        title: "Tactical Genius!",
        line: "Tactical genius! You'd make a brilliant captain.",
    },
    Tier {
        min: 150.0,
        title: "Formation Expert!",
        line: "Formation expert! You know exactly where everyone stands.",
    },
    Tier {
        min: 100.0,
        title: "Good Memory!",
        line: "Good memory! Most of the team were in the right place.",
    },
    Tier {
        min: 50.0,
        title: "Keep Learning!",
        line: "Keep learning! Picture the pitch in thirds to help you remember.",
    },
    Tier {
        min: f64::NEG_INFINITY,
        title: "Keep Practising!",
        line: "Keep practising! Say the positions out loud while you memorise.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormationPhase {
    /// Coach talking before the formation is shown
    Briefing,
    /// Formation on show until the player is ready
    Memorise,
    /// Dragging players from the bench, against the clock
    Placing,
}

impl SubPhase for FormationPhase {
    fn name(&self) -> &'static str {
        match self {
            FormationPhase::Briefing => "briefing",
            FormationPhase::Memorise => "memorise",
            FormationPhase::Placing => "placing",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Driver {
    /// Result on the pitch before the coach reacts
    Hold(FrameAnimation),
}

/// What an outstanding prompt unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Await {
    Briefing,
    Memorise,
    Verdict,
    Farewell,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub pos: Vec2,
    pub position: &'static str,
    /// Who belongs here; only while it may be seen
    pub expected: Option<&'static str>,
    pub occupant: Option<&'static str>,
    /// Set once the round is marked
    pub correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchView {
    pub pos: Vec2,
    pub player: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub round: u32,
    pub rounds: u32,
    pub score: u32,
    pub slots: Vec<SlotView>,
    pub bench: Vec<BenchView>,
    pub hand: Option<Hand>,
    pub held_player: Option<&'static str>,
    pub last_correct: Option<usize>,
}

pub struct Formation {
    tuning: FormationTuning,
    field: Vec2,
    machine: PhaseMachine<FormationPhase, Driver>,
    round: Round,
    /// Grid indices used this round, in row then column order
    positions: Vec<usize>,
    names: Vec<&'static str>,
    board: Option<PlacementBoard>,
    score: u32,
    last_correct: Option<usize>,
    tickets: TicketBook,
    pending: Option<(AckTicket, Await)>,
    effects: Effects,
    summary: Option<GameSummary>,
}

/// Row first (rows differ by more than 0.1), then left to right
fn row_then_column(a: &GridSlot, b: &GridSlot) -> Ordering {
    if (a.y - b.y).abs() > 0.1 {
        a.y.total_cmp(&b.y)
    } else {
        a.x.total_cmp(&b.x)
    }
}

impl Formation {
    pub fn new(field: Vec2, tuning: FormationTuning) -> Self {
        Self {
            tuning,
            field,
            machine: PhaseMachine::new(),
            round: Round::first(0.0),
            positions: Vec::new(),
            names: Vec::new(),
            board: None,
            score: 0,
            last_correct: None,
            tickets: TicketBook::default(),
            pending: None,
            effects: Effects::default(),
            summary: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn board(&self) -> Option<&PlacementBoard> {
        self.board.as_ref()
    }

    fn rounds(&self) -> u32 {
        self.tuning.round_sizes.len() as u32
    }

    fn bench_layout(&self) -> BenchLayout {
        BenchLayout {
            y: self.field.y - self.tuning.bench_offset,
            width: self.field.x,
            max_spacing: self.tuning.bench_spacing,
        }
    }

    fn slot_pos(&self, grid: usize) -> Vec2 {
        let g = &GRID[grid];
        Vec2::new(g.x * self.field.x, g.y * self.field.y)
    }

    fn ask(&mut self, env: &mut Env<'_>, prompt: Prompt, then: Await) {
        let ticket = self.tickets.issue();
        env.ask(ticket, &prompt);
        self.pending = Some((ticket, then));
    }

    fn ramble(&mut self, env: &mut Env<'_>, rambles: &[Ramble], then: Await) {
        let Some(r) = rambles.choose(env.rng) else {
            return;
        };
        let prompt = Prompt::new(COACH, r.andy, "OK").interrupted_by(TEAM, r.interrupt, "OK");
        self.ask(env, prompt, then);
    }

    fn setup_round(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::Setup);
        let wanted = self
            .tuning
            .round_sizes
            .get(self.round.index as usize)
            .copied()
            .unwrap_or_default()
            .min(GRID.len());

        let mut picks: Vec<usize> = (0..GRID.len()).collect();
        picks.shuffle(env.rng);
        picks.truncate(wanted);
        picks.sort_by(|a, b| row_then_column(&GRID[*a], &GRID[*b]));
        self.positions = picks;

        let mut names = PLAYERS.to_vec();
        names.shuffle(env.rng);
        names.truncate(wanted);
        self.names = names;
        self.board = None;
        self.last_correct = None;

        log::info!("Formation round {}: {} players", self.round.index + 1, wanted);
        self.machine.enter(Lifecycle::Active(FormationPhase::Briefing));
        let rambles = if self.round.index == 0 { OPENING } else { SHOWING };
        self.ramble(env, rambles, Await::Briefing);
    }

    fn show_formation(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::Active(FormationPhase::Memorise));
        let prompt = Prompt::new(
            "Memorise!",
            "Study the formation... press Ready when you've got it!",
            "Ready!",
        );
        self.ask(env, prompt, Await::Memorise);
    }

    fn start_placing(&mut self, env: &mut Env<'_>) {
        let slots: Vec<Vec2> = self.positions.iter().map(|&g| self.slot_pos(g)).collect();
        let count = slots.len();
        self.board = Some(PlacementBoard::shuffled(
            env.rng,
            slots,
            self.tuning.snap_radius,
            self.tuning.pick_radius,
        ));
        self.machine.enter(Lifecycle::Active(FormationPhase::Placing));
        let time = self.tuning.placing_time_ms(count, self.round.index);
        self.machine.start_countdown(env.now_ms, time);
        log::debug!("Placing {} players in {:.1}s", count, time / 1000.0);
    }

    fn time_up(&mut self, env: &mut Env<'_>) {
        if let Some(board) = self.board.as_mut() {
            let filled = board.auto_fill(env.rng);
            log::debug!("Time up: auto-filled {} slots", filled);
        }
        self.mark();
    }

    fn mark(&mut self) {
        self.machine.enter(Lifecycle::Resolving);
        let Some(board) = self.board.as_mut() else {
            return;
        };
        board.return_hand();
        let correct = board.correct_count();
        let points = board.score(self.tuning.per_correct, self.tuning.bonus_per_slot);
        self.score += points;
        self.last_correct = Some(correct);
        for (i, slot) in board.slots().iter().enumerate() {
            if board.assignment()[i] == Some(i) {
                self.effects.popup(*slot, self.tuning.per_correct);
            }
        }
        log::info!(
            "Round {}: {}/{} correct, +{} (score {})",
            self.round.index + 1,
            correct,
            board.slots().len(),
            points,
            self.score
        );
        let hold = frames_for_ms(self.tuning.feedback_ms);
        self.machine
            .enter_with(Lifecycle::Feedback, Driver::Hold(FrameAnimation::frames(hold)));
    }

    fn verdict(&mut self, env: &mut Env<'_>) {
        // Drop the hold; the prompt now gates progress
        self.machine.enter(Lifecycle::Feedback);
        let total = self.positions.len().max(1);
        let correct = self.last_correct.unwrap_or(0);
        let rambles = if correct == total {
            ALL_CORRECT
        } else if correct * 2 >= total {
            PARTLY_CORRECT
        } else {
            MOSTLY_WRONG
        };
        self.ramble(env, rambles, Await::Verdict);
    }

    fn next_round(&mut self, env: &mut Env<'_>) {
        if self.round.index + 1 >= self.rounds() {
            self.game_over(env);
            return;
        }
        self.round = self.round.next(env.now_ms);
        self.setup_round(env);
    }

    fn game_over(&mut self, env: &mut Env<'_>) {
        self.machine.enter(Lifecycle::GameOver);
        let score = f64::from(self.score);
        self.summary = Some(GameSummary::record(
            GameKind::Formation,
            &high_key(GameKind::Formation.key()),
            Better::Higher,
            score,
            self.score.to_string(),
            tier_for(TIERS, score),
            env,
        ));
        self.ramble(env, FAREWELL, Await::Farewell);
    }
}

impl MiniGame for Formation {
    fn kind(&self) -> GameKind {
        GameKind::Formation
    }

    fn playfield(&self) -> Vec2 {
        self.field
    }

    fn start(&mut self, env: &mut Env<'_>) {
        if !self.machine.phase().can_start() || self.tuning.round_sizes.is_empty() {
            return;
        }
        self.score = 0;
        self.summary = None;
        self.pending = None;
        self.effects.clear();
        self.effects.set_max_particles(env.settings.max_particles());
        self.round = Round::first(env.now_ms);
        self.setup_round(env);
    }

    fn handle(&mut self, action: Action, _env: &mut Env<'_>) {
        if !self.machine.is_active(&FormationPhase::Placing) {
            return;
        }
        let layout = self.bench_layout();
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match action {
            Action::PointerDown(p) => {
                board.pick_at(p, &layout);
            }
            Action::PointerMove(p) => board.move_hand(p),
            Action::PointerUp(p) => {
                if let Some(outcome) = board.drop(p) {
                    log::debug!("Drop: {:?}", outcome);
                }
                if board.is_complete() {
                    self.mark();
                }
            }
            Action::Key(_) => {}
        }
    }

    fn tick(&mut self, env: &mut Env<'_>) {
        self.effects.update();

        if self.machine.poll_countdown(env.now_ms).is_some() {
            self.time_up(env);
            return;
        }
        if let Some(Driver::Hold(hold)) = self.machine.driver_mut() {
            if hold.advance() {
                self.verdict(env);
            }
        }
    }

    fn acknowledge(&mut self, ticket: AckTicket, env: &mut Env<'_>) {
        let Some((waiting, then)) = self.pending else {
            return;
        };
        if waiting != ticket {
            log::debug!("Ignoring stale acknowledgement {:?}", ticket);
            return;
        }
        self.pending = None;
        match then {
            Await::Briefing => self.show_formation(env),
            Await::Memorise => self.start_placing(env),
            Await::Verdict => self.next_round(env),
            Await::Farewell => {}
        }
    }

    fn snapshot(&self) -> Snapshot {
        let phase = self.machine.phase();
        let showing = matches!(phase.active(), Some(FormationPhase::Briefing | FormationPhase::Memorise));
        let marked = matches!(phase, Lifecycle::Resolving | Lifecycle::Feedback);
        let layout = self.bench_layout();

        let name_of = |token: usize| self.names.get(token).copied().unwrap_or("?");
        let slots = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, &grid)| {
                let occupant = self.board.as_ref().and_then(|b| b.assignment()[i]);
                SlotView {
                    pos: self.slot_pos(grid),
                    position: GRID[grid].name,
                    expected: (showing || marked).then(|| name_of(i)),
                    occupant: occupant.map(name_of),
                    correct: marked.then_some(occupant == Some(i)),
                }
            })
            .collect();
        let bench = self
            .board
            .as_ref()
            .map(|b| {
                let count = b.bench().len();
                b.bench()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, t)| {
                        t.map(|token| BenchView {
                            pos: layout.position(i, count),
                            player: name_of(token),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        let hand = self.board.as_ref().and_then(|b| b.hand().copied());

        Snapshot {
            game: GameKind::Formation,
            phase: self.phase_label(),
            hud: vec![
                format!("Round {} / {}", self.round.index + 1, self.rounds()),
                format!("Score: {}", self.score),
            ],
            countdown: self.machine.scheduler().countdown().map(|c| c.remaining_fraction()),
            scene: GameScene::Formation(Scene {
                round: self.round.index + 1,
                rounds: self.rounds(),
                score: self.score,
                slots,
                bench,
                held_player: hand.map(|h| name_of(h.token)),
                hand,
                last_correct: self.last_correct,
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

    fn started(seed: u64) -> TestSession<Formation> {
        let mut s = session(Formation::new(Vec2::new(450.0, 600.0), FormationTuning::default()), seed);
        s.start(0.0);
        s
    }

    /// Acknowledge the briefing and the memorise prompt
    fn to_placing(s: &mut TestSession<Formation>, now: f64) {
        answer_latest_prompt(s, now).unwrap();
        assert_eq!(s.game().phase_label(), "memorise");
        answer_latest_prompt(s, now).unwrap();
        assert_eq!(s.game().phase_label(), "placing");
    }

    fn drag(s: &mut TestSession<Formation>, from: Vec2, to: Vec2, now: f64) {
        s.input(&InputEvent::PointerDown { x: from.x, y: from.y }, now);
        s.input(&InputEvent::PointerMove { x: to.x, y: to.y }, now);
        s.input(&InputEvent::PointerUp { x: to.x, y: to.y }, now);
    }

    /// Drag every bench player to their own slot
    fn place_all_correctly(s: &mut TestSession<Formation>, now: f64) {
        let layout = s.game().bench_layout();
        let count = s.game().board().unwrap().bench().len();
        for i in 0..count {
            let board = s.game().board().unwrap();
            let Some(token) = board.bench()[i] else {
                continue;
            };
            let to = board.slots()[token];
            drag(s, layout.position(i, count), to, now);
        }
    }

    #[test]
    fn test_round_opens_with_interrupted_ramble() {
        let s = started(1);
        assert_eq!(s.game().phase_label(), "briefing");
        let (_, prompt) = s.coach().latest_prompt().unwrap();
        assert_eq!(prompt.speaker, "Coach Andy");
        assert_eq!(prompt.interrupt.as_ref().map(|i| i.speaker.as_str()), Some("Meerkats"));
        assert_eq!(s.game().positions.len(), 3);
    }

    #[test]
    fn test_slots_are_ordered_by_row_then_column() {
        for seed in 0..20 {
            let s = started(seed);
            let grid: Vec<&GridSlot> = s.game().positions.iter().map(|&g| &GRID[g]).collect();
            for pair in grid.windows(2) {
                assert_ne!(row_then_column(pair[0], pair[1]), Ordering::Greater);
            }
        }
        let mut all: Vec<usize> = (0..GRID.len()).rev().collect();
        all.sort_by(|a, b| row_then_column(&GRID[*a], &GRID[*b]));
        let names: Vec<&str> = all.iter().map(|&g| GRID[g].name).collect();
        assert_eq!(names[..3], ["Left Wing", "Centre Forward", "Right Wing"]);
        assert_eq!(names[9], "Goalkeeper");
    }

    #[test]
    fn test_input_ignored_until_placing() {
        let mut s = started(2);
        let before = fingerprint(&s);
        drag(&mut s, Vec2::new(225.0, 565.0), Vec2::new(90.0, 90.0), 10.0);
        assert_eq!(fingerprint(&s), before);

        answer_latest_prompt(&mut s, 20.0);
        let before = fingerprint(&s);
        drag(&mut s, Vec2::new(225.0, 565.0), Vec2::new(90.0, 90.0), 30.0);
        assert_eq!(fingerprint(&s), before);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut s = started(3);
        let (first, _) = *s.coach().latest_prompt().unwrap();
        s.acknowledge(first, 0.0);
        assert_eq!(s.game().phase_label(), "memorise");
        s.acknowledge(first, 0.0);
        assert_eq!(s.game().phase_label(), "memorise");
        s.acknowledge(AckTicket(999), 0.0);
        assert_eq!(s.game().phase_label(), "memorise");
    }

    #[test]
    fn test_perfect_round_scores_bonus_and_moves_on() {
        let mut s = started(4);
        to_placing(&mut s, 0.0);
        assert_eq!(s.snapshot().countdown, Some(1.0));
        place_all_correctly(&mut s, 100.0);

        assert_eq!(s.game().phase_label(), "feedback");
        assert_eq!(s.game().score(), 3 * 10 + 3 * 5);
        assert_eq!(s.snapshot().countdown, None);
        assert_driver_accounting(&s);

        // Coach reacts after the hold
        let prompts = s.coach().open_prompts().len();
        let now = run_frames(&mut s, 100.0, 90);
        assert_eq!(s.coach().open_prompts().len(), prompts + 1);
        assert_eq!(s.game().pending_drivers(), 0);

        answer_latest_prompt(&mut s, now);
        assert_eq!(s.game().phase_label(), "briefing");
        assert_eq!(s.game().round().index, 1);
        assert_driver_accounting(&s);
    }

    #[test]
    fn test_timer_expiry_auto_fills_including_held_player() {
        let mut s = started(5);
        to_placing(&mut s, 0.0);
        let layout = s.game().bench_layout();
        let count = s.game().board().unwrap().bench().len();
        // Pick someone up and never let go
        let from = layout.position(0, count);
        s.input(&InputEvent::PointerDown { x: from.x, y: from.y }, 10.0);
        assert!(s.game().board().unwrap().hand().is_some());

        // 3 players in round one: 12000 + 4500 ms
        s.step(16_000.0);
        assert_eq!(s.game().phase_label(), "placing");
        s.step(16_560.0);
        assert_eq!(s.game().phase_label(), "feedback");

        let board = s.game().board().unwrap();
        assert!(board.is_complete());
        assert!(board.hand().is_none());
        assert_eq!(board.token_count(), 3);
        let correct = board.correct_count() as u32;
        let expected = if correct == 3 { 45 } else { correct * 10 };
        assert_eq!(s.game().score(), expected);
        assert_driver_accounting(&s);
    }

    #[test]
    fn test_full_run_ends_with_summary_and_farewell() {
        let mut s = started(6);
        let mut now = 0.0;
        for round in 0..8 {
            assert_eq!(s.game().round().index, round);
            to_placing(&mut s, now);
            place_all_correctly(&mut s, now);
            now = run_frames(&mut s, now, 90);
            answer_latest_prompt(&mut s, now).unwrap();
        }
        assert_eq!(s.game().phase_label(), "game_over");
        // Every round perfect: sum of n * 15
        let expected: u32 = [3, 3, 4, 4, 5, 5, 6, 7].iter().map(|n| n * 15).sum();
        assert_eq!(s.game().score(), expected);
        let summary = s.game().summary().unwrap();
        assert_eq!(summary.title, "Tactical Genius!");
        assert!(summary.new_best);
        assert_eq!(s.store().get_best("formation_high", Better::Higher), Some(f64::from(expected)));

        // Farewell prompt is the last thing said; answering it changes nothing
        let (_, prompt) = s.coach().latest_prompt().unwrap();
        assert_eq!(prompt.speaker, "Coach Andy");
        answer_latest_prompt(&mut s, now);
        assert_eq!(s.game().phase_label(), "game_over");
    }
}
