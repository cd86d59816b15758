//! Meerkat Training Camp entry point
//!
//! The browser build starts in `platform::web`. Natively this plays the games
//! headless with a simple autopilot and prints each verdict:
//!
//! ```text
//! meerkat-camp [game-key] [seed]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::collections::HashMap;

    use glam::Vec2;

    use meerkat_camp::coach::CoachQueue;
    use meerkat_camp::consts::FRAME_MS;
    use meerkat_camp::games::{GameKind, GameSummary, Scene, Session, Snapshot};
    use meerkat_camp::highscores::{MemoryStorage, ScoreStore};
    use meerkat_camp::settings::Settings;
    use meerkat_camp::sim::{InputEvent, Key};
    use meerkat_camp::tuning::Tuning;

    /// Ten minutes of play
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    fn tap(at: Vec2) -> InputEvent {
        InputEvent::PointerDown { x: at.x, y: at.y }
    }

    fn hold(key: Key, down: bool) -> InputEvent {
        if down { InputEvent::KeyDown(key) } else { InputEvent::KeyUp(key) }
    }

    /// Plays from the snapshot alone, like a player watching the screen
    #[derive(Default)]
    struct Autopilot {
        /// Formation slots seen while memorising
        memory: HashMap<&'static str, Vec2>,
    }

    impl Autopilot {
        fn inputs(&mut self, snap: &Snapshot) -> Vec<InputEvent> {
            match &snap.scene {
                Scene::Shooting(scene) if snap.phase == "aiming" => scene
                    .targets
                    .iter()
                    .find(|t| !t.hit)
                    .map(|t| vec![tap(t.shape.center)])
                    .unwrap_or_default(),
                Scene::Dribble(scene) if snap.phase == "running" => {
                    let to_goal = scene.goal.center() - scene.player.pos;
                    vec![
                        hold(Key::Right, to_goal.x > 4.0),
                        hold(Key::Left, to_goal.x < -4.0),
                        hold(Key::Down, to_goal.y > 4.0),
                        hold(Key::Up, to_goal.y < -4.0),
                    ]
                }
                Scene::KeepieUps(scene) => {
                    let ball = &scene.ball;
                    if ball.vel.y > 0.0 && ball.pos.y > scene.ground - 4.0 * ball.radius {
                        vec![tap(ball.pos)]
                    } else {
                        Vec::new()
                    }
                }
                Scene::Goalkeeper(scene) => match (scene.hint, scene.dive) {
                    (Some(lane), None) => {
                        let x = scene.goal.origin.x + scene.goal.size.x * lane.fraction();
                        vec![tap(Vec2::new(x, scene.goal.center().y))]
                    }
                    _ => Vec::new(),
                },
                Scene::Tackle(scene) => match &scene.marker {
                    Some(marker) if snap.phase == "timing" && marker.in_zone() => {
                        vec![InputEvent::KeyDown(Key::Confirm)]
                    }
                    _ => Vec::new(),
                },
                Scene::Formation(scene) => {
                    if snap.phase == "memorise" {
                        for slot in &scene.slots {
                            if let Some(name) = slot.expected {
                                self.memory.insert(name, slot.pos);
                            }
                        }
                    }
                    if snap.phase != "placing" || scene.hand.is_some() {
                        return Vec::new();
                    }
                    let Some((from, to)) = scene
                        .bench
                        .iter()
                        .find_map(|b| self.memory.get(b.player).map(|slot| (b.pos, *slot)))
                    else {
                        return Vec::new();
                    };
                    vec![
                        tap(from),
                        InputEvent::PointerMove { x: to.x, y: to.y },
                        InputEvent::PointerUp { x: to.x, y: to.y },
                    ]
                }
                _ => Vec::new(),
            }
        }
    }

    /// Play one run to its verdict
    pub fn play(kind: GameKind, seed: u64, tuning: &Tuning) -> Option<GameSummary> {
        let store = ScoreStore::new(Box::new(MemoryStorage::new()));
        let mut session: Session = Session::new(
            kind.create(tuning, kind.default_playfield()),
            seed,
            store,
            CoachQueue::new(),
            Settings::default(),
        );
        let mut pilot = Autopilot::default();
        let mut now = 0.0;
        session.start(now);

        for _ in 0..MAX_FRAMES {
            now += FRAME_MS;
            session.frame(now);

            for message in session.coach_mut().drain_messages() {
                log::info!("[{}] {}", message.coach, message.text);
            }
            if let Some((ticket, prompt)) = session.coach().open_prompts().first().cloned() {
                log::info!("[{}] {} ({})", prompt.speaker, prompt.message, prompt.button);
                if let Some(cut) = &prompt.interrupt {
                    log::info!("[{}] {}", cut.speaker, cut.message);
                }
                session.acknowledge(ticket, now);
            }

            let snap = session.snapshot();
            if snap.phase == "game_over" {
                return snap.summary;
            }
            for event in pilot.inputs(&snap) {
                session.input(&event, now);
            }
        }
        log::warn!("{} still running after {} frames", kind.title(), MAX_FRAMES);
        None
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use meerkat_camp::games::GameKind;
    use meerkat_camp::tuning::Tuning;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Meerkat Training Camp (native, headless) starting...");

    let mut args = std::env::args().skip(1);
    let kinds: Vec<GameKind> = match args.next() {
        Some(key) => match GameKind::from_key(&key) {
            Some(kind) => vec![kind],
            None => {
                let keys: Vec<_> = GameKind::ALL.iter().map(|k| k.key()).collect();
                eprintln!("Unknown game '{}'; expected one of {}", key, keys.join(", "));
                std::process::exit(2);
            }
        },
        None => GameKind::ALL.to_vec(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024);
    let tuning = Tuning::default();

    for kind in kinds {
        match headless::play(kind, seed, &tuning) {
            Some(summary) => println!(
                "{:<12} {:>8}  {}{}",
                kind.title(),
                summary.score_text,
                summary.title,
                if summary.new_best { " (new best)" } else { "" }
            ),
            None => println!("{:<12} did not finish", kind.title()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The wasm entry point is `platform::web::wasm_main`
}
