//! Input normalisation
//!
//! Raw pointer/touch/keyboard events arrive in client (display) coordinates
//! and DOM key names. The router turns them into playfield positions and
//! discrete keys; whether an action is acted on is decided by the game's
//! current phase, not here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;

/// Discrete keys the games understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Space / Enter
    Confirm,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            " " | "Enter" => Some(Key::Confirm),
            _ => None,
        }
    }

    /// Map a d-pad / button `data-dir` value
    pub fn from_direction(dir: &str) -> Option<Self> {
        match dir {
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "confirm" => Some(Key::Confirm),
            _ => None,
        }
    }

    fn held_index(self) -> Option<usize> {
        match self {
            Key::Up => Some(0),
            Key::Down => Some(1),
            Key::Left => Some(2),
            Key::Right => Some(3),
            Key::Confirm => None,
        }
    }
}

/// One of the three goal thirds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Centre,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Centre, Lane::Right];

    /// Left/right pick the side, up picks the centre
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Left => Some(Lane::Left),
            Key::Up => Some(Lane::Centre),
            Key::Right => Some(Lane::Right),
            Key::Down | Key::Confirm => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Lane::Left),
            "centre" | "center" => Some(Lane::Centre),
            "right" => Some(Lane::Right),
            _ => None,
        }
    }

    /// Horizontal position across the goal mouth as a fraction of its width
    pub fn fraction(self) -> f32 {
        match self {
            Lane::Left => 0.17,
            Lane::Centre => 0.5,
            Lane::Right => 0.83,
        }
    }

    /// Sign of the keeper's dive offset
    pub fn side(self) -> f32 {
        match self {
            Lane::Left => -1.0,
            Lane::Centre => 0.0,
            Lane::Right => 1.0,
        }
    }
}

/// Raw event from the platform layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Mouse down or first touch, client coordinates
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    KeyDown(Key),
    KeyUp(Key),
}

/// Normalised action handed to a game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    Key(Key),
}

/// Display rectangle of the canvas and the logical playfield it shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Canvas bounding rectangle in client coordinates
    pub display: Rect,
    /// Logical playfield size
    pub logical: Vec2,
}

impl Viewport {
    /// Display and playfield coincide
    pub fn identity(size: Vec2) -> Self {
        Self {
            display: Rect::new(0.0, 0.0, size.x, size.y),
            logical: size,
        }
    }

    /// Client coordinates to playfield coordinates
    pub fn to_logical(&self, client: Vec2) -> Vec2 {
        let local = client - self.display.origin;
        let size = self.display.size;
        if size.x <= 0.0 || size.y <= 0.0 {
            return local;
        }
        local * (self.logical / size)
    }
}

/// Tracks held directions and converts raw events into actions
#[derive(Debug, Clone)]
pub struct InputRouter {
    viewport: Viewport,
    /// Up, down, left, right
    held: [bool; 4],
}

impl InputRouter {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            held: [false; 4],
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Translate one event; key releases only update held state
    pub fn route(&mut self, event: &InputEvent) -> Option<Action> {
        match *event {
            InputEvent::PointerDown { x, y } => {
                Some(Action::PointerDown(self.viewport.to_logical(Vec2::new(x, y))))
            }
            InputEvent::PointerMove { x, y } => {
                Some(Action::PointerMove(self.viewport.to_logical(Vec2::new(x, y))))
            }
            InputEvent::PointerUp { x, y } => {
                Some(Action::PointerUp(self.viewport.to_logical(Vec2::new(x, y))))
            }
            InputEvent::KeyDown(key) => {
                if let Some(i) = key.held_index() {
                    self.held[i] = true;
                }
                Some(Action::Key(key))
            }
            InputEvent::KeyUp(key) => {
                if let Some(i) = key.held_index() {
                    self.held[i] = false;
                }
                None
            }
        }
    }

    /// Composite direction of the held keys, unit length (or zero)
    pub fn movement(&self) -> Vec2 {
        let [up, down, left, right] = self.held;
        let mut dir = Vec2::ZERO;
        if up {
            dir.y -= 1.0;
        }
        if down {
            dir.y += 1.0;
        }
        if left {
            dir.x -= 1.0;
        }
        if right {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }

    /// Forget held keys (new run, lost focus)
    pub fn release_all(&mut self) {
        self.held = [false; 4];
    }
}
