//! Browser glue
//!
//! JS constructs one [`Camp`] per canvas. It owns the session, listens to the
//! canvas and window, steps the session from requestAnimationFrame, and calls
//! `on_frame` with a [`FrameReport`] as JSON after every refresh.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, Touch, TouchEvent};

use super::{FrameReport, PromptCursor};
use crate::coach::{AckTicket, CoachQueue};
use crate::games::{GameKind, Session};
use crate::highscores::ScoreStore;
use crate::settings::Settings;
use crate::sim::{InputEvent, Key, Rect, Viewport};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Meerkat Training Camp loaded");
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Milliseconds on the same clock requestAnimationFrame reports
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

struct Shell {
    session: Session,
    canvas: HtmlCanvasElement,
    cursor: PromptCursor,
    on_frame: js_sys::Function,
}

impl Shell {
    /// Re-read the canvas rectangle (layout may have moved it)
    fn fit_viewport(&mut self) {
        let rect = self.canvas.get_bounding_client_rect();
        let logical = self.session.game().playfield();
        self.session.set_viewport(Viewport {
            display: Rect::new(
                rect.left() as f32,
                rect.top() as f32,
                rect.width() as f32,
                rect.height() as f32,
            ),
            logical,
        });
    }

    fn feed(&mut self, event: InputEvent) {
        self.session.input(&event, now_ms());
    }

    /// Serialised report plus the callback to hand it to
    fn report(&mut self) -> Option<(String, js_sys::Function)> {
        let report = FrameReport::collect(&mut self.session, &mut self.cursor);
        match serde_json::to_string(&report) {
            Ok(json) => Some((json, self.on_frame.clone())),
            Err(e) => {
                log::error!("Frame report not serialisable: {}", e);
                None
            }
        }
    }
}

/// Deliver outside any borrow so the callback may call back into [`Camp`]
fn deliver(out: Option<(String, js_sys::Function)>) {
    if let Some((json, callback)) = out {
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::warn!("on_frame threw: {:?}", e);
        }
    }
}

/// A mini-game bound to a canvas
#[wasm_bindgen]
pub struct Camp {
    shell: Rc<RefCell<Shell>>,
}

#[wasm_bindgen]
impl Camp {
    /// `game` is a game key ("shooting", "dribble", ...); `tuning` optional JSON overrides
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        game: &str,
        tuning: Option<String>,
        on_frame: js_sys::Function,
    ) -> Result<Camp, JsValue> {
        let kind = GameKind::from_key(game).ok_or_else(|| js_err(format!("unknown game '{}'", game)))?;
        let tuning = match tuning {
            Some(json) => Tuning::from_json(&json).map_err(js_err)?,
            None => Tuning::default(),
        };

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| js_err("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_err(format!("no element '{}'", canvas_id)))?
            .dyn_into()
            .map_err(|_| js_err(format!("'{}' is not a canvas", canvas_id)))?;

        let store = ScoreStore::browser();
        let settings = Settings::load(store.backend());
        let seed = js_sys::Date::now() as u64;
        let session = Session::new(
            kind.create(&tuning, kind.default_playfield()),
            seed,
            store,
            CoachQueue::new(),
            settings,
        );
        log::info!("{} ready with seed {}", kind.title(), seed);

        let shell = Rc::new(RefCell::new(Shell {
            session,
            canvas: canvas.clone(),
            cursor: PromptCursor::default(),
            on_frame,
        }));
        shell.borrow_mut().fit_viewport();

        setup_pointer_handlers(&canvas, &shell)?;
        setup_keyboard(&shell)?;
        setup_focus_loss(&shell)?;
        request_animation_frame(shell.clone());

        Ok(Camp { shell })
    }

    /// Start or restart the run (ignored mid-run)
    pub fn start(&self) {
        let out = {
            let mut shell = self.shell.borrow_mut();
            shell.fit_viewport();
            shell.session.start(now_ms());
            shell.report()
        };
        deliver(out);
    }

    /// Answer the prompt with this ticket
    pub fn acknowledge(&self, ticket: u32) {
        let out = {
            let mut shell = self.shell.borrow_mut();
            shell.session.acknowledge(AckTicket(u64::from(ticket)), now_ms());
            shell.report()
        };
        deliver(out);
    }

    /// Pick a level before starting; false if the game has none or it is out of range
    pub fn select_level(&self, level: u32) -> bool {
        self.shell.borrow_mut().session.select_level(level)
    }

    /// Apply and persist player settings given as JSON
    pub fn set_settings(&self, json: &str) -> Result<(), JsValue> {
        let settings: Settings = serde_json::from_str(json).map_err(js_err)?;
        let mut shell = self.shell.borrow_mut();
        if let Err(e) = settings.save(shell.session.store_mut().backend_mut()) {
            log::warn!("Settings not persisted: {}", e);
        }
        shell.session.set_settings(settings);
        Ok(())
    }

    /// Current snapshot as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.shell.borrow().session.snapshot()).map_err(js_err)
    }

    /// On-screen d-pad button went down (`data-dir` value)
    pub fn press(&self, dir: &str) {
        if let Some(key) = Key::from_direction(dir) {
            self.shell.borrow_mut().feed(InputEvent::KeyDown(key));
        }
    }

    pub fn release(&self, dir: &str) {
        if let Some(key) = Key::from_direction(dir) {
            self.shell.borrow_mut().feed(InputEvent::KeyUp(key));
        }
    }

    /// Call after the canvas is resized or moved
    pub fn resize(&self) {
        self.shell.borrow_mut().fit_viewport();
    }
}

fn touch_point(touch: &Touch) -> (f32, f32) {
    (touch.client_x() as f32, touch.client_y() as f32)
}

fn listen<T: ?Sized + WasmClosure>(
    target: &web_sys::EventTarget,
    event: &str,
    closure: Closure<T>,
) -> Result<(), JsValue> {
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn setup_pointer_handlers(canvas: &HtmlCanvasElement, shell: &Rc<RefCell<Shell>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;

    {
        let shell = shell.clone();
        listen(canvas, "mousedown", Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let mut s = shell.borrow_mut();
            s.fit_viewport();
            s.feed(InputEvent::PointerDown {
                x: event.client_x() as f32,
                y: event.client_y() as f32,
            });
        }))?;
    }
    {
        let shell = shell.clone();
        listen(canvas, "mousemove", Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            shell.borrow_mut().feed(InputEvent::PointerMove {
                x: event.client_x() as f32,
                y: event.client_y() as f32,
            });
        }))?;
    }
    // Releases outside the canvas still end a drag
    {
        let shell = shell.clone();
        listen(&window, "mouseup", Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            shell.borrow_mut().feed(InputEvent::PointerUp {
                x: event.client_x() as f32,
                y: event.client_y() as f32,
            });
        }))?;
    }

    {
        let shell = shell.clone();
        listen(canvas, "touchstart", Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
            if let Some(touch) = event.touches().get(0) {
                let (x, y) = touch_point(&touch);
                let mut s = shell.borrow_mut();
                s.fit_viewport();
                s.feed(InputEvent::PointerDown { x, y });
            }
        }))?;
    }
    {
        let shell = shell.clone();
        listen(canvas, "touchmove", Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
            if let Some(touch) = event.touches().get(0) {
                let (x, y) = touch_point(&touch);
                shell.borrow_mut().feed(InputEvent::PointerMove { x, y });
            }
        }))?;
    }
    {
        let shell = shell.clone();
        listen(canvas, "touchend", Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
            if let Some(touch) = event.changed_touches().get(0) {
                let (x, y) = touch_point(&touch);
                shell.borrow_mut().feed(InputEvent::PointerUp { x, y });
            }
        }))?;
    }
    Ok(())
}

fn setup_keyboard(shell: &Rc<RefCell<Shell>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;

    {
        let shell = shell.clone();
        listen(&window, "keydown", Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let Some(key) = Key::from_dom(&event.key()) else {
                return;
            };
            event.prevent_default();
            if !event.repeat() {
                shell.borrow_mut().feed(InputEvent::KeyDown(key));
            }
        }))?;
    }
    {
        let shell = shell.clone();
        listen(&window, "keyup", Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if let Some(key) = Key::from_dom(&event.key()) {
                shell.borrow_mut().feed(InputEvent::KeyUp(key));
            }
        }))?;
    }
    Ok(())
}

/// Held keys never see their keyup once focus leaves the page
fn setup_focus_loss(shell: &Rc<RefCell<Shell>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
    let shell = shell.clone();
    listen(&window, "blur", Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let mut s = shell.borrow_mut();
        for key in [Key::Up, Key::Down, Key::Left, Key::Right] {
            s.feed(InputEvent::KeyUp(key));
        }
        log::debug!("Focus lost, held keys released");
    }))
}

fn request_animation_frame(shell: Rc<RefCell<Shell>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |time: f64| game_loop(shell, time));
    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        Ok(_) => closure.forget(),
        Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
    }
}

fn game_loop(shell: Rc<RefCell<Shell>>, time: f64) {
    let out = {
        let mut s = shell.borrow_mut();
        s.session.frame(time);
        s.report()
    };
    deliver(out);
    request_animation_frame(shell);
}
