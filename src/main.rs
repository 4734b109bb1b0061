//! Edu Arcade entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlSelectElement, MouseEvent, TouchEvent};

    use edu_arcade::audio::AudioManager;
    use edu_arcade::render::{self, CanvasSurface, RenderOptions, Surface, TextAlign};
    use edu_arcade::sim::{Difficulty, InputSampler, Operation};
    use edu_arcade::{Bounds, Driver, GameKind, GameTuning, RunState, Settings, new_mode};

    /// Everything the page owns between frames
    struct App {
        driver: Option<Driver>,
        kind: Option<GameKind>,
        sampler: InputSampler,
        surface: Option<CanvasSurface>,
        audio: AudioManager,
        settings: Settings,
        tuning: GameTuning,
        options: RenderOptions,
        bounds: Bounds,
    }

    impl App {
        fn new(settings: Settings, tuning: GameTuning, surface: Option<CanvasSurface>) -> Self {
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);
            Self {
                driver: None,
                kind: None,
                sampler: InputSampler::new(),
                surface,
                audio,
                options: RenderOptions::from_settings(&settings),
                settings,
                tuning,
                bounds: Bounds::default(),
            }
        }

        /// Start a fresh session of `kind`
        fn launch(&mut self, kind: GameKind, operation: Operation, difficulty: Difficulty) {
            if let Some(driver) = self.driver.as_mut() {
                driver.stop();
            }
            self.sampler.release_all();
            self.audio.resume();

            let seed = js_sys::Date::now() as u64;
            let mode = new_mode(kind, operation, difficulty, &self.tuning);
            let mut driver = Driver::new(mode, seed, self.bounds);
            driver.set_particle_cap(self.settings.max_particles());
            driver.start();

            self.driver = Some(driver);
            self.kind = Some(kind);
            self.settings.operation = operation;
            self.settings.difficulty = difficulty;
            self.settings.save();
            log::info!("Launched {} with seed {}", kind.id(), seed);
        }

        /// Leave the current game and go back to the selector
        fn exit(&mut self) {
            if let Some(mut driver) = self.driver.take() {
                driver.stop();
                log::info!("Exited {}", driver.mode_name());
            }
            self.kind = None;
            self.sampler.release_all();
        }

        fn restart(&mut self) {
            if let Some(driver) = self.driver.as_mut() {
                self.sampler.release_all();
                driver.restart(js_sys::Date::now() as u64);
            }
        }

        fn toggle_pause(&mut self) {
            if let Some(driver) = self.driver.as_mut() {
                match driver.run_state() {
                    RunState::Running => {
                        driver.pause();
                        self.sampler.release_all();
                    }
                    RunState::Paused => driver.resume(),
                    _ => {}
                }
            }
        }

        /// Pause when the page is hidden or loses focus
        fn auto_pause(&mut self, reason: &str) {
            self.sampler.release_all();
            if !self.settings.pause_on_blur {
                return;
            }
            if let Some(driver) = self.driver.as_mut()
                && driver.run_state() == RunState::Running
            {
                driver.pause();
                log::info!("Auto-paused ({})", reason);
            }
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.bounds = Bounds::new(width as f32, height as f32);
            if let Some(surface) = self.surface.as_mut() {
                surface.resize(width, height);
            }
            if let Some(driver) = self.driver.as_mut() {
                driver.resize(self.bounds);
            }
        }

        fn frame(&mut self, time: f64) {
            let Some(driver) = self.driver.as_mut() else {
                return;
            };
            driver.frame(time, &self.sampler);
            let events = driver.drain_events();
            self.audio.play_events(&events);

            if let Some(surface) = self.surface.as_mut() {
                render::draw(driver.state(), surface, &self.options);
                if driver.run_state() == RunState::Paused {
                    surface.text(
                        "PAUSED - click or press P",
                        self.bounds.center(),
                        32.0,
                        render::colors::FOREGROUND,
                        TextAlign::Center,
                    );
                }
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    /// Read a `<select>` value
    fn selected(document: &Document, id: &str) -> Option<String> {
        document
            .get_element_by_id(id)?
            .dyn_into::<HtmlSelectElement>()
            .ok()
            .map(|s| s.value())
    }

    fn select(document: &Document, id: &str, value: &str) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            el.set_value(value);
        }
    }

    /// Canvas-local position of a touch
    fn touch_pos(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn fit_canvas(canvas: &HtmlCanvasElement) -> (u32, u32) {
        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Edu Arcade starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        set_hidden(&document, "loading", true);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let (width, height) = fit_canvas(&canvas);

        let surface = CanvasSurface::new(&canvas);
        if surface.is_none() {
            log::warn!("No 2D canvas context - rendering disabled");
        }

        let settings = Settings::load();
        select(&document, "operation", settings.operation.as_str());
        select(&document, "difficulty", settings.difficulty.as_str());

        let app = Rc::new(RefCell::new(App::new(settings, GameTuning::load(), surface)));
        app.borrow_mut().resize(width, height);

        setup_menu(&document, app.clone());
        setup_input_handlers(&canvas, app.clone());
        setup_auto_pause(&document, app.clone());
        setup_resize(&canvas, app.clone());

        set_hidden(&document, "menu", false);
        request_animation_frame(app);

        log::info!("Edu Arcade running!");
        Ok(())
    }

    /// Game selector buttons and the exit button
    fn setup_menu(document: &Document, app: Rc<RefCell<App>>) {
        for kind in GameKind::ALL {
            let Some(btn) = document.get_element_by_id(&format!("play-{}", kind.id())) else {
                continue;
            };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                    return;
                };
                let operation = selected(&document, "operation")
                    .and_then(|v| Operation::from_str(&v))
                    .unwrap_or_default();
                let difficulty = selected(&document, "difficulty")
                    .and_then(|v| Difficulty::from_str(&v))
                    .unwrap_or_default();
                app.borrow_mut().launch(kind, operation, difficulty);
                set_hidden(&document, "menu", true);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("exit-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                exit_to_menu(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn exit_to_menu(app: &Rc<RefCell<App>>) {
        app.borrow_mut().exit();
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            set_hidden(&document, "menu", false);
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse move
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                app.borrow_mut().sampler.pointer_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down - fire, or resume when paused
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                if a.driver.as_ref().map(|d| d.run_state()) == Some(RunState::Paused) {
                    a.toggle_pause();
                    return;
                }
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                a.sampler.pointer_down(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().sampler.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_pos(&canvas_clone, &event) {
                    app.borrow_mut().sampler.pointer_down(pos);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_pos(&canvas_clone, &event) {
                    app.borrow_mut().sampler.pointer_move(pos);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                app.borrow_mut().sampler.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let code = event.code();
                match code.as_str() {
                    "Escape" => exit_to_menu(&app),
                    "KeyP" => app.borrow_mut().toggle_pause(),
                    "KeyR" => app.borrow_mut().restart(),
                    _ => {
                        if app.borrow_mut().sampler.key_down(&code) {
                            event.prevent_default();
                        }
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                app.borrow_mut().sampler.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(document: &Document, app: Rc<RefCell<App>>) {
        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    app.borrow_mut().auto_pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = fit_canvas(&canvas_clone);
            app.borrow_mut().resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Edu Arcade (native) starting...");
    log::info!("The playable version runs in the browser; running a headless autopilot demo");

    let settings = edu_arcade::Settings::load();
    let tuning = edu_arcade::GameTuning::load();
    for kind in edu_arcade::GameKind::ALL {
        demo::play(kind, &settings, &tuning);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless sessions driven by a simple autopilot
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use edu_arcade::sim::{EntityKind, InputSnapshot, SimulationState};
    use edu_arcade::{Bounds, Driver, GameKind, GameTuning, Settings, new_mode};

    /// One minute of play at the nominal rate
    const DEMO_STEPS: u32 = 3600;

    pub fn play(kind: GameKind, settings: &Settings, tuning: &GameTuning) {
        let mode = new_mode(kind, settings.operation, settings.difficulty, tuning);
        let mut driver = Driver::new(mode, 42, Bounds::default());
        driver.set_particle_cap(settings.max_particles());
        driver.start();

        let mut steps = 0;
        while steps < DEMO_STEPS {
            let input = autopilot(kind, driver.state(), steps);
            if !driver.step(&input) {
                break;
            }
            driver.drain_events();
            steps += 1;
        }

        let state = driver.state();
        log::info!(
            "{}: {} steps, score {}, correct {}, misses {}, crashes {}, outcome {:?}",
            kind.title(),
            steps,
            state.score,
            state.counters.correct,
            state.counters.misses,
            state.counters.crashes,
            state.outcome()
        );
        driver.stop();
    }

    fn autopilot(kind: GameKind, state: &SimulationState, step: u32) -> InputSnapshot {
        let wanted = |kind: EntityKind| {
            let problem = state.problem.as_ref()?;
            state
                .entities
                .of_kind(kind)
                .filter(|e| !e.is_disposed())
                .find(|e| e.payload.is_some_and(|p| problem.answer.accepts(&p)))
        };

        match kind {
            GameKind::Asteroids => InputSnapshot {
                rotate_right: true,
                fire: true,
                ..Default::default()
            },
            GameKind::Goalkeeper => InputSnapshot {
                pointer: wanted(EntityKind::Obstacle).map(|e| e.pos),
                ..Default::default()
            },
            GameKind::Defender => InputSnapshot {
                fire: step % 2 == 0,
                pointer: wanted(EntityKind::Obstacle).map(|e| e.pos + e.vel),
                ..Default::default()
            },
            GameKind::Tower => InputSnapshot {
                fire: step % 2 == 0,
                pointer: wanted(EntityKind::Obstacle).map(|e| e.pos),
                ..Default::default()
            },
            GameKind::Lander => {
                let descending = state
                    .entities
                    .first(EntityKind::Ship)
                    .is_some_and(|ship| ship.vel.y > 1.0);
                InputSnapshot {
                    thrust: descending,
                    ..Default::default()
                }
            }
        }
    }
}
