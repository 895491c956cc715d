//! Cannonade entry point
//!
//! Handles platform-specific initialization and runs the per-frame loop.
//! Serves two pages: the cannon game (a `#canvas` element) and the water
//! shader demo (a `#water-canvas` element).

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use cannonade::audio::{AudioManager, SoundEffect};
    use cannonade::renderer::{SceneRenderState, WaterRenderState};
    use cannonade::sim::{GameEvent, GameState, TickInput, WeaponKind, tick};
    use glam::Vec2;

    /// Last written stat values, so DOM text is only touched on change
    #[derive(Default)]
    struct HudCache {
        score: Option<u64>,
        bullets: Option<u64>,
        rockets: Option<u64>,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<SceneRenderState>,
        audio: AudioManager,
        input: TickInput,
        hud: HudCache,
    }

    impl Game {
        fn new(seed: u64, bounds: Vec2) -> Self {
            Self {
                state: GameState::new(seed, bounds),
                render_state: None,
                audio: AudioManager::new(),
                input: TickInput {
                    pointer: bounds / 2.0,
                    ..Default::default()
                },
                hud: HudCache::default(),
            }
        }

        /// Advance the simulation by one tick using the current input snapshot
        fn update(&mut self) {
            let input = self.input.clone();
            tick(&mut self.state, &input);

            // Clear one-shot inputs after processing
            self.input.fire_primary = false;
            self.input.fire_secondary = false;
        }

        /// React to everything the tick produced. Returns whether any event
        /// fired; score and shot counters only move with events, so the HUD
        /// needs no refresh otherwise.
        fn drain_events(&mut self) -> bool {
            let had_events = !self.state.events.is_empty();
            for event in self.state.events.drain(..) {
                match event {
                    GameEvent::ShotFired {
                        weapon: WeaponKind::Bullet,
                    } => self.audio.play(SoundEffect::BulletFired),
                    GameEvent::ShotFired {
                        weapon: WeaponKind::Rocket,
                    } => self.audio.play(SoundEffect::RocketFired),
                    GameEvent::EnemyDown { .. } => self.audio.play(SoundEffect::Explosion),
                }
            }
            had_events
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM. Each field is written only when its
        /// value actually changed.
        fn update_hud(&mut self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            if self.hud.score != Some(self.state.score) {
                if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                    el.set_text_content(Some(&self.state.score.to_string()));
                }
                self.hud.score = Some(self.state.score);
            }

            if self.hud.bullets != Some(self.state.bullets_fired) {
                if let Some(el) = document
                    .query_selector("#hud-bullets .hud-value")
                    .ok()
                    .flatten()
                {
                    el.set_text_content(Some(&self.state.bullets_fired.to_string()));
                }
                self.hud.bullets = Some(self.state.bullets_fired);
            }

            if self.hud.rockets != Some(self.state.rockets_fired) {
                if let Some(el) = document
                    .query_selector("#hud-rockets .hud-value")
                    .ok()
                    .flatten()
                {
                    el.set_text_content(Some(&self.state.rockets_fired.to_string()));
                }
                self.hud.rockets = Some(self.state.rockets_fired);
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Cannonade starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        // The water demo page carries its own canvas id; otherwise we are on
        // the game page
        if let Some(el) = document.get_element_by_id("water-canvas") {
            let canvas: HtmlCanvasElement = el.dyn_into().expect("not a canvas");
            run_water(canvas).await;
        } else {
            let canvas: HtmlCanvasElement = document
                .get_element_by_id("canvas")
                .expect("no canvas")
                .dyn_into()
                .expect("not a canvas");
            run_game(canvas).await;
        }
    }

    // ========================================================================
    // Cannon game
    // ========================================================================

    async fn run_game(canvas: HtmlCanvasElement) {
        let window = web_sys::window().expect("no window");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(
            seed,
            Vec2::new(client_w as f32, client_h as f32),
        )));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = SceneRenderState::new(surface, &adapter, width, height).await;
        {
            let mut g = game.borrow_mut();
            g.render_state = Some(render_state);
            // Initial HUD paint; afterwards only events trigger writes
            g.update_hud();
        }

        setup_input_handlers(&canvas, game.clone());
        setup_resize_handler(&canvas, game.clone());

        // Start game loop
        request_animation_frame_game(game);

        log::info!("Cannonade running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move - track the pointer in CSS pixels
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.input.pointer = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down - primary on left button, secondary on right
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                match event.button() {
                    0 => g.input.fire_primary = true,
                    2 => g.input.fire_secondary = true,
                    _ => {}
                }
                // First gesture unlocks the audio context
                g.audio.resume();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keep the browser context menu off the fire button
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let mut g = game.borrow_mut();
                    g.input.pointer = Vec2::new(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    );
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - aims and fires the primary weapon
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    g.input.pointer = Vec2::new(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    );
                }
                g.input.fire_primary = true;
                g.audio.resume();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let window = web_sys::window().unwrap();
            let dpr = window.device_pixel_ratio();
            let client_w = canvas.client_width();
            let client_h = canvas.client_height();
            let width = (client_w as f64 * dpr) as u32;
            let height = (client_h as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            let mut g = game.borrow_mut();
            g.state
                .set_bounds(Vec2::new(client_w as f32, client_h as f32));
            if let Some(ref mut render_state) = g.render_state {
                render_state.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame_game(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update();
            if g.drain_events() {
                g.update_hud();
            }
            g.render(time);
        }

        request_animation_frame_game(game);
    }

    // ========================================================================
    // Water shader demo
    // ========================================================================

    struct WaterDemo {
        render_state: WaterRenderState,
        /// Pointer in physical pixels, matching the shader's frag coords
        pointer: [f32; 2],
        /// Ripple strength; refreshed to 1.0 on movement, decays each frame
        influence: f32,
        dpr: f32,
    }

    async fn run_water(canvas: HtmlCanvasElement) {
        let window = web_sys::window().expect("no window");

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = WaterRenderState::new(surface, &adapter, width, height).await;
        if render_state.fallback_active {
            log::warn!("Water demo running on the static fallback");
        }

        let demo = Rc::new(RefCell::new(WaterDemo {
            render_state,
            pointer: [width as f32 / 2.0, height as f32 / 2.0],
            influence: 0.0,
            dpr: dpr as f32,
        }));

        // Mouse move refreshes the ripple
        {
            let demo = demo.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut d = demo.borrow_mut();
                d.pointer = [
                    event.offset_x() as f32 * d.dpr,
                    event.offset_y() as f32 * d.dpr,
                ];
                d.influence = 1.0;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move does the same
        {
            let demo = demo.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let mut d = demo.borrow_mut();
                    d.pointer = [
                        (touch.client_x() as f32 - rect.left() as f32) * d.dpr,
                        (touch.client_y() as f32 - rect.top() as f32) * d.dpr,
                    ];
                    d.influence = 1.0;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let demo = demo.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let window = web_sys::window().unwrap();
                let dpr = window.device_pixel_ratio();
                let width = (canvas_clone.client_width() as f64 * dpr) as u32;
                let height = (canvas_clone.client_height() as f64 * dpr) as u32;
                canvas_clone.set_width(width);
                canvas_clone.set_height(height);
                let mut d = demo.borrow_mut();
                d.dpr = dpr as f32;
                d.render_state.resize(width, height);
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        request_animation_frame_water(demo);

        log::info!("Water demo running!");
    }

    fn request_animation_frame_water(demo: Rc<RefCell<WaterDemo>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            water_loop(demo, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn water_loop(demo: Rc<RefCell<WaterDemo>>, time: f64) {
        {
            let mut d = demo.borrow_mut();
            let pointer = d.pointer;
            let influence = d.influence;
            match d.render_state.render(pointer, influence, time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = d.render_state.size;
                    d.render_state.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
            // Ripples die down until the pointer moves again
            d.influence *= 0.95;
        }

        request_animation_frame_water(demo);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Cannonade (native) starting...");
    log::info!("Native mode has no renderer - run with `trunk serve` for the web version");

    println!("\nRunning headless smoke simulation...");
    smoke_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn smoke_run() {
    use cannonade::sim::{GameState, TickInput, tick};
    use glam::Vec2;

    let mut state = GameState::new(42, Vec2::new(800.0, 600.0));
    for i in 0..600u32 {
        let input = TickInput {
            pointer: Vec2::new(400.0, 120.0),
            fire_primary: i % 10 == 0,
            fire_secondary: i % 40 == 0,
        };
        tick(&mut state, &input);
        state.events.clear();
    }

    assert!(state.bullets_fired > 0, "bullets should have fired");
    assert!(state.rockets_fired > 0, "rockets should have fired");
    assert!(state.time_ticks == 600);
    println!(
        "✓ 600 ticks: score {}, {} bullets, {} rockets, {} enemies on screen",
        state.score,
        state.bullets_fired,
        state.rockets_fired,
        state.enemies.len()
    );
}
