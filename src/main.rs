//! Seesaw entry point
//!
//! On the web this wires the DOM to the session controller. Natively it runs a
//! short headless session against in-memory storage.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, DomRect, Element, HtmlElement, MouseEvent};

    use seesaw::controller::RestoreOutcome;
    use seesaw::persistence::wait_for_surface;
    use seesaw::platform::web::{LocalStorage, PlankProbe, clock_seed, sleep_ms};
    use seesaw::sim::{PhysicsState, PlacedObject};
    use seesaw::weights::WeightVisual;
    use seesaw::{Placement, Seesaw, Settings};

    /// Elements the app touches; any of them may be missing from the page
    struct Dom {
        document: Document,
        sim_area: Option<Element>,
        plank: Option<Element>,
        preview_ball: Option<Element>,
        objects: Option<Element>,
        left_weight: Option<Element>,
        right_weight: Option<Element>,
        next_weight: Option<Element>,
        tilt_angle: Option<Element>,
        log_area: Option<Element>,
        reset_btn: Option<Element>,
    }

    impl Dom {
        fn cache(document: Document) -> Self {
            let get = |id: &str| {
                let el = document.get_element_by_id(id);
                if el.is_none() {
                    log::warn!("Element with id '{}' not found", id);
                }
                el
            };
            Self {
                sim_area: get("simulation-area"),
                plank: get("plank"),
                preview_ball: get("preview-ball"),
                objects: get("objects-container"),
                left_weight: get("left-weight-display"),
                right_weight: get("right-weight-display"),
                next_weight: get("next-weight-display"),
                tilt_angle: get("tilt-angle-display"),
                log_area: get("log-area"),
                reset_btn: get("reset-button"),
                document,
            }
        }

        fn set_text(el: &Option<Element>, text: &str) {
            if let Some(el) = el {
                el.set_text_content(Some(text));
            }
        }

        fn rotate_plank(&self, angle: f32) {
            if let Some(plank) = self.plank.as_ref().and_then(|p| p.dyn_ref::<HtmlElement>()) {
                let _ = plank.style().set_property(
                    "transform",
                    &format!("translate(-50%, -50%) rotate({}deg)", angle),
                );
            }
        }

        fn show_readout(&self, state: &PhysicsState) {
            self.rotate_plank(state.angle);
            Self::set_text(&self.left_weight, &format!("{:.1} kg", state.left_load));
            Self::set_text(&self.right_weight, &format!("{:.1} kg", state.right_load));
            Self::set_text(&self.tilt_angle, &format!("{:.1}°", state.angle));
        }

        fn show_preview(&self, visual: &WeightVisual) {
            Self::set_text(&self.next_weight, &format!("{} kg", visual.weight));
            if let Some(ball) = self.preview_ball.as_ref().and_then(|b| b.dyn_ref::<HtmlElement>()) {
                ball.set_text_content(Some(&format!("{}kg", visual.weight)));
                paint_ball(ball, visual);
            }
        }

        fn preview_style(&self, name: &str, value: &str) {
            if let Some(ball) = self.preview_ball.as_ref().and_then(|b| b.dyn_ref::<HtmlElement>()) {
                let _ = ball.style().set_property(name, value);
            }
        }

        fn add_ball(&self, visual: &WeightVisual, click_x: f32) {
            let Some(container) = &self.objects else { return };
            let Ok(ball) = self.document.create_element("div") else { return };
            ball.set_class_name("object");
            ball.set_text_content(Some(&format!("{}kg", visual.weight)));
            if let Some(ball) = ball.dyn_ref::<HtmlElement>() {
                let style = ball.style();
                let _ = style.set_property("left", &format!("{}px", click_x));
                let _ = style.set_property("top", "50%");
                paint_ball(ball, visual);
            }
            let _ = container.append_child(&ball);
        }

        fn log_drop(&self, placement: &Placement) {
            let Some(log_area) = &self.log_area else { return };
            let Ok(line) = self.document.create_element("div") else { return };
            line.set_text_content(Some(&format!(
                "{}kg dropped on {} side at {:.0}px from center",
                placement.object.weight,
                placement.side.as_str(),
                placement.object.distance()
            )));
            let _ = log_area.prepend_with_node_1(&line);
        }

        /// Redraw every ball from scratch
        fn draw_objects(&self, objects: &[PlacedObject], positions: &[f32]) {
            self.clear_balls();
            for (obj, &x) in objects.iter().zip(positions) {
                self.add_ball(&WeightVisual::of(obj.weight), x);
            }
        }

        fn clear_balls(&self) {
            if let Some(el) = &self.objects {
                el.set_inner_html("");
            }
        }

        fn clear(&self) {
            self.clear_balls();
            if let Some(el) = &self.log_area {
                el.set_inner_html("");
            }
        }
    }

    fn paint_ball(ball: &HtmlElement, visual: &WeightVisual) {
        let style = ball.style();
        let _ = style.set_property("width", &format!("{}px", visual.size));
        let _ = style.set_property("height", &format!("{}px", visual.size));
        let _ = style.set_property("background", visual.class.color());
    }

    struct App {
        dom: Dom,
        seesaw: Seesaw<LocalStorage>,
        /// Simulation area bounds, cached while the pointer is over the plank
        sim_rect: Option<DomRect>,
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let storage = LocalStorage::open();
        let settings = Settings::load(&storage);
        let seed = clock_seed();
        let seesaw = Seesaw::new(storage, settings, seed);
        log::info!("Seesaw started with seed: {}", seed);

        let dom = Dom::cache(document);
        dom.show_preview(&seesaw.preview());
        // Pre-set the saved tilt so the plank doesn't snap from level
        dom.rotate_plank(seesaw.readout().angle);

        let app = Rc::new(RefCell::new(App {
            dom,
            seesaw,
            sim_rect: None,
        }));

        setup_plank_click(app.clone());
        setup_preview_hover(app.clone());
        setup_reset_button(app.clone());
        spawn_restore(app);
    }

    fn spawn_restore(app: Rc<RefCell<App>>) {
        let (task, plank) = {
            let mut a = app.borrow_mut();
            if !a.seesaw.has_pending_restore() {
                return;
            }
            let Some(plank) = a.dom.plank.clone() else {
                log::warn!("No plank element, restore skipped");
                return;
            };
            let Some(task) = a.seesaw.begin_restore() else { return };
            (task, plank)
        };

        wasm_bindgen_futures::spawn_local(async move {
            let mut task = task;
            let probe = PlankProbe::new(plank);
            let wait = wait_for_surface(&mut task, &probe, sleep_ms).await;

            let mut a = app.borrow_mut();
            let App { dom, seesaw, .. } = &mut *a;
            match seesaw.complete_restore(&task, wait) {
                RestoreOutcome::Restored { positions, state } => {
                    dom.draw_objects(&seesaw.session().objects, &positions);
                    dom.show_readout(&state);
                }
                RestoreOutcome::Skipped { attempts } => {
                    // The next click lays the stored balls out
                    log::warn!("Restore deferred after {} attempts", attempts);
                    dom.show_readout(&seesaw.readout());
                }
                RestoreOutcome::Cancelled => {}
            }
        });
    }

    fn setup_plank_click(app: Rc<RefCell<App>>) {
        let Some(plank) = app.borrow().dom.plank.clone() else { return };
        let target = plank.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let mut a = app.borrow_mut();
            let App { dom, seesaw, .. } = &mut *a;

            let rect = target.get_bounding_client_rect();
            let x = (event.client_x() as f64 - rect.left()) as f32;
            let visual = seesaw.preview();
            let placement = seesaw.place(x, rect.width() as f32);

            if !placement.relaid.is_empty() {
                let stored = &seesaw.session().objects[..placement.relaid.len()];
                dom.draw_objects(stored, &placement.relaid);
            }
            dom.add_ball(&visual, placement.click_x);
            dom.log_drop(&placement);
            dom.show_preview(&seesaw.preview());
            dom.show_readout(&placement.state);
        });
        let _ = plank.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_preview_hover(app: Rc<RefCell<App>>) {
        let (plank, sim_area) = {
            let a = app.borrow();
            let (Some(plank), Some(_)) = (a.dom.plank.clone(), a.dom.preview_ball.as_ref()) else {
                return;
            };
            (plank, a.dom.sim_area.clone())
        };

        // mouseenter
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.sim_rect = sim_area.as_ref().map(|el| el.get_bounding_client_rect());
                a.dom.preview_style("opacity", "0.45");
            });
            let _ = plank.add_event_listener_with_callback("mouseenter", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // mouseleave
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.sim_rect = None;
                a.dom.preview_style("opacity", "0");
            });
            let _ = plank.add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // mousemove: follow the pointer across the simulation area
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let a = app.borrow();
                let Some(rect) = &a.sim_rect else { return };
                let x = event.client_x() as f64 - rect.left();
                a.dom.preview_style("left", &format!("{}px", x));
                a.dom.preview_style("top", &format!("{}px", rect.height() / 2.0));
            });
            let _ = plank.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_reset_button(app: Rc<RefCell<App>>) {
        let Some(btn) = app.borrow().dom.reset_btn.clone() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let mut a = app.borrow_mut();
            let App { dom, seesaw, .. } = &mut *a;
            seesaw.reset();
            dom.clear();
            dom.show_readout(&seesaw.readout());
            dom.show_preview(&seesaw.preview());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Seesaw (native) starting...");
    log::info!("Native mode is headless - build for wasm32 to play in a browser");

    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drop a few weights, "reload" onto a narrower plank and print the result
#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use seesaw::controller::RestoreOutcome;
    use seesaw::persistence::{MemoryStorage, RestoreStep};
    use seesaw::{Seesaw, Settings};
    use std::time::Duration;

    let seed = 2024;
    let mut seesaw = Seesaw::new(MemoryStorage::new(), Settings::default(), seed);
    for x in [40.0, 160.0, 200.0, 330.0] {
        let p = seesaw.place(x, 400.0);
        println!(
            "{}kg -> {:>6} at {:>6.1}px | L {:>5.1} kg  R {:>5.1} kg  tilt {:>6.1}°",
            p.object.weight,
            p.side.as_str(),
            p.object.offset,
            p.state.left_load,
            p.state.right_load,
            p.state.angle
        );
    }

    // Reload: the plank reports no width for a couple of frames, then 300px
    let storage = seesaw.into_storage();
    let mut reloaded = Seesaw::new(storage, Settings::default(), seed + 1);
    let Some(mut task) = reloaded.begin_restore() else {
        println!("Nothing to restore");
        return;
    };
    let mut widths = [0.0, 0.0, 300.0].into_iter();
    let wait = loop {
        match task.step(widths.next().unwrap_or(300.0)) {
            RestoreStep::Retry { after_ms } => {
                std::thread::sleep(Duration::from_millis(after_ms.into()))
            }
            RestoreStep::Done(wait) => break wait,
        }
    };

    match reloaded.complete_restore(&task, wait) {
        RestoreOutcome::Restored { positions, state } => {
            println!(
                "Restored {} objects at {:?} | tilt {:.1}°",
                positions.len(),
                positions,
                state.angle
            );
        }
        other => println!("Restore did not complete: {:?}", other),
    }
}
