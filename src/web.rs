#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use gloo_events::{EventListener, EventListenerOptions};
use log::{debug, error, info, warn};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlElement};

use crate::app::{ViewerApp, ViewerCommand};
use crate::config::{display_size, ViewerConfig};
use crate::error::ViewerError;
use crate::input::{PointerButton, PointerEvent};
use crate::panel::{ControlSpec, PanelLayout};
use crate::render::Renderer;
use crate::store::LocalStorage;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Viewer attached to the page's `#scene` canvas.
#[wasm_bindgen]
pub struct WebViewer {
    state: Rc<RefCell<WebState>>,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Finds the canvas, creates the renderer, selects scene 0 and starts
    /// drawing on `requestAnimationFrame`.
    pub async fn attach() -> Result<WebViewer, JsValue> {
        let config = ViewerConfig::default();
        let window = web_sys::window().ok_or_else(|| js_error("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| js_error("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(&config.canvas_id)
            .and_then(|element| element.dyn_into().ok())
            .ok_or_else(|| js_error(ViewerError::MissingSurface(config.canvas_id.clone())))?;

        let store = LocalStorage::open().map_err(|err| js_error(format!("{err:#}")))?;
        let (app, switch) = ViewerApp::new(config, store, "0");
        let size = canvas_size(&canvas, app.viewer().config().max_pixel_ratio);
        canvas.set_width(size.0);
        canvas.set_height(size.1);
        let renderer = Renderer::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), size)
            .await
            .map_err(|err| js_error(format!("{err:#}")))?;

        let state = Rc::new(RefCell::new(WebState {
            app,
            renderer,
            canvas: canvas.clone(),
            last_timestamp: None,
        }));
        let listeners = attach_listeners(&state, &document, &canvas);
        if switch.loop_started {
            schedule_frames(Rc::clone(&state));
        }
        info!("viewer attached to #{}", canvas.id());

        Ok(WebViewer {
            state,
            _listeners: listeners,
        })
    }

    pub fn select_scene(&self, raw: &str) {
        self.state.borrow_mut().app.select_scene(raw);
    }

    /// Edits one panel control. `value` is the control's textual value
    /// (`"1.5"`, `"true"`, `"#ff8800"`).
    pub fn set_control(&self, path: &str, value: &str) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .app
            .apply(ViewerCommand::SetControl {
                path: path.to_string(),
                raw: value.to_string(),
            })
            .map_err(js_error)
    }

    pub fn reset_panel(&self) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .app
            .apply(ViewerCommand::ResetPanel)
            .map_err(js_error)
    }

    pub fn panel_controls(&self) -> Result<String, JsValue> {
        #[derive(Serialize)]
        struct PanelDescription<'a> {
            layout: &'a PanelLayout,
            controls: &'a [ControlSpec],
        }
        let state = self.state.borrow();
        let panel = state.app.panel();
        serde_json::to_string(&PanelDescription {
            layout: panel.layout(),
            controls: panel.controls(),
        })
        .map_err(js_error)
    }

    pub fn fps(&self) -> f32 {
        self.state.borrow().app.fps()
    }

    pub fn panel_state(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.borrow().app.panel_state()).map_err(js_error)
    }
}

struct WebState {
    app: ViewerApp<LocalStorage>,
    renderer: Renderer,
    canvas: HtmlCanvasElement,
    last_timestamp: Option<f64>,
}

impl WebState {
    fn pixel_ratio(&self) -> f32 {
        let device_ratio = web_sys::window().map_or(1.0, |window| window.device_pixel_ratio());
        device_ratio.min(self.app.viewer().config().max_pixel_ratio) as f32
    }

    fn surface_position(&self, event: &web_sys::MouseEvent) -> Vec2 {
        Vec2::new(event.offset_x() as f32, event.offset_y() as f32) * self.pixel_ratio()
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Err(err) = self.app.apply(ViewerCommand::Pointer(event)) {
            warn!("pointer input rejected: {err}");
        }
    }

    /// Runs one frame. Returns whether another frame should be scheduled.
    fn frame(&mut self, timestamp: f64) -> bool {
        let delta = self
            .last_timestamp
            .map_or(0.0, |last| ((timestamp - last) / 1000.0) as f32);
        self.last_timestamp = Some(timestamp);

        let size = canvas_size(&self.canvas, self.app.viewer().config().max_pixel_ratio);
        if (self.canvas.width(), self.canvas.height()) != size {
            self.canvas.set_width(size.0);
            self.canvas.set_height(size.1);
        }
        match self.app.tick(delta, size, &mut self.renderer) {
            Ok(Some(report)) => {
                if report.fps_due() {
                    debug!("frame {}: {}", report.frame, report.fps_label());
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                error!("frame failed: {err}");
                false
            }
        }
    }
}

fn canvas_size(canvas: &HtmlCanvasElement, max_pixel_ratio: f64) -> (u32, u32) {
    let device_ratio = web_sys::window().map_or(1.0, |window| window.device_pixel_ratio());
    display_size(
        (canvas.client_width() as f64, canvas.client_height() as f64),
        device_ratio,
        max_pixel_ratio,
    )
}

fn schedule_frames(state: Rc<RefCell<WebState>>) {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);
    *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        if state.borrow_mut().frame(timestamp) {
            request_animation_frame(&next);
        }
    }));
    request_animation_frame(&callback);
}

fn request_animation_frame(callback: &Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Some(closure) = callback.borrow().as_ref() {
        if let Err(err) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            error!("requestAnimationFrame failed: {err:?}");
        }
    }
}

fn attach_listeners(
    state: &Rc<RefCell<WebState>>,
    document: &web_sys::Document,
    canvas: &HtmlCanvasElement,
) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    let shared = Rc::clone(state);
    listeners.push(EventListener::new(canvas, "pointermove", move |event| {
        let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() else {
            return;
        };
        let mut state = shared.borrow_mut();
        let position = state.surface_position(event);
        state.pointer(PointerEvent::Moved { position });
    }));

    let shared = Rc::clone(state);
    listeners.push(EventListener::new(canvas, "pointerdown", move |event| {
        let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() else {
            return;
        };
        let Ok(button) = u8::try_from(event.button()) else {
            return;
        };
        let mut state = shared.borrow_mut();
        let position = state.surface_position(event);
        state.pointer(PointerEvent::Pressed {
            button: PointerButton::new(button),
            position,
        });
    }));

    let shared = Rc::clone(state);
    listeners.push(EventListener::new(canvas, "pointerup", move |event| {
        let Some(event) = event.dyn_ref::<web_sys::MouseEvent>() else {
            return;
        };
        let Ok(button) = u8::try_from(event.button()) else {
            return;
        };
        let mut state = shared.borrow_mut();
        let position = state.surface_position(event);
        state.pointer(PointerEvent::Released {
            button: PointerButton::new(button),
            position,
        });
    }));

    let shared = Rc::clone(state);
    listeners.push(EventListener::new_with_options(
        canvas,
        "wheel",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(event) = event.dyn_ref::<web_sys::WheelEvent>() else {
                return;
            };
            event.prevent_default();
            shared.borrow_mut().pointer(PointerEvent::Wheel {
                delta_y: event.delta_y() as f32,
            });
        },
    ));

    listeners.push(EventListener::new_with_options(
        canvas,
        "contextmenu",
        EventListenerOptions::enable_prevent_default(),
        |event| event.prevent_default(),
    ));

    let target = canvas.clone();
    listeners.push(EventListener::new(canvas, "dblclick", move |event| {
        let on_canvas = event
            .target()
            .and_then(|target| target.dyn_into::<HtmlCanvasElement>().ok())
            .is_some_and(|element| element == target);
        if on_canvas {
            toggle_fullscreen(&target);
        }
    }));

    let Ok(buttons) = document.query_selector_all("[data-scene]") else {
        return listeners;
    };
    for index in 0..buttons.length() {
        let Some(button) = buttons
            .get(index)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        let shared = Rc::clone(state);
        let element = button.clone();
        listeners.push(EventListener::new(&button, "click", move |_| {
            let raw = element.dataset().get("scene").unwrap_or_default();
            shared.borrow_mut().app.select_scene(&raw);
        }));
    }
    listeners
}

fn toggle_fullscreen(canvas: &HtmlCanvasElement) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let result = if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
        Ok(())
    } else {
        canvas.request_fullscreen()
    };
    if let Err(err) = result {
        warn!("fullscreen request failed: {err:?}");
    }
}
