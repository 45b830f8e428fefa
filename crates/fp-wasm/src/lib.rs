//! WASM bridge for FP: exposes the floor-plan editor to the host page.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the `<canvas>`
//! and the DOM listeners and forwards pointer/keyboard events here; the
//! bridge decodes hall map images, calls the host's backend callbacks, and
//! reports editor events as JSON strings to a single event handler.

mod api;
mod render2d;

use api::JsBookingApi;
use fp_core::config::EditorConfig;
use fp_core::id::{ExhibitionId, StandId};
use fp_core::model::{HallMap, Stand, StandStatus, StandType};
use fp_core::surface::{LoadError, LoadTicket};
use fp_editor::input::{Button, InputEvent, Modifiers};
use fp_editor::{BookingGateway, EditorEvent, GatewayError, ImageRequest, MapEditor, Mode, StandForm};
use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// An image being fetched, with the handlers that report back.
struct ImageLoader {
    img: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl ImageLoader {
    fn detach(&self) {
        self.img.set_onload(None);
        self.img.set_onerror(None);
    }
}

/// State shared between the canvas handle and in-flight async work.
struct Shared {
    editor: RefCell<MapEditor>,
    gateway: BookingGateway<JsBookingApi>,
    image: RefCell<Option<HtmlImageElement>>,
    loader: RefCell<Option<ImageLoader>>,
    on_event: RefCell<Option<js_sys::Function>>,
}

impl Shared {
    /// Drain editor events and hand them to the host. Returns whether a
    /// repaint was requested.
    fn flush(&self) -> bool {
        let events = self.editor.borrow_mut().take_events();
        self.emit(events)
    }

    fn emit(&self, events: Vec<EditorEvent>) -> bool {
        let render = events.contains(&EditorEvent::RenderNeeded);
        let handler = self.on_event.borrow().clone();
        if let Some(handler) = handler {
            for event in &events {
                match serde_json::to_string(event) {
                    Ok(json) => {
                        if let Err(err) = handler.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                            log::warn!("event handler threw: {err:?}");
                        }
                    }
                    Err(err) => log::warn!("could not serialize {event:?}: {err}"),
                }
            }
        }
        render
    }

    fn release_loader(&self) {
        if let Some(loader) = self.loader.borrow_mut().take() {
            loader.detach();
        }
    }
}

/// Fetch and decode a hall map image, reporting the natural size back to the
/// editor. Replaces any load still in progress.
fn start_image_load(shared: &Rc<Shared>, request: ImageRequest) -> Result<(), JsValue> {
    shared.release_loader();
    let img = HtmlImageElement::new()?;
    img.set_cross_origin(Some("anonymous"));
    let ImageRequest { ticket, url } = request;

    let onload = {
        let shared = Rc::downgrade(shared);
        let img = img.clone();
        Closure::<dyn FnMut()>::new(move || {
            finish_load(&shared, ticket, || {
                let size = (f64::from(img.natural_width()), f64::from(img.natural_height()));
                (Ok(size), Some(img.clone()))
            });
        })
    };
    let onerror = {
        let shared = Rc::downgrade(shared);
        let url = url.clone();
        Closure::<dyn FnMut()>::new(move || {
            finish_load(&shared, ticket, || {
                let err = LoadError {
                    url: url.clone(),
                    reason: "the image could not be loaded".to_string(),
                };
                (Err(err), None)
            });
        })
    };

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    img.set_src(&url);
    *shared.loader.borrow_mut() = Some(ImageLoader {
        img,
        _onload: onload,
        _onerror: onerror,
    });
    Ok(())
}

type LoadOutcome = (Result<(f64, f64), LoadError>, Option<HtmlImageElement>);

fn finish_load(shared: &Weak<Shared>, ticket: LoadTicket, outcome: impl FnOnce() -> LoadOutcome) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let (result, img) = outcome();
    *shared.image.borrow_mut() = img;
    shared.editor.borrow_mut().finish_image_load(ticket, result);
    shared.flush();
}

/// Run a gateway action as a JS Promise, flushing editor events when it
/// settles. Rejections carry the user-facing message.
fn promise<F>(shared: Rc<Shared>, action: F) -> js_sys::Promise
where
    F: Future<Output = Result<JsValue, GatewayError>> + 'static,
{
    future_to_promise(async move {
        let result = action.await;
        shared.flush();
        result.map_err(|err| JsValue::from_str(&err.user_message()))
    })
}

fn stand_json(stand: &Stand) -> JsValue {
    serde_json::to_string(stand)
        .map(|json| JsValue::from_str(&json))
        .unwrap_or(JsValue::NULL)
}

/// The main WASM-facing controller for one floor-plan canvas.
#[wasm_bindgen]
pub struct FloorPlanCanvas {
    shared: Rc<Shared>,
    dark_mode: bool,
}

#[wasm_bindgen]
impl FloorPlanCanvas {
    /// `mode` is `"owner"` or `"artist"`; `callbacks` is an object holding
    /// the backend functions; `config` is optional `EditorConfig` JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        mode: &str,
        width: f64,
        height: f64,
        callbacks: JsValue,
        config: Option<String>,
    ) -> Result<FloorPlanCanvas, JsValue> {
        init_logging();

        let mode = Mode::parse(mode)
            .ok_or_else(|| JsValue::from_str(&format!("unknown mode {mode:?}")))?;
        let config = EditorConfig::from_json(config.as_deref().unwrap_or(""))
            .map_err(|e| JsValue::from_str(&e))?;
        let mut editor = MapEditor::new(mode, config);
        editor.attach(width, height);
        log::info!("floor plan canvas ready ({mode}, {width}×{height})");

        Ok(Self {
            shared: Rc::new(Shared {
                editor: RefCell::new(editor),
                gateway: BookingGateway::new(JsBookingApi::new(callbacks)),
                image: RefCell::new(None),
                loader: RefCell::new(None),
                on_event: RefCell::new(None),
            }),
            dark_mode: false,
        })
    }

    /// Register the host's event handler. It receives one JSON string per
    /// event (`{"type": "standSelected", ...}`).
    pub fn set_event_handler(&mut self, handler: js_sys::Function) {
        *self.shared.on_event.borrow_mut() = Some(handler);
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    // ─── Host props ──────────────────────────────────────────────────────

    /// Set the hall map from JSON (`null` for none) and load its image.
    pub fn set_hall_map(&mut self, json: &str) -> Result<bool, JsValue> {
        let hall_map: Option<HallMap> =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let request = self.shared.editor.borrow_mut().set_hall_map(hall_map);
        match request {
            Some(request) => start_image_load(&self.shared, request)?,
            None => {
                if self.shared.editor.borrow().hall_map().is_none() {
                    self.shared.release_loader();
                    *self.shared.image.borrow_mut() = None;
                }
            }
        }
        Ok(self.shared.flush())
    }

    /// Replace the stand list from JSON (an array of stands).
    pub fn set_stands(&mut self, json: &str) -> Result<bool, JsValue> {
        let stands: Vec<Stand> =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.shared.editor.borrow_mut().set_stands(stands);
        Ok(self.shared.flush())
    }

    /// Set the exhibition id; empty clears it.
    pub fn set_exhibition(&mut self, id: &str) {
        let id = id.trim();
        let exhibition = (!id.is_empty()).then(|| ExhibitionId::intern(id));
        self.shared.editor.borrow_mut().set_exhibition(exhibition);
    }

    /// Current stands (host-supplied and local) as a JSON array.
    pub fn stands_json(&self) -> String {
        let editor = self.shared.editor.borrow();
        let stands: Vec<&Stand> = editor.registry().all().collect();
        serde_json::to_string(&stands).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn mode(&self) -> String {
        self.shared.editor.borrow().mode().to_string()
    }

    pub fn is_drawing(&self) -> bool {
        self.shared.editor.borrow().interaction().is_drawing()
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let editor = self.shared.editor.borrow();
        let image = self.shared.image.borrow();
        render2d::render_map(
            ctx,
            editor.surface(),
            image.as_ref(),
            &editor.markers(),
            editor.config().marker_radius_px,
            &theme,
        );
    }

    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.shared.editor.borrow_mut().resize(width, height);
        self.shared.flush()
    }

    /// Re-bind after a `teardown` (component remounted).
    pub fn attach(&mut self, width: f64, height: f64) -> bool {
        self.shared.editor.borrow_mut().attach(width, height);
        self.shared.flush()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Returns true if a repaint is needed.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, button: i16, time_ms: f64) -> bool {
        self.input(InputEvent::PointerDown {
            x,
            y,
            button: Button::from_dom(button),
            time_ms,
        })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerMove { x, y })
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, time_ms: f64) -> bool {
        self.input(InputEvent::pointer_up(x, y, time_ms))
    }

    pub fn handle_pointer_leave(&mut self) -> bool {
        self.input(InputEvent::PointerLeave)
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.input(InputEvent::Wheel { x, y, delta_y })
    }

    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.input(InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    /// The stand id under a screen point, for tooltips.
    pub fn stand_at(&self, x: f64, y: f64) -> Option<String> {
        let editor = self.shared.editor.borrow();
        fp_render::hit::hit_test(
            &editor.markers(),
            editor.surface(),
            fp_core::Point::new(x, y),
            editor.config().marker_radius_px,
        )
        .map(|id| id.as_str().to_string())
    }

    fn input(&mut self, event: InputEvent) -> bool {
        let events = self.shared.editor.borrow_mut().handle_input(event);
        self.shared.emit(events)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn toggle_add_stand(&mut self, on: bool) -> bool {
        self.shared.editor.borrow_mut().toggle_add_stand(on);
        self.shared.flush()
    }

    pub fn cancel_form(&mut self) -> bool {
        self.shared.editor.borrow_mut().cancel_form();
        self.shared.flush()
    }

    /// Call periodically (or from a timer) with the host clock.
    pub fn expire_abandoned_placement(&mut self, now_ms: f64) -> bool {
        self.shared
            .editor
            .borrow_mut()
            .expire_abandoned_placement(now_ms);
        self.shared.flush()
    }

    pub fn zoom_in(&mut self) -> bool {
        self.shared.editor.borrow_mut().zoom_in();
        self.shared.flush()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.shared.editor.borrow_mut().zoom_out();
        self.shared.flush()
    }

    pub fn zoom_to_fit(&mut self) -> bool {
        self.shared.editor.borrow_mut().fit();
        self.shared.flush()
    }

    // ─── Backend actions (Promises) ──────────────────────────────────────

    /// Submit the placement form. Resolves with the new stand's JSON.
    pub fn submit_stand(
        &self,
        stand_number: String,
        width: f64,
        height: f64,
        stand_type: &str,
    ) -> js_sys::Promise {
        let form = StandForm::new(stand_number, StandType::parse(stand_type)).with_size(width, height);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            let stand = shared.gateway.create_stand(&shared.editor, &form).await?;
            Ok(stand_json(&stand))
        })
    }

    pub fn book_stand(&self, stand_id: &str) -> js_sys::Promise {
        let id = StandId::intern(stand_id);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared.gateway.book_stand(&shared.editor, id).await?;
            Ok(JsValue::TRUE)
        })
    }

    pub fn approve_booking(&self, stand_id: &str) -> js_sys::Promise {
        let id = StandId::intern(stand_id);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared.gateway.approve_booking(&shared.editor, id).await?;
            Ok(JsValue::TRUE)
        })
    }

    pub fn reject_booking(&self, stand_id: &str, reason: String) -> js_sys::Promise {
        let id = StandId::intern(stand_id);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared
                .gateway
                .reject_booking(&shared.editor, id, &reason)
                .await?;
            Ok(JsValue::TRUE)
        })
    }

    pub fn change_stand_status(&self, stand_id: &str, status: &str) -> js_sys::Promise {
        let id = StandId::intern(stand_id);
        let status = StandStatus::parse(status);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared
                .gateway
                .change_stand_status(&shared.editor, id, status)
                .await?;
            Ok(JsValue::TRUE)
        })
    }

    pub fn delete_stand(&self, stand_id: &str) -> js_sys::Promise {
        let id = StandId::intern(stand_id);
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared.gateway.delete_stand(&shared.editor, id).await?;
            Ok(JsValue::TRUE)
        })
    }

    /// Re-fetch the current hall map's stands.
    pub fn refresh_stands(&self) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            shared.gateway.refresh_stands(&shared.editor).await?;
            Ok(JsValue::TRUE)
        })
    }

    /// Resolves with the exhibition's hall maps as a JSON array.
    pub fn load_hall_maps(&self) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            let maps = shared.gateway.load_hall_maps(&shared.editor).await?;
            let json = serde_json::to_string(&maps).unwrap_or_else(|_| "[]".to_string());
            Ok(JsValue::from_str(&json))
        })
    }

    /// Upload a floor-plan image and show it. Resolves with the image URL.
    pub fn upload_hall_map(&self, file: web_sys::File) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        promise(Rc::clone(&shared), async move {
            let request = shared.gateway.upload_hall_map(&shared.editor, file).await?;
            let url = request.url.clone();
            if let Err(err) = start_image_load(&shared, request) {
                log::warn!("could not start loading {url}: {err:?}");
            }
            Ok(JsValue::from_str(&url))
        })
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Release the map: pending image loads are abandoned and late backend
    /// responses are ignored. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.shared.release_loader();
        *self.shared.image.borrow_mut() = None;
        self.shared.editor.borrow_mut().teardown();
    }
}

impl Drop for FloorPlanCanvas {
    fn drop(&mut self) {
        self.shared.release_loader();
    }
}

// ─── Logging & panic hook ────────────────────────────────────────────────

fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FP WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if console_log::init_with_level(log::Level::Debug).is_err() {
                web_sys::console::warn_1(&"FP: logger already installed".into());
            }
        });
    }
}
