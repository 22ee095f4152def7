//! `wasm-bindgen` exports for the marquee.

use blendreel_core::ambient::Viewport;
use blendreel_core::cursor::SpotlightMode;
use blendreel_core::input::{InputEvent, PointerPhase, TouchPhase};
use blendreel_core::session::{MarqueeSession, SessionFrame};
use blendreel_core::{ImageHandle, ImageId, MarqueeConfig, MarqueeError, MeasuredSize};
use js_sys::{Array, Float64Array, Object, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, HtmlImageElement, Node};

use crate::clock::host_time;
use crate::logging::{install_console_logging, parse_level};
use crate::plan::{CloneOp, DomPlan, FrameWrites, SlotStyle, WriteCache};

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn to_js_err(err: &MarqueeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn install_panic_hook() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let global = js_sys::global();
            if let Ok(console) = Reflect::get(&global, &"console".into()) {
                if let Ok(error) = Reflect::get(&console, &"error".into()) {
                    if let Ok(f) = error.dyn_into::<js_sys::Function>() {
                        let _ = f.call1(&console, &JsValue::from_str(&format!("{info}")));
                    }
                }
            }
        }));
    });
}

/// Session seed from the platform RNG, falling back to the wall clock.
fn session_seed() -> u64 {
    getrandom::u64().unwrap_or_else(|_| {
        web_time::SystemTime::now()
            .duration_since(web_time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64)
    })
}

fn window_viewport() -> Viewport {
    let Some(window) = web_sys::window() else {
        return Viewport::default();
    };
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
    match (dim(window.inner_width()), dim(window.inner_height())) {
        (Some(w), Some(h)) => Viewport::new(w, h),
        _ => Viewport::default(),
    }
}

fn measure(img: &HtmlImageElement) -> MeasuredSize {
    MeasuredSize {
        rendered_width: img.get_bounding_client_rect().width(),
        client_width: f64::from(img.client_width()),
        natural_width: f64::from(img.natural_width()),
        natural_height: f64::from(img.natural_height()),
    }
}

fn apply_style(el: &HtmlElement, style: &SlotStyle) {
    let css = el.style();
    for (name, value) in style.properties() {
        let _ = css.set_property(name, &value);
    }
}

fn clone_image(img: &HtmlImageElement, op: &CloneOp) -> Option<HtmlElement> {
    let node = img.clone_node_with_deep(true).ok()?;
    let el = node.dyn_into::<HtmlElement>().ok()?;
    apply_style(&el, &op.style);
    Some(el)
}

/// DOM nodes the marquee writes to.
struct Mount {
    wrapper: HtmlElement,
    container: HtmlElement,
    images: Vec<HtmlImageElement>,
}

impl Mount {
    fn image(&self, id: ImageId) -> Option<&HtmlImageElement> {
        self.images.get(id.0 as usize)
    }

    fn hide(&self, ids: &[ImageId]) {
        for id in ids {
            if let Some(img) = self.image(*id) {
                let _ = img.style().set_property("display", "none");
            }
        }
    }

    fn apply_plan(&self, plan: &DomPlan) {
        for (id, style) in &plan.originals {
            if let Some(img) = self.image(*id) {
                let _ = img.style().set_property("display", "block");
                apply_style(img, style);
            }
        }

        let first_original = plan.originals.first().and_then(|(id, _)| self.image(*id));
        for op in &plan.before {
            let Some(clone) = self.image(op.source).and_then(|img| clone_image(img, op)) else {
                continue;
            };
            let anchor = first_original.map(AsRef::<Node>::as_ref);
            let _ = self.wrapper.insert_before(&clone, anchor);
        }
        for op in &plan.after {
            if let Some(clone) = self.image(op.source).and_then(|img| clone_image(img, op)) {
                let _ = self.wrapper.append_child(&clone);
            }
        }

        let _ = self
            .wrapper
            .style()
            .set_property("width", &format!("{}px", plan.wrapper_width));
        debug!(nodes = plan.node_count(), width = plan.wrapper_width, "region mounted");
    }
}

/// Infinite blended image marquee bound to a wrapper and its scroll container.
///
/// Host-driven: JavaScript forwards DOM events and calls [`Self::frame`] from
/// `requestAnimationFrame`.
#[wasm_bindgen]
pub struct BlendReelWeb {
    session: MarqueeSession,
    mount: Option<Mount>,
    cache: WriteCache,
    plan: Option<DomPlan>,
}

impl Default for BlendReelWeb {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BlendReelWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            session: MarqueeSession::with_defaults(window_viewport(), 0),
            mount: None,
            cache: WriteCache::default(),
            plan: None,
        }
    }

    /// Install console logging at `level` (`"error"` .. `"trace"`).
    #[wasm_bindgen(js_name = installLogging)]
    pub fn install_logging(level: &str) {
        install_console_logging(parse_level(level));
    }

    /// Discover the wrapper's `img` children and start loading.
    ///
    /// `options_json` may be empty for defaults. A wrapper without images
    /// rejects with `"no images loaded"`; the session is skipped and every
    /// later call is inert.
    pub fn init(
        &mut self,
        wrapper: HtmlElement,
        container: HtmlElement,
        options_json: &str,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let config = MarqueeConfig::from_json_str(options_json).map_err(|e| to_js_err(&e))?;
        self.session = MarqueeSession::new(config, window_viewport(), session_seed())
            .map_err(|e| to_js_err(&e))?;
        self.cache.reset();
        self.plan = None;

        let nodes = wrapper.query_selector_all("img")?;
        let images: Vec<HtmlImageElement> = (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<HtmlImageElement>().ok())
            .collect();

        // Decoded-at-discovery images are reported right away; the host's
        // load listeners would never fire for them.
        let handles = images
            .iter()
            .enumerate()
            .map(|(i, img)| ImageHandle::new(ImageId(i as u32), img.src()))
            .collect();
        let decoded: Vec<(ImageId, MeasuredSize)> = images
            .iter()
            .enumerate()
            .filter(|(_, img)| img.complete() && img.natural_height() > 0)
            .map(|(i, img)| (ImageId(i as u32), measure(img)))
            .collect();

        self.mount = Some(Mount {
            wrapper,
            container,
            images,
        });

        let now = host_time(now_ms);
        if let Err(e) = self.session.discover(handles, now) {
            if e.is_skip() {
                warn!("no images in wrapper, marquee skipped");
            }
            return Err(to_js_err(&e));
        }
        for (id, size) in decoded {
            self.session
                .image_loaded(id, size, now)
                .map_err(|e| to_js_err(&e))?;
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = imageLoaded)]
    pub fn image_loaded(&mut self, index: u32, now_ms: f64) -> Result<(), JsValue> {
        let id = ImageId(index);
        let size = self
            .mount
            .as_ref()
            .and_then(|m| m.image(id))
            .map(measure)
            .unwrap_or_default();
        self.session
            .image_loaded(id, size, host_time(now_ms))
            .map_err(|e| to_js_err(&e))
    }

    #[wasm_bindgen(js_name = imageFailed)]
    pub fn image_failed(&mut self, index: u32, now_ms: f64) -> Result<(), JsValue> {
        self.session
            .image_failed(ImageId(index), host_time(now_ms))
            .map_err(|e| to_js_err(&e))
    }

    /// Advance one frame, apply its DOM writes, and return
    /// `{ phase, offset, velocity, blur, unitWidth, autoplay, momentum,
    /// animating }`.
    ///
    /// On the frame where loading ends with nothing usable (timeouts
    /// included) the object also carries `error`.
    pub fn frame(&mut self, now_ms: f64) -> JsValue {
        let frame = self.session.frame(host_time(now_ms));
        self.apply(&frame);

        let obj = Object::new();
        set_js(&obj, "phase", JsValue::from_str(frame.phase.as_str()));
        if FrameWrites::skipped(&frame.events) {
            set_js(&obj, "error", JsValue::from_str(&MarqueeError::NoImages.to_string()));
        }
        if let Some(m) = frame.motion {
            set_js(&obj, "offset", JsValue::from_f64(m.offset));
            set_js(&obj, "velocity", JsValue::from_f64(m.velocity));
            set_js(&obj, "blur", JsValue::from_f64(m.blur));
            set_js(
                &obj,
                "unitWidth",
                m.unit_width.map_or(JsValue::NULL, JsValue::from_f64),
            );
            set_js(&obj, "autoplay", JsValue::from_bool(m.autoplay_running));
            set_js(&obj, "momentum", JsValue::from_bool(m.momentum_running));
            set_js(&obj, "animating", JsValue::from_bool(m.is_animating()));
        }
        obj.into()
    }

    /// Returns `true` when the host should call `preventDefault`.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.session.input(InputEvent::wheel(delta_y))
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&mut self, x: f64, y: f64, now_ms: f64) {
        self.session
            .input(InputEvent::touch(TouchPhase::Start, x, y, now_ms));
    }

    /// Returns `true` for a horizontal drag the host should `preventDefault`.
    #[wasm_bindgen(js_name = touchMove)]
    pub fn touch_move(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.session
            .input(InputEvent::touch(TouchPhase::Move, x, y, now_ms))
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&mut self, now_ms: f64) {
        self.session
            .input(InputEvent::touch(TouchPhase::End, 0.0, 0.0, now_ms));
    }

    /// The container scrolled by means the marquee did not cause.
    pub fn scroll(&mut self, scroll_left: f64) {
        self.session.input(InputEvent::scroll(scroll_left));
    }

    /// Apply one JSON-encoded input record. Malformed input is logged and
    /// dropped.
    #[wasm_bindgen(js_name = pushEncodedInput)]
    pub fn push_encoded_input(&mut self, json: &str) -> bool {
        match InputEvent::from_json_str(json) {
            Ok(event) => self.session.input(event),
            Err(err) => {
                warn!(%err, "dropping malformed encoded input");
                false
            }
        }
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session
            .input(InputEvent::pointer(PointerPhase::Move, x, y));
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.session
            .input(InputEvent::pointer(PointerPhase::Leave, 0.0, 0.0));
    }

    #[wasm_bindgen(js_name = pointerEnter)]
    pub fn pointer_enter(&mut self) {
        self.session
            .input(InputEvent::pointer(PointerPhase::Enter, 0.0, 0.0));
    }

    #[wasm_bindgen(js_name = containerHover)]
    pub fn container_hover(&mut self, inside: bool) {
        self.session.input(InputEvent::Hover(inside));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session
            .input(InputEvent::Resize(Viewport::new(width, height)));
    }

    #[wasm_bindgen(js_name = setShaderAvailable)]
    pub fn set_shader_available(&mut self, available: bool) {
        self.session.set_shader_available(available);
    }

    #[wasm_bindgen(js_name = setAutoplay)]
    pub fn set_autoplay(&mut self, enabled: bool) {
        self.session.set_autoplay_enabled(enabled);
    }

    /// Ambient circles as flat `[x, y, size, ...]`.
    #[wasm_bindgen(js_name = ambientPositions)]
    pub fn ambient_positions(&self) -> Float64Array {
        Float64Array::from(self.session.ambient().positions().as_slice())
    }

    /// `{ x, y, size, active, hovering }` for the cursor disc.
    #[wasm_bindgen(js_name = cursorState)]
    pub fn cursor_state(&self) -> JsValue {
        let cursor = self.session.cursor();
        let (x, y) = cursor.position();
        let obj = Object::new();
        set_js(&obj, "x", JsValue::from_f64(x));
        set_js(&obj, "y", JsValue::from_f64(y));
        set_js(&obj, "size", JsValue::from_f64(cursor.size()));
        set_js(&obj, "active", JsValue::from_bool(cursor.is_active()));
        set_js(&obj, "hovering", JsValue::from_bool(cursor.is_hovering()));
        obj.into()
    }

    /// Spotlight uniforms plus the chosen presentation (`null` until decided).
    #[wasm_bindgen(js_name = spotlightState)]
    pub fn spotlight_state(&self) -> JsValue {
        let u = self.session.spotlight();
        let obj = Object::new();
        set_js(&obj, "mouseX", JsValue::from_f64(u.mouse.0));
        set_js(&obj, "mouseY", JsValue::from_f64(u.mouse.1));
        set_js(&obj, "time", JsValue::from_f64(u.time));
        set_js(&obj, "aspectRatio", JsValue::from_f64(u.aspect_ratio));
        set_js(&obj, "intensity", JsValue::from_f64(u.intensity));
        set_js(&obj, "radius", JsValue::from_f64(u.radius));
        let mode = self.session.spotlight_mode().map_or(JsValue::NULL, |m| {
            JsValue::from_str(match m {
                SpotlightMode::Shader => "shader",
                SpotlightMode::CursorBlend => "cursor-blend",
            })
        });
        set_js(&obj, "mode", mode);
        obj.into()
    }

    /// The applied DOM plan as JSON, or `null` before the region exists.
    #[wasm_bindgen(js_name = planJson)]
    pub fn plan_json(&self) -> JsValue {
        self.plan
            .as_ref()
            .and_then(|p| serde_json::to_string(p).ok())
            .map_or(JsValue::NULL, |s| JsValue::from_str(&s))
    }

    /// Drain recorded per-frame motion stats as JSONL lines.
    #[wasm_bindgen(js_name = drainFrameStatsJsonl)]
    pub fn drain_frame_stats_jsonl(&mut self, run_id: String) -> Array {
        let out = Array::new();
        for line in self.session.drain_frame_stats(&run_id) {
            out.push(&JsValue::from_str(&line));
        }
        out
    }
}

impl BlendReelWeb {
    fn apply(&mut self, frame: &SessionFrame) {
        let Some(mount) = &self.mount else {
            return;
        };
        let writes = FrameWrites::collect(&frame.events, frame.motion.as_ref());
        mount.hide(&writes.hide);

        if writes.apply_plan {
            if let Some(plan) = DomPlan::from_session(&self.session) {
                mount.apply_plan(&plan);
                self.cache.reset();
                self.plan = Some(plan);
            }
        }

        if let Some(px) = writes.scroll_left.and_then(|left| self.cache.scroll(left)) {
            mount.container.set_scroll_left(px);
        }
        if let Some(filter) = writes.blur_px.and_then(|blur| self.cache.filter(blur)) {
            let _ = mount.wrapper.style().set_property("filter", &filter);
        }
    }
}
