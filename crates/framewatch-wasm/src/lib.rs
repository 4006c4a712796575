//! Browser bindings: [`FrameEngine`] runs inside the embedded player frame,
//! [`SnapshotListener`] in the page that embeds it.

mod channel;
mod host;
pub mod logging;
mod page;
mod platform;

use std::cell::RefCell;
use std::rc::Rc;

use framewatch_core::{DiscoveryScheduler, EngineConfig, Envelope, FramewatchError, Trigger};
use framewatch_detect::{HostDatabase, PlayerLocator};
use tracing::info;
use wasm_bindgen::prelude::*;
use web_sys::{Event, MessageEvent};

use crate::channel::PostMessageChannel;
use crate::page::DomPage;
use crate::platform::{dispatch, BrowserPlatform, Engine, Listener, WeakEngine};

pub use crate::host::SnapshotListener;

/// Any origin may embed the frame.
const TARGET_ORIGIN: &str = "*";

#[wasm_bindgen]
pub struct FrameEngine {
    engine: Rc<RefCell<Engine>>,
    inbound: Option<Listener>,
}

#[wasm_bindgen]
impl FrameEngine {
    /// `config` is `undefined`, a (partial) config object, or a TOML string.
    /// `hosts_toml` adds to or replaces the built-in host rules by name.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, hosts_toml: Option<String>) -> Result<FrameEngine, JsValue> {
        let config = load_config(config).map_err(to_js)?;
        logging::init(&config.log_level);

        let mut db = HostDatabase::embedded();
        if let Some(hosts_toml) = hosts_toml {
            let user = HostDatabase::from_toml(&hosts_toml)
                .map_err(|e| to_js(FramewatchError::from(e)))?;
            db.merge_user(&user);
        }

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("framewatch: no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("framewatch: no document"))?;
        let channel = PostMessageChannel::to_parent(&window, TARGET_ORIGIN);

        let engine = Rc::new_cyclic(|weak: &WeakEngine| {
            let page = DomPage::new(window.clone(), document);
            let platform = BrowserPlatform::new(page, window.clone(), weak.clone());
            RefCell::new(DiscoveryScheduler::new(
                platform,
                channel,
                PlayerLocator::new(db),
                config,
            ))
        });

        let weak = Rc::downgrade(&engine);
        let inbound = Listener::new(window.into(), "message", move |event| {
            if is_update_request(&event) {
                dispatch(&weak, Trigger::UpdateRequested);
            }
        });

        info!(hosts = engine.borrow().locator().database().len(), "Frame engine started");
        engine.borrow_mut().start();

        Ok(Self {
            engine,
            inbound: Some(inbound),
        })
    }

    /// Same as a host update request.
    #[wasm_bindgen(js_name = requestUpdate)]
    pub fn request_update(&self) {
        dispatch(&Rc::downgrade(&self.engine), Trigger::UpdateRequested);
    }

    /// `"idle"`, `"probing"` or `"tracking"`.
    pub fn state(&self) -> String {
        self.engine.borrow().state().as_str().to_string()
    }

    /// Release every timer, observer and listener the engine holds, including
    /// the host update listener. The engine stays quiet afterwards.
    pub fn stop(&mut self) {
        self.inbound = None;
        if let Ok(mut engine) = self.engine.try_borrow_mut() {
            engine.stop();
        }
    }
}

fn load_config(value: JsValue) -> Result<EngineConfig, FramewatchError> {
    if value.is_undefined() || value.is_null() {
        return Ok(EngineConfig::default());
    }
    if let Some(toml_str) = value.as_string() {
        return EngineConfig::from_toml(&toml_str);
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| FramewatchError::Config(e.to_string()))
}

fn is_update_request(event: &Event) -> bool {
    let Some(event) = event.dyn_ref::<MessageEvent>() else {
        return false;
    };
    matches!(
        serde_wasm_bindgen::from_value::<Envelope>(event.data()),
        Ok(Envelope::UpdateRequest)
    )
}

fn to_js(err: FramewatchError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
