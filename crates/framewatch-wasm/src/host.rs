//! Host-side half: receives snapshots posted by the frame.

use std::cell::RefCell;
use std::rc::Rc;

use framewatch_core::inbox::DEFAULT_STALE_AFTER_MS;
use framewatch_core::{Envelope, SnapshotInbox};
use tracing::trace;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, Window};

use crate::channel::js_err;
use crate::platform::Listener;

/// Keeps the most recent snapshot posted to this page. Readings go stale
/// after `stale_after_ms` without a new message. When `frame_origin` is set,
/// snapshots posted from any other origin are dropped.
#[wasm_bindgen]
pub struct SnapshotListener {
    inbox: Rc<RefCell<SnapshotInbox>>,
    _listener: Listener,
}

#[wasm_bindgen]
impl SnapshotListener {
    #[wasm_bindgen(constructor)]
    pub fn new(
        stale_after_ms: Option<u32>,
        frame_origin: Option<String>,
    ) -> Result<SnapshotListener, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("framewatch: no window"))?;
        let stale_after_ms = stale_after_ms.map_or(DEFAULT_STALE_AFTER_MS, u64::from);
        let mut inbox = SnapshotInbox::new(stale_after_ms);
        if let Some(origin) = frame_origin {
            inbox = inbox.allow_origin(origin);
        }
        let inbox = Rc::new(RefCell::new(inbox));

        let sink = inbox.clone();
        let listener = Listener::new(window.into(), "message", move |event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            match serde_wasm_bindgen::from_value::<Envelope>(event.data()) {
                Ok(Envelope::Snapshot(message)) => {
                    let origin = event.origin();
                    if !sink.borrow_mut().receive_from(&origin, message, now_ms()) {
                        trace!(%origin, "Ignoring snapshot from unexpected origin");
                    }
                }
                Ok(Envelope::UpdateRequest) => {}
                Err(e) => trace!(error = %e, "Ignoring foreign message"),
            }
        });

        Ok(Self {
            inbox,
            _listener: listener,
        })
    }

    /// The latest fresh snapshot, or `null`.
    pub fn latest(&self) -> Result<JsValue, JsValue> {
        match self.inbox.borrow().current(now_ms()) {
            Some(message) => {
                serde_wasm_bindgen::to_value(message).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Forget the last snapshot, e.g. after the host page navigated.
    pub fn reset(&self) {
        self.inbox.borrow_mut().reset();
    }

    /// Ask a frame to re-check its player right away.
    #[wasm_bindgen(js_name = requestUpdate)]
    pub fn request_update(&self, frame: &Window) -> Result<(), JsValue> {
        let request = serde_wasm_bindgen::to_value(&Envelope::UpdateRequest)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        frame
            .post_message(&request, "*")
            .map_err(|e| JsValue::from_str(&js_err(e)))
    }
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}
