use framewatch_core::{Channel, Envelope, FramewatchError, HostMessage};
use tracing::debug;
use wasm_bindgen::JsValue;
use web_sys::Window;

/// `postMessage` to the embedding window.
pub struct PostMessageChannel {
    target: Option<Window>,
    target_origin: String,
}

impl PostMessageChannel {
    /// Posts to `window.parent`. With no parent there is nobody to tell, and
    /// every send is a no-op.
    pub fn to_parent(window: &Window, target_origin: impl Into<String>) -> Self {
        let target = window.parent().ok().flatten();
        if target.is_none() {
            debug!("No parent window; snapshots will be dropped");
        }
        Self {
            target,
            target_origin: target_origin.into(),
        }
    }

    fn post(&self, target: &Window, message: &HostMessage) -> Result<(), FramewatchError> {
        let envelope = Envelope::Snapshot(*message);
        let value = serde_wasm_bindgen::to_value(&envelope)
            .map_err(|e| FramewatchError::Serialize(e.to_string()))?;
        target
            .post_message(&value, &self.target_origin)
            .map_err(|e| FramewatchError::Serialize(js_err(e)))
    }
}

impl Channel for PostMessageChannel {
    fn send(&self, message: &HostMessage) {
        let Some(target) = &self.target else {
            return;
        };
        if let Err(e) = self.post(target, message) {
            debug!(error = %e, "Failed to post snapshot");
        }
    }
}

pub(crate) fn js_err(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
