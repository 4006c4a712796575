//! Outbound messages to the host context.

use serde::{Deserialize, Serialize};

use crate::snapshot::VideoSnapshot;

/// The serializable shape the host receives. Only `exists` is required;
/// absent fields are omitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMessage {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

impl HostMessage {
    /// Clears stale host state.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<&VideoSnapshot> for HostMessage {
    fn from(snapshot: &VideoSnapshot) -> Self {
        Self {
            exists: snapshot.exists,
            duration: snapshot.duration,
            current_time: snapshot.current_time,
            paused: snapshot.paused,
        }
    }
}

/// Tagged envelope for messages crossing the frame boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Envelope {
    /// Frame to host.
    #[serde(rename = "framewatch:snapshot")]
    Snapshot(HostMessage),
    /// Host to frame: "send me what you have".
    #[serde(rename = "framewatch:update")]
    UpdateRequest,
}

/// One-directional, fire-and-forget sink.
///
/// Implementations must not block and must swallow transport failures; the
/// host may be slow or absent.
pub trait Channel {
    fn send(&self, message: &HostMessage);
}
