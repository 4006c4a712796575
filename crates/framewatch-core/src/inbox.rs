use crate::channel::HostMessage;

/// Messages older than this are treated as "no video".
pub const DEFAULT_STALE_AFTER_MS: u64 = 3000;

/// Host-side holder for the latest message received from a frame.
///
/// A frame that stops reporting (navigated away, player torn down) must not
/// leave the host showing playback forever, so readings expire.
#[derive(Debug, Clone)]
pub struct SnapshotInbox {
    latest: Option<(u64, HostMessage)>,
    stale_after_ms: u64,
    allowed_origins: Vec<String>,
}

impl Default for SnapshotInbox {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER_MS)
    }
}

impl SnapshotInbox {
    pub fn new(stale_after_ms: u64) -> Self {
        Self {
            latest: None,
            stale_after_ms,
            allowed_origins: Vec::new(),
        }
    }

    /// Only accept messages posted from `origin`. With no origins
    /// registered, any sender is accepted.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    pub fn accepts(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == origin)
    }

    pub fn receive(&mut self, message: HostMessage, now: u64) {
        self.latest = Some((now, message));
    }

    /// Store `message` if `origin` is allowed. Returns whether it was kept.
    pub fn receive_from(&mut self, origin: &str, message: HostMessage, now: u64) -> bool {
        if !self.accepts(origin) {
            return false;
        }
        self.receive(message, now);
        true
    }

    /// The latest message, if it is still fresh at `now`.
    pub fn current(&self, now: u64) -> Option<&HostMessage> {
        let (received_at, message) = self.latest.as_ref()?;
        if now.saturating_sub(*received_at) > self.stale_after_ms {
            return None;
        }
        Some(message)
    }

    /// Forget everything, e.g. after the host page navigated.
    pub fn reset(&mut self) {
        self.latest = None;
    }
}
