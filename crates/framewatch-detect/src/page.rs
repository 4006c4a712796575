//! Read-only view of the page the engine runs in.
//!
//! The browser binding implements these over `web-sys` handles; tests use the
//! in-memory fakes from [`crate::testing`]. Handle equality is object identity,
//! which is what re-validation compares.

use crate::ReadError;

/// `readyState` value once duration and dimensions are known.
pub const HAVE_METADATA: u16 = 1;

/// Property reads on a native media element.
pub trait MediaElement {
    fn duration(&self) -> f64;
    fn current_time(&self) -> f64;
    fn paused(&self) -> bool;
    fn ready_state(&self) -> u16;
}

/// Method calls on an opaque third-party player object.
pub trait PlayerSdk {
    fn duration(&self) -> Result<f64, ReadError>;
    fn position(&self) -> Result<f64, ReadError>;
    fn state(&self) -> Result<String, ReadError>;
}

/// Everything discovery is allowed to look at.
pub trait PageProbe {
    type Element: MediaElement + PartialEq + Clone;
    type Player: PlayerSdk + PartialEq + Clone;

    /// Hostname of the frame document (e.g. `"hydrax.net"`).
    fn hostname(&self) -> String;

    /// First media element matching a CSS selector, if any.
    fn query_media(&self, selector: &str) -> Option<Self::Element>;

    /// Resolve a player object through a global SDK entry point such as
    /// `jwplayer`. Returns `None` if the global is absent or not callable.
    fn global_player(&self, entry_point: &str) -> Option<Self::Player>;
}
