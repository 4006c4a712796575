use tracing::trace;

use crate::page::{MediaElement, PageProbe, PlayerSdk, HAVE_METADATA};

/// Player state string that maps to "not paused". Anything else is paused.
const SDK_PLAYING_STATE: &str = "playing";

/// Whether a reported duration belongs to a usable player.
///
/// Half-initialized players report `NaN`, `0` or `Infinity` before metadata
/// has loaded.
pub fn is_valid_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

fn is_valid_position(position: f64) -> bool {
    position.is_finite() && position >= 0.0
}

/// One successful read of a player, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub duration: f64,
    pub position: f64,
    pub paused: bool,
}

/// Which adapter backs a [`PlaybackSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Push-capable: the element notifies on every position change.
    Native,
    /// Poll-only.
    Sdk,
}

/// A DOM media element.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeElementSource<E> {
    element: E,
}

impl<E: MediaElement> NativeElementSource<E> {
    pub fn new(element: E) -> Self {
        Self { element }
    }

    /// The underlying element, for subscribing to its position events.
    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn read(&self) -> Option<Reading> {
        if self.element.ready_state() < HAVE_METADATA {
            trace!("Media element has no metadata yet");
            return None;
        }
        let duration = self.element.duration();
        let position = self.element.current_time();
        if !is_valid_duration(duration) || !is_valid_position(position) {
            trace!(duration, position, "Media element reported malformed timing");
            return None;
        }
        Some(Reading {
            duration,
            position,
            paused: self.element.paused(),
        })
    }
}

/// A third-party player object exposing `getDuration`/`getPosition`/`getState`.
#[derive(Debug, Clone, PartialEq)]
pub struct SdkObjectSource<P> {
    player: P,
}

impl<P: PlayerSdk> SdkObjectSource<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }

    pub fn read(&self) -> Option<Reading> {
        let read = || -> Result<Reading, crate::ReadError> {
            let duration = self.player.duration()?;
            let position = self.player.position()?;
            let state = self.player.state()?;
            Ok(Reading {
                duration,
                position,
                paused: state != SDK_PLAYING_STATE,
            })
        };
        match read() {
            Ok(r) if is_valid_duration(r.duration) && is_valid_position(r.position) => Some(r),
            Ok(r) => {
                trace!(
                    duration = r.duration,
                    position = r.position,
                    "SDK player reported malformed timing"
                );
                None
            }
            Err(e) => {
                trace!("SDK player read failed: {e}");
                None
            }
        }
    }
}

/// A located player, wrapped behind one uniform read contract.
///
/// New SDKs get a new variant here and a new strategy in the locator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSource<E, P> {
    Native(NativeElementSource<E>),
    Sdk(SdkObjectSource<P>),
}

/// The source type a given page produces.
pub type SourceFor<Page> =
    PlaybackSource<<Page as PageProbe>::Element, <Page as PageProbe>::Player>;

impl<E: MediaElement + PartialEq, P: PlayerSdk + PartialEq> PlaybackSource<E, P> {
    pub fn native(element: E) -> Self {
        Self::Native(NativeElementSource::new(element))
    }

    pub fn sdk(player: P) -> Self {
        Self::Sdk(SdkObjectSource::new(player))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Native(_) => SourceKind::Native,
            Self::Sdk(_) => SourceKind::Sdk,
        }
    }

    /// Read the player. `None` means "no new data this tick"; reads never fail
    /// loudly.
    pub fn read(&self) -> Option<Reading> {
        match self {
            Self::Native(s) => s.read(),
            Self::Sdk(s) => s.read(),
        }
    }

    /// Validity predicate applied to every discovery candidate.
    pub fn is_valid(&self) -> bool {
        let duration = match self {
            Self::Native(s) => Some(s.element.duration()),
            Self::Sdk(s) => s.player.duration().ok(),
        };
        duration.is_some_and(is_valid_duration)
    }

    /// Whether both wrap the same underlying player object.
    pub fn same_source(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => a.element == b.element,
            (Self::Sdk(a), Self::Sdk(b)) => a.player == b.player,
            _ => false,
        }
    }
}
