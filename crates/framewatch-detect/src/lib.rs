pub mod hosts;
pub mod locator;
pub mod page;
pub mod source;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use hosts::{GenericRules, HostDatabase, HostRule, Strategy};
pub use locator::PlayerLocator;
pub use page::{MediaElement, PageProbe, PlayerSdk, HAVE_METADATA};
pub use source::{
    is_valid_duration, NativeElementSource, PlaybackSource, Reading, SdkObjectSource, SourceFor,
    SourceKind,
};

/// A player read that produced nothing usable this tick.
///
/// Never leaves the adapters: [`PlaybackSource::read`] turns it into `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("player method `{0}` is missing")]
    Missing(&'static str),
    #[error("player method `{0}` threw")]
    Threw(&'static str),
    #[error("player method `{0}` returned a malformed value")]
    Malformed(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("invalid host database: {0}")]
    Database(#[from] toml::de::Error),
}
