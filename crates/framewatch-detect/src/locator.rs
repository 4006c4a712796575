//! Player discovery.
//!
//! Discovery is an ordered chain of independent strategies. Each one either
//! yields a candidate that passes [`PlaybackSource::is_valid`] or nothing; the
//! first hit wins. A miss is not an error.

use tracing::{debug, trace};

use crate::hosts::{HostDatabase, Strategy};
use crate::page::PageProbe;
use crate::source::{PlaybackSource, SourceFor};

type StrategyFn<P> = fn(&PlayerLocator, &P) -> Option<SourceFor<P>>;

/// Finds the player controlling playback on the page.
#[derive(Debug, Clone)]
pub struct PlayerLocator {
    db: HostDatabase,
}

impl PlayerLocator {
    pub fn new(db: HostDatabase) -> Self {
        Self { db }
    }

    /// Locator over the embedded host database.
    pub fn embedded() -> Self {
        Self::new(HostDatabase::embedded())
    }

    pub fn database(&self) -> &HostDatabase {
        &self.db
    }

    /// Run every strategy in priority order, short-circuiting on the first
    /// valid source. Reads page state only.
    pub fn locate<P: PageProbe>(&self, page: &P) -> Option<SourceFor<P>> {
        let chain: [(&str, StrategyFn<P>); 4] = [
            ("host hook", host_hook::<P>),
            ("native element", native_element::<P>),
            ("fallback selectors", fallback_selectors::<P>),
            ("global sdk", global_sdk::<P>),
        ];
        chain.iter().find_map(|(name, strategy)| {
            let source = strategy(self, page)?;
            debug!(strategy = name, kind = ?source.kind(), "Located playback source");
            Some(source)
        })
    }
}

/// Special-cased discovery for hostnames in the host database.
pub fn host_hook<P: PageProbe>(locator: &PlayerLocator, page: &P) -> Option<SourceFor<P>> {
    let hostname = page.hostname();
    let rule = locator.db.match_host(&hostname)?;
    trace!(rule = %rule.name, host = %hostname, "Trying host hook");
    rule.strategies.iter().find_map(|step| match step {
        Strategy::Selector { selector } => query_valid(page, selector),
        Strategy::Native => native_element(locator, page),
        Strategy::Sdk => global_sdk(locator, page),
    })
}

/// The page's first plain media element.
pub fn native_element<P: PageProbe>(locator: &PlayerLocator, page: &P) -> Option<SourceFor<P>> {
    query_valid(page, &locator.db.generic().native_selector)
}

/// Media elements inside common third-party player wrappers.
pub fn fallback_selectors<P: PageProbe>(
    locator: &PlayerLocator,
    page: &P,
) -> Option<SourceFor<P>> {
    locator
        .db
        .generic()
        .fallback_selectors
        .iter()
        .find_map(|selector| query_valid(page, selector))
}

/// Player objects reachable through a global SDK entry point.
pub fn global_sdk<P: PageProbe>(locator: &PlayerLocator, page: &P) -> Option<SourceFor<P>> {
    locator
        .db
        .generic()
        .sdk_entry_points
        .iter()
        .find_map(|entry| accept::<P>(PlaybackSource::sdk(page.global_player(entry)?)))
}

fn query_valid<P: PageProbe>(page: &P, selector: &str) -> Option<SourceFor<P>> {
    accept::<P>(PlaybackSource::native(page.query_media(selector)?))
}

fn accept<P: PageProbe>(candidate: SourceFor<P>) -> Option<SourceFor<P>> {
    if candidate.is_valid() {
        Some(candidate)
    } else {
        trace!(kind = ?candidate.kind(), "Rejected half-initialized player");
        None
    }
}
