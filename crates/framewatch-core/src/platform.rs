//! Callback-driven resources the scheduler acquires from its environment.
//!
//! Each acquired resource is a handle that releases itself on drop: dropping
//! an interval cancels it, dropping an observer disconnects it, dropping a
//! subscription removes the listener. The scheduler owns these handles inside
//! its state, so a state transition releases exactly what the old state held.

use framewatch_detect::PageProbe;

/// Why the scheduler is being woken up. Delivered back through
/// [`crate::DiscoveryScheduler::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The host asked for fresh data.
    UpdateRequested,
    /// Bounded-retry discovery timer fired.
    RetryTick,
    /// The observed document subtree changed.
    Mutation,
    /// Poll timer for poll-only sources fired.
    PollTick,
    /// A push-capable source reported a position change.
    PositionChanged,
}

pub trait Platform {
    type Page: PageProbe;
    /// Repeating timer; cancelled on drop.
    type Interval;
    /// Structural observer on the document subtree; disconnected on drop.
    type Observer;
    /// Position-change listener on a media element; removed on drop.
    type Subscription;

    fn page(&self) -> &Self::Page;

    /// Wall clock in milliseconds.
    fn now_ms(&self) -> u64;

    /// Deliver `trigger` every `period_ms` until the handle is dropped.
    fn start_interval(&self, period_ms: u64, trigger: Trigger) -> Self::Interval;

    /// Deliver [`Trigger::Mutation`] on subtree changes. `None` when the
    /// document has nothing to observe yet.
    fn observe_mutations(&self) -> Option<Self::Observer>;

    /// Deliver [`Trigger::PositionChanged`] whenever `element` reports a new
    /// playback position.
    fn subscribe_position(
        &self,
        element: &<Self::Page as PageProbe>::Element,
    ) -> Self::Subscription;
}
