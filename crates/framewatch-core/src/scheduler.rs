//! Discovery state machine.
//!
//! ```text
//!   Idle ──update/load──▶ Probing ──source found──▶ Tracking
//!    ▲                     │  ▲                        │
//!    └─ budget exhausted ──┘  └── player swapped/gone ─┤
//!    └──────────────── repeated read failures ─────────┘
//! ```
//!
//! All triggers funnel into [`DiscoveryScheduler::handle`]. Each one re-checks
//! the current phase, so triggers that were already queued when a transition
//! happened are harmless.

use framewatch_detect::{PlaybackSource, PlayerLocator, SourceFor};
use tracing::{debug, info, trace};

use crate::channel::{Channel, HostMessage};
use crate::config::EngineConfig;
use crate::gate::ChangeGate;
use crate::platform::{Platform, Trigger};
use crate::snapshot::VideoSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    Probing,
    Tracking,
}

impl DiscoveryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::Tracking => "tracking",
        }
    }
}

type Source<P> = SourceFor<<P as Platform>::Page>;

/// Discovery machinery. Dropping it cancels the retry timer and disconnects
/// the observer.
struct Probe<P: Platform> {
    retry: Option<P::Interval>,
    observer: Option<P::Observer>,
    attempts: u32,
}

/// The attached source and everything scoped to it.
struct Tracked<P: Platform> {
    source: Source<P>,
    gate: ChangeGate,
    last_sent: Option<VideoSnapshot>,
    last_observed_at: u64,
    failures: u32,
    last_revalidation: u64,
    _push: Option<P::Subscription>,
    _poll: Option<P::Interval>,
}

enum Phase<P: Platform> {
    Idle,
    Probing(Probe<P>),
    Tracking(Tracked<P>),
}

/// Owns the attached source and the last propagated snapshot; nothing else
/// touches them.
pub struct DiscoveryScheduler<P: Platform, C: Channel> {
    platform: P,
    channel: C,
    locator: PlayerLocator,
    config: EngineConfig,
    phase: Phase<P>,
    stopped: bool,
}

impl<P: Platform, C: Channel> DiscoveryScheduler<P, C> {
    pub fn new(platform: P, channel: C, locator: PlayerLocator, config: EngineConfig) -> Self {
        Self {
            platform,
            channel,
            locator,
            config,
            phase: Phase::Idle,
            stopped: false,
        }
    }

    pub fn state(&self) -> DiscoveryState {
        match self.phase {
            Phase::Idle => DiscoveryState::Idle,
            Phase::Probing(_) => DiscoveryState::Probing,
            Phase::Tracking(_) => DiscoveryState::Tracking,
        }
    }

    /// The source being tracked, if any.
    pub fn attached(&self) -> Option<&Source<P>> {
        match &self.phase {
            Phase::Tracking(tracked) => Some(&tracked.source),
            _ => None,
        }
    }

    /// The last snapshot sent to the host for the attached source.
    pub fn last_propagated(&self) -> Option<&VideoSnapshot> {
        match &self.phase {
            Phase::Tracking(tracked) => tracked.last_sent.as_ref(),
            _ => None,
        }
    }

    pub fn locator(&self) -> &PlayerLocator {
        &self.locator
    }

    /// Page load: look for a player right away, then keep probing. Also
    /// resumes a stopped scheduler.
    pub fn start(&mut self) {
        self.stopped = false;
        if let Phase::Idle = self.phase {
            self.begin_probing();
        }
    }

    /// Release every timer, observer and listener without notifying the host.
    /// Triggers are ignored until the next [`start`](Self::start).
    pub fn stop(&mut self) {
        self.stopped = true;
        self.phase = Phase::Idle;
        debug!("Scheduler stopped");
    }

    pub fn handle(&mut self, trigger: Trigger) {
        if self.stopped {
            trace!(?trigger, "Stopped; ignoring trigger");
            return;
        }
        match (trigger, self.state()) {
            (Trigger::UpdateRequested, DiscoveryState::Idle) => self.begin_probing(),
            (Trigger::UpdateRequested | Trigger::Mutation, DiscoveryState::Probing) => {
                self.attempt();
            }
            (Trigger::UpdateRequested, DiscoveryState::Tracking) => self.revalidate(),
            (Trigger::RetryTick, DiscoveryState::Probing) => self.retry(),
            (Trigger::PollTick | Trigger::PositionChanged, DiscoveryState::Tracking) => {
                self.tick();
            }
            (trigger, state) => trace!(?trigger, ?state, "Ignoring stale trigger"),
        }
    }

    /// Locate once; attach on success.
    fn attempt(&mut self) -> bool {
        match self.locator.locate(self.platform.page()) {
            Some(source) => {
                self.attach(source);
                true
            }
            None => false,
        }
    }

    fn begin_probing(&mut self) {
        if !self.attempt() {
            self.enter_probing();
        }
    }

    fn enter_probing(&mut self) {
        let discovery = &self.config.discovery;
        let retry = (discovery.max_retries > 0).then(|| {
            self.platform
                .start_interval(discovery.retry_interval_ms, Trigger::RetryTick)
        });
        let observer = if discovery.observe_mutations {
            self.platform.observe_mutations()
        } else {
            None
        };
        if retry.is_none() && observer.is_none() {
            self.go_idle("no discovery triggers available");
            return;
        }
        info!(
            max_retries = discovery.max_retries,
            observing = observer.is_some(),
            "Probing for a player"
        );
        self.phase = Phase::Probing(Probe {
            retry,
            observer,
            attempts: 0,
        });
    }

    fn retry(&mut self) {
        if self.attempt() {
            return;
        }
        let max_retries = self.config.discovery.max_retries;
        let Phase::Probing(probe) = &mut self.phase else {
            return;
        };
        probe.attempts += 1;
        if probe.attempts < max_retries {
            trace!(attempt = probe.attempts, "No player yet");
            return;
        }
        probe.retry = None;
        if probe.observer.is_some() {
            debug!("Retry budget exhausted; waiting for DOM changes");
        } else {
            self.go_idle("retry budget exhausted");
        }
    }

    fn attach(&mut self, source: Source<P>) {
        // Probing machinery goes first.
        self.phase = Phase::Idle;

        let (push, poll) = match &source {
            PlaybackSource::Native(native) => {
                (Some(self.platform.subscribe_position(native.element())), None)
            }
            PlaybackSource::Sdk(_) => {
                let period = self.config.tracking.sdk_poll_interval_ms;
                (None, Some(self.platform.start_interval(period, Trigger::PollTick)))
            }
        };
        let kind = source.kind();
        info!(?kind, "Tracking playback source");

        self.phase = Phase::Tracking(Tracked {
            source,
            gate: self.config.gate.for_kind(kind),
            last_sent: None,
            last_observed_at: 0,
            failures: 0,
            last_revalidation: self.platform.now_ms(),
            _push: push,
            _poll: poll,
        });
        self.tick();
    }

    /// Read the attached source and propagate what passes the gate.
    fn tick(&mut self) {
        let now = self.platform.now_ms();
        let max_failures = self.config.tracking.max_read_failures;
        let Phase::Tracking(tracked) = &mut self.phase else {
            return;
        };

        let Some(reading) = tracked.source.read() else {
            tracked.failures += 1;
            trace!(failures = tracked.failures, "No reading this tick");
            if tracked.failures >= max_failures {
                self.go_idle("player stopped reporting");
            }
            return;
        };
        tracked.failures = 0;

        // Timestamps never go backwards for one source.
        let observed_at = now.max(tracked.last_observed_at);
        tracked.last_observed_at = observed_at;
        let snapshot = VideoSnapshot::from_reading(reading, observed_at);

        if tracked.gate.should_propagate(tracked.last_sent.as_ref(), &snapshot) {
            self.channel.send(&HostMessage::from(&snapshot));
            tracked.last_sent = Some(snapshot);
        } else {
            trace!("Snapshot suppressed by gate");
        }
    }

    /// Guard against single-page navigation swapping the player.
    fn revalidate(&mut self) {
        let now = self.platform.now_ms();
        let interval = self.config.discovery.revalidate_interval_ms;
        let Phase::Tracking(tracked) = &mut self.phase else {
            return;
        };
        if now.saturating_sub(tracked.last_revalidation) < interval {
            return;
        }
        tracked.last_revalidation = now;

        match self.locator.locate(self.platform.page()) {
            Some(found) if found.same_source(&tracked.source) => {
                trace!("Attached player unchanged");
            }
            Some(found) => {
                info!("Player was swapped; re-attaching");
                self.attach(found);
            }
            None => {
                info!("Attached player is gone; probing again");
                self.phase = Phase::Idle;
                self.enter_probing();
            }
        }
    }

    fn go_idle(&mut self, reason: &str) {
        self.phase = Phase::Idle;
        info!(reason, "No player; going idle");
        if self.config.channel.clear_on_idle {
            let gone = VideoSnapshot::empty(self.platform.now_ms());
            self.channel.send(&HostMessage::from(&gone));
        }
    }
}
