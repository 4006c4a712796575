//! Virtual-time platform for driving the scheduler in tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use framewatch_core::{
    Channel, DiscoveryScheduler, DiscoveryState, EngineConfig, HostMessage, Platform, Trigger,
};
use framewatch_detect::testing::{FakeElement, FakePage};
use framewatch_detect::PlayerLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Interval(Trigger),
    Observer,
    Subscription,
}

#[derive(Debug)]
struct Active {
    kind: Kind,
    period_ms: u64,
    next_due: u64,
}

/// Every resource the scheduler acquired, and which are still held.
#[derive(Debug, Default)]
pub struct ResourceLog {
    next_id: u64,
    active: BTreeMap<u64, Active>,
    started: Vec<(u64, Kind)>,
    released: Vec<u64>,
}

impl ResourceLog {
    fn acquire(&mut self, kind: Kind, period_ms: u64, now: u64) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.active.insert(
            id,
            Active {
                kind,
                period_ms,
                next_due: now + period_ms,
            },
        );
        self.started.push((id, kind));
        id
    }

    fn release(&mut self, id: u64) {
        assert!(
            self.active.remove(&id).is_some(),
            "resource {id} released twice"
        );
        self.released.push(id);
    }

    pub fn active_count(&self, kind: Kind) -> usize {
        self.active.values().filter(|a| a.kind == kind).count()
    }

    pub fn started_count(&self, kind: Kind) -> usize {
        self.started.iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn is_active(&self, id: u64) -> bool {
        self.active.contains_key(&id)
    }

    /// Ids of resources of `kind` ever started, oldest first.
    pub fn started_ids(&self, kind: Kind) -> Vec<u64> {
        self.started
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Earliest interval due at or before `until`.
    fn next_due(&self, until: u64) -> Option<(u64, u64, Trigger)> {
        self.active
            .iter()
            .filter_map(|(id, a)| match a.kind {
                Kind::Interval(trigger) if a.next_due <= until => Some((a.next_due, *id, trigger)),
                _ => None,
            })
            .min_by_key(|(due, id, _)| (*due, *id))
    }

    fn reschedule(&mut self, id: u64) {
        if let Some(a) = self.active.get_mut(&id) {
            a.next_due += a.period_ms;
        }
    }
}

/// Released on drop, like the browser handles.
pub struct Handle {
    id: u64,
    log: Rc<RefCell<ResourceLog>>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.log.borrow_mut().release(self.id);
    }
}

#[derive(Clone)]
pub struct FakePlatform {
    page: FakePage,
    clock: Rc<Cell<u64>>,
    log: Rc<RefCell<ResourceLog>>,
}

impl FakePlatform {
    fn acquire(&self, kind: Kind, period_ms: u64) -> Handle {
        let id = self
            .log
            .borrow_mut()
            .acquire(kind, period_ms, self.clock.get());
        Handle {
            id,
            log: self.log.clone(),
        }
    }
}

impl Platform for FakePlatform {
    type Page = FakePage;
    type Interval = Handle;
    type Observer = Handle;
    type Subscription = Handle;

    fn page(&self) -> &FakePage {
        &self.page
    }

    fn now_ms(&self) -> u64 {
        self.clock.get()
    }

    fn start_interval(&self, period_ms: u64, trigger: Trigger) -> Handle {
        self.acquire(Kind::Interval(trigger), period_ms)
    }

    fn observe_mutations(&self) -> Option<Handle> {
        Some(self.acquire(Kind::Observer, 0))
    }

    fn subscribe_position(&self, _element: &FakeElement) -> Handle {
        self.acquire(Kind::Subscription, 0)
    }
}

#[derive(Clone, Default)]
pub struct RecordingChannel {
    pub sent: Rc<RefCell<Vec<HostMessage>>>,
}

impl Channel for RecordingChannel {
    fn send(&self, message: &HostMessage) {
        self.sent.borrow_mut().push(*message);
    }
}

pub struct Harness {
    pub scheduler: DiscoveryScheduler<FakePlatform, RecordingChannel>,
    pub page: FakePage,
    clock: Rc<Cell<u64>>,
    log: Rc<RefCell<ResourceLog>>,
    sent: Rc<RefCell<Vec<HostMessage>>>,
}

impl Harness {
    pub fn new(page: FakePage) -> Self {
        Self::with_config(page, EngineConfig::default())
    }

    pub fn with_config(page: FakePage, config: EngineConfig) -> Self {
        let clock = Rc::new(Cell::new(0));
        let log = Rc::new(RefCell::new(ResourceLog::default()));
        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();
        let platform = FakePlatform {
            page: page.clone(),
            clock: clock.clone(),
            log: log.clone(),
        };
        let scheduler =
            DiscoveryScheduler::new(platform, channel, PlayerLocator::embedded(), config);
        Self {
            scheduler,
            page,
            clock,
            log,
            sent,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    pub fn state(&self) -> DiscoveryState {
        self.scheduler.state()
    }

    pub fn log(&self) -> std::cell::Ref<'_, ResourceLog> {
        self.log.borrow()
    }

    pub fn sent(&self) -> Vec<HostMessage> {
        self.sent.borrow().clone()
    }

    /// Fire every interval due up to `until`, in time order, then park the
    /// clock at `until`.
    pub fn run_until(&mut self, until: u64) {
        loop {
            let next = self.log.borrow().next_due(until);
            let Some((due, id, trigger)) = next else {
                break;
            };
            self.clock.set(due);
            self.log.borrow_mut().reschedule(id);
            self.scheduler.handle(trigger);
        }
        self.clock.set(until);
    }

    /// Set the wall clock backwards without firing anything.
    pub fn rewind(&mut self, to: u64) {
        assert!(to <= self.clock.get());
        self.clock.set(to);
    }

    /// Mutate the page; the observer callback runs only if one is connected.
    pub fn mutate(&mut self, change: impl FnOnce(&FakePage)) {
        change(&self.page);
        if self.log.borrow().active_count(Kind::Observer) > 0 {
            self.scheduler.handle(Trigger::Mutation);
        }
    }

    /// Fire the element's position event if anyone listens.
    pub fn time_update(&mut self) {
        if self.log.borrow().active_count(Kind::Subscription) > 0 {
            self.scheduler.handle(Trigger::PositionChanged);
        }
    }

    pub fn request_update(&mut self) {
        self.scheduler.handle(Trigger::UpdateRequested);
    }
}

pub fn playing(duration: f64, current_time: f64) -> HostMessage {
    HostMessage {
        exists: true,
        duration: Some(duration),
        current_time: Some(current_time),
        paused: Some(false),
    }
}
