//! In-memory page fakes.
//!
//! Handles share state through `Rc`, so a test can keep a clone and mutate the
//! "DOM" while the engine holds another. Equality is pointer identity, like
//! strict equality on real DOM nodes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::page::{MediaElement, PageProbe, PlayerSdk};
use crate::ReadError;

#[derive(Debug)]
struct ElementState {
    duration: f64,
    current_time: f64,
    paused: bool,
    ready_state: u16,
}

/// A fake `<video>` element.
#[derive(Debug, Clone)]
pub struct FakeElement(Rc<RefCell<ElementState>>);

impl FakeElement {
    /// An element with metadata loaded (`readyState` 4).
    pub fn new(duration: f64, current_time: f64, paused: bool) -> Self {
        Self(Rc::new(RefCell::new(ElementState {
            duration,
            current_time,
            paused,
            ready_state: 4,
        })))
    }

    pub fn set_duration(&self, duration: f64) {
        self.0.borrow_mut().duration = duration;
    }

    pub fn set_current_time(&self, current_time: f64) {
        self.0.borrow_mut().current_time = current_time;
    }

    pub fn set_paused(&self, paused: bool) {
        self.0.borrow_mut().paused = paused;
    }

    pub fn set_ready_state(&self, ready_state: u16) {
        self.0.borrow_mut().ready_state = ready_state;
    }
}

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl MediaElement for FakeElement {
    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().current_time
    }

    fn paused(&self) -> bool {
        self.0.borrow().paused
    }

    fn ready_state(&self) -> u16 {
        self.0.borrow().ready_state
    }
}

#[derive(Debug)]
struct PlayerState {
    duration: f64,
    position: f64,
    state: String,
    failing: bool,
}

/// A fake JW Player-style SDK object.
#[derive(Debug, Clone)]
pub struct FakePlayer(Rc<RefCell<PlayerState>>);

impl FakePlayer {
    pub fn new(duration: f64, position: f64, state: &str) -> Self {
        Self(Rc::new(RefCell::new(PlayerState {
            duration,
            position,
            state: state.to_string(),
            failing: false,
        })))
    }

    pub fn set_position(&self, position: f64) {
        self.0.borrow_mut().position = position;
    }

    pub fn set_state(&self, state: &str) {
        self.0.borrow_mut().state = state.to_string();
    }

    /// Make every method call throw.
    pub fn set_failing(&self, failing: bool) {
        self.0.borrow_mut().failing = failing;
    }

    fn call<T>(
        &self,
        method: &'static str,
        f: impl FnOnce(&PlayerState) -> T,
    ) -> Result<T, ReadError> {
        let state = self.0.borrow();
        if state.failing {
            return Err(ReadError::Threw(method));
        }
        Ok(f(&state))
    }
}

impl PartialEq for FakePlayer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PlayerSdk for FakePlayer {
    fn duration(&self) -> Result<f64, ReadError> {
        self.call("getDuration", |s| s.duration)
    }

    fn position(&self) -> Result<f64, ReadError> {
        self.call("getPosition", |s| s.position)
    }

    fn state(&self) -> Result<String, ReadError> {
        self.call("getState", |s| s.state.clone())
    }
}

#[derive(Debug, Default)]
struct PageState {
    hostname: RefCell<String>,
    media: RefCell<HashMap<String, FakeElement>>,
    globals: RefCell<HashMap<String, FakePlayer>>,
    queries: Cell<usize>,
}

/// A fake frame document keyed by exact selector strings.
#[derive(Debug, Clone, Default)]
pub struct FakePage(Rc<PageState>);

impl FakePage {
    pub fn new(hostname: &str) -> Self {
        let page = Self::default();
        page.0.hostname.replace(hostname.to_string());
        page
    }

    /// Make `selector` resolve to `element`.
    pub fn insert(&self, selector: &str, element: FakeElement) {
        self.0.media.borrow_mut().insert(selector.to_string(), element);
    }

    pub fn remove(&self, selector: &str) {
        self.0.media.borrow_mut().remove(selector);
    }

    pub fn set_global(&self, entry_point: &str, player: FakePlayer) {
        self.0.globals.borrow_mut().insert(entry_point.to_string(), player);
    }

    /// Total number of DOM queries and global probes made so far.
    pub fn query_count(&self) -> usize {
        self.0.queries.get()
    }

    fn count(&self) {
        self.0.queries.set(self.0.queries.get() + 1);
    }
}

impl PageProbe for FakePage {
    type Element = FakeElement;
    type Player = FakePlayer;

    fn hostname(&self) -> String {
        self.0.hostname.borrow().clone()
    }

    fn query_media(&self, selector: &str) -> Option<FakeElement> {
        self.count();
        self.0.media.borrow().get(selector).cloned()
    }

    fn global_player(&self, entry_point: &str) -> Option<FakePlayer> {
        self.count();
        self.0.globals.borrow().get(entry_point).cloned()
    }
}
