//! Browser timers, observers and listeners as self-releasing handles.

use std::cell::RefCell;
use std::rc::Weak;

use framewatch_core::{DiscoveryScheduler, Platform, Trigger};
use tracing::{debug, trace};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MutationObserver, MutationObserverInit, Window};

use crate::channel::PostMessageChannel;
use crate::page::{DomMedia, DomPage};

pub type Engine = DiscoveryScheduler<BrowserPlatform, PostMessageChannel>;
pub type WeakEngine = Weak<RefCell<Engine>>;

/// Route a browser callback into the engine.
///
/// Callbacks never re-enter: if the engine is mid-update the trigger is
/// dropped, and the next one re-checks from scratch anyway.
pub fn dispatch(engine: &WeakEngine, trigger: Trigger) {
    let Some(engine) = engine.upgrade() else {
        return;
    };
    let Ok(mut engine) = engine.try_borrow_mut() else {
        trace!(?trigger, "Engine busy; dropping trigger");
        return;
    };
    engine.handle(trigger);
}

/// `setInterval`; cleared on drop.
pub struct Interval {
    window: Window,
    id: Option<i32>,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.window.clear_interval_with_handle(id);
        }
    }
}

/// `MutationObserver` on the document subtree; disconnected on drop.
pub struct Observer {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// `addEventListener`; removed on drop.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(
        target: EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Self {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        if let Err(e) =
            target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        {
            debug!(event, error = ?e, "Failed to add event listener");
        }
        Self {
            target,
            event,
            callback,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

pub struct BrowserPlatform {
    page: DomPage,
    window: Window,
    engine: WeakEngine,
}

impl BrowserPlatform {
    pub fn new(page: DomPage, window: Window, engine: WeakEngine) -> Self {
        Self {
            page,
            window,
            engine,
        }
    }

    fn callback(&self, trigger: Trigger) -> Closure<dyn FnMut()> {
        let engine = self.engine.clone();
        Closure::<dyn FnMut()>::new(move || dispatch(&engine, trigger))
    }
}

impl Platform for BrowserPlatform {
    type Page = DomPage;
    type Interval = Interval;
    type Observer = Observer;
    type Subscription = Listener;

    fn page(&self) -> &DomPage {
        &self.page
    }

    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn start_interval(&self, period_ms: u64, trigger: Trigger) -> Interval {
        let callback = self.callback(trigger);
        let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
        let id = match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                timeout,
            ) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(?trigger, error = ?e, "Failed to start interval");
                None
            }
        };
        Interval {
            window: self.window.clone(),
            id,
            _callback: callback,
        }
    }

    fn observe_mutations(&self) -> Option<Observer> {
        let document = self.page.document();
        let target: web_sys::Node = match document.body() {
            Some(body) => body.into(),
            None => document.document_element()?.into(),
        };
        let callback = self.callback(Trigger::Mutation);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).ok()?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(e) = observer.observe_with_options(&target, &init) {
            debug!(error = ?e, "Failed to observe document");
            return None;
        }
        Some(Observer {
            observer,
            _callback: callback,
        })
    }

    fn subscribe_position(&self, element: &DomMedia) -> Listener {
        let engine = self.engine.clone();
        Listener::new(element.element().clone().into(), "timeupdate", move |_| {
            dispatch(&engine, Trigger::PositionChanged)
        })
    }
}
