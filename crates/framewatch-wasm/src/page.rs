use framewatch_detect::{MediaElement, PageProbe, PlayerSdk, ReadError};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlMediaElement, Window};

/// A `<video>`/`<audio>` element. Equality is JS strict equality.
#[derive(Debug, Clone, PartialEq)]
pub struct DomMedia(HtmlMediaElement);

impl DomMedia {
    pub fn element(&self) -> &HtmlMediaElement {
        &self.0
    }
}

impl MediaElement for DomMedia {
    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn paused(&self) -> bool {
        self.0.paused()
    }

    fn ready_state(&self) -> u16 {
        self.0.ready_state()
    }
}

/// A player object returned by an SDK entry point such as `jwplayer()`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsPlayer(Object);

impl JsPlayer {
    fn call(&self, method: &'static str) -> Result<JsValue, ReadError> {
        let value = Reflect::get(&self.0, &JsValue::from_str(method))
            .map_err(|_| ReadError::Threw(method))?;
        let function: Function = value.dyn_into().map_err(|_| ReadError::Missing(method))?;
        function.call0(&self.0).map_err(|_| ReadError::Threw(method))
    }
}

impl PlayerSdk for JsPlayer {
    fn duration(&self) -> Result<f64, ReadError> {
        self.call("getDuration")?
            .as_f64()
            .ok_or(ReadError::Malformed("getDuration"))
    }

    fn position(&self) -> Result<f64, ReadError> {
        self.call("getPosition")?
            .as_f64()
            .ok_or(ReadError::Malformed("getPosition"))
    }

    fn state(&self) -> Result<String, ReadError> {
        self.call("getState")?
            .as_string()
            .ok_or(ReadError::Malformed("getState"))
    }
}

/// The frame document, read-only.
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl PageProbe for DomPage {
    type Element = DomMedia;
    type Player = JsPlayer;

    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn query_media(&self, selector: &str) -> Option<DomMedia> {
        let element = self.document.query_selector(selector).ok()??;
        element.dyn_into::<HtmlMediaElement>().ok().map(DomMedia)
    }

    fn global_player(&self, entry_point: &str) -> Option<JsPlayer> {
        let entry = Reflect::get(&self.window, &JsValue::from_str(entry_point)).ok()?;
        let entry: Function = entry.dyn_into().ok()?;
        let player = entry.call0(&JsValue::UNDEFINED).ok()?;
        player.dyn_into::<Object>().ok().map(JsPlayer)
    }
}
