//! WebAssembly bindings for NoPageSpeed
//!
//! The extension's JS glue owns every asynchronous browser call. It hydrates
//! a `Background` from `storage.local`, awaits any tab queries, calls one of
//! the handlers below, then applies the returned effects: `storage` writes
//! to `storage.local`, `ui` commands to `browserAction`, and `messages` to
//! `runtime.sendMessage`.

mod console;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use nps_core::{
    Background as CoreBackground, Header, MemoryStorage, Message, Mode, StorageChange, Tab,
    UiCommand,
};

/// Everything the glue has to do after a handler ran.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Effects<T: Serialize> {
    result: T,
    ui: Vec<UiCommand>,
    storage: Vec<StorageChange>,
    messages: Vec<Message>,
}

/// `webRequest.BlockingResponse` for `onBeforeSendHeaders`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockingResponse {
    request_headers: Vec<Header>,
}

fn from_js<T: DeserializeOwned>(value: &JsValue, what: &str) -> Result<T, JsValue> {
    let text = if value.is_undefined() || value.is_null() {
        "null".to_string()
    } else {
        js_sys::JSON::stringify(value)
            .map(String::from)
            .map_err(|_| JsValue::from_str(&format!("{what} is not serializable")))?
    };
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&format!("Invalid {what}: {e}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {e}")))?;
    js_sys::JSON::parse(&text)
}

fn tabs_from_js(tabs: &JsValue) -> Result<Vec<Tab>, JsValue> {
    Ok(from_js::<Option<Vec<Tab>>>(tabs, "tab list")?.unwrap_or_default())
}

#[wasm_bindgen]
pub struct Background {
    inner: CoreBackground<MemoryStorage>,
}

impl Background {
    fn effects<T: Serialize>(
        &mut self,
        result: T,
        ui: Vec<UiCommand>,
        messages: Vec<Message>,
    ) -> Result<JsValue, JsValue> {
        let storage = self.inner.store_mut().backend_mut().drain_changes();
        to_js(&Effects {
            result,
            ui,
            storage,
            messages,
        })
    }
}

#[wasm_bindgen]
impl Background {
    /// Build from the object `storage.local.get(null)` resolved to.
    #[wasm_bindgen(constructor)]
    pub fn new(stored: JsValue) -> Result<Background, JsValue> {
        let snapshot: serde_json::Value = from_js(&stored, "stored settings")?;
        Ok(Background {
            inner: CoreBackground::new(MemoryStorage::from_snapshot(snapshot)),
        })
    }

    /// Reload from a fresh `storage.local.get(null)` result, e.g. before
    /// handling a `{toggle}` message another view sent after writing.
    /// Unapplied writes from the previous store are dropped.
    pub fn hydrate(&mut self, stored: JsValue) -> Result<(), JsValue> {
        let snapshot: serde_json::Value = from_js(&stored, "stored settings")?;
        self.inner.replace_backend(MemoryStorage::from_snapshot(snapshot));
        Ok(())
    }

    /// Load (migrating if needed) and reflect every open tab.
    pub fn on_startup(&mut self, tabs: JsValue) -> Result<JsValue, JsValue> {
        let tabs = tabs_from_js(&tabs)?;
        let mut ui = Vec::new();
        let settings = self.inner.on_startup(&tabs, &mut ui);
        self.effects(settings.mode, ui, Vec::new())
    }

    /// `onBeforeSendHeaders` listener body. Returns a `BlockingResponse`.
    pub fn on_request(&mut self, url: &str, headers: JsValue) -> Result<JsValue, JsValue> {
        let headers: Vec<Header> =
            from_js::<Option<Vec<Header>>>(&headers, "request headers")?.unwrap_or_default();
        let request_headers = self.inner.on_request(url, headers);
        to_js(&BlockingResponse { request_headers })
    }

    /// Toolbar click on `tab`; `tabs` is every open tab.
    pub fn on_toggle(&mut self, tab: JsValue, tabs: JsValue) -> Result<JsValue, JsValue> {
        let tab: Tab = from_js(&tab, "tab")?;
        let tabs = tabs_from_js(&tabs)?;
        let mut ui = Vec::new();
        let mut messages = Vec::new();
        let disabled = self.inner.on_toggle(&tab, &tabs, &mut ui, &mut messages);
        self.effects(disabled, ui, messages)
    }

    /// Mode picked on the options page (`"global"` or `"persite"`).
    pub fn on_mode_change(&mut self, mode: &str, tabs: JsValue) -> Result<JsValue, JsValue> {
        let mode: Mode = mode
            .parse()
            .map_err(|e: nps_core::types::UnknownMode| JsValue::from_str(&e.to_string()))?;
        let tabs = tabs_from_js(&tabs)?;
        let mut ui = Vec::new();
        let mut messages = Vec::new();
        self.inner.on_mode_change(mode, &tabs, &mut ui, &mut messages);
        self.effects(mode, ui, messages)
    }

    /// Tab activated, updated, or its window focused.
    pub fn on_tab_focus(&mut self, tab: JsValue) -> Result<JsValue, JsValue> {
        let tab: Tab = from_js(&tab, "tab")?;
        let mut ui = Vec::new();
        self.inner.on_tab_focus(&tab, &mut ui);
        self.effects((), ui, Vec::new())
    }

    /// `runtime.onMessage` from another extension view.
    pub fn on_message(&mut self, message: JsValue, tabs: JsValue) -> Result<JsValue, JsValue> {
        let message: Message = from_js(&message, "message")?;
        let tabs = tabs_from_js(&tabs)?;
        let mut ui = Vec::new();
        self.inner.on_message(&message, &tabs, &mut ui);
        self.effects((), ui, Vec::new())
    }

    /// State for the options page.
    pub fn options_summary(&mut self) -> Result<JsValue, JsValue> {
        let summary = self.inner.options_summary();
        self.effects(summary, Vec::new(), Vec::new())
    }

    /// Storage writes not yet handed to the glue (e.g. first-run defaults
    /// written while answering a request).
    pub fn take_storage_changes(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.store_mut().backend_mut().drain_changes())
    }
}

/// Route `log` output to the browser console. `level` is a `log` level name
/// (`"info"`, `"debug"`, ...); unknown or missing means `info`.
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) {
    let filter = level
        .and_then(|l| l.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    console::init(filter);
}

#[wasm_bindgen]
pub fn extract_site_js(url: &str) -> Option<String> {
    nps_core::resolve_site(url).map(|site| site.to_string())
}
