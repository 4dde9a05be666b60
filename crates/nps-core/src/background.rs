//! Background event handlers
//!
//! Each browser event maps to one named operation. Every operation reloads
//! settings from the store, so no state is carried between events, and every
//! storage failure degrades to the "not disabled" default instead of
//! blocking traffic.

use crate::decision::{self, is_disabled_for};
use crate::header;
use crate::host::{Broadcast, Message, TabFilter, TabQuery};
use crate::options::{self, OptionsSummary};
use crate::settings::{SettingsStore, StoreError};
use crate::storage::StorageBackend;
use crate::types::{Header, Mode, PartialSettings, Settings, Tab};
use crate::ui::{self, ActionSurface};
use crate::url::resolve_site;

pub struct Background<S> {
    store: SettingsStore<S>,
}

impl<S: StorageBackend> Background<S> {
    pub fn new(backend: S) -> Self {
        Self {
            store: SettingsStore::new(backend),
        }
    }

    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SettingsStore<S> {
        &mut self.store
    }

    /// Swap in a freshly read backend, e.g. after another view wrote to it.
    pub fn replace_backend(&mut self, backend: S) {
        *self.store.backend_mut() = backend;
    }

    /// Current settings, or in-memory defaults when storage is unreadable.
    pub fn settings(&mut self) -> Settings {
        match self.store.load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("(settings) {e}; using defaults");
                Settings::default()
            }
        }
    }

    /// Load once at startup (migrating if needed) and reflect every tab.
    pub fn on_startup(&mut self, tabs: &impl TabQuery, surface: &mut impl ActionSurface) -> Settings {
        let settings = self.settings();
        log::info!(
            "(init) mode={} globalDisabled={}",
            settings.mode,
            settings.global_disabled
        );
        ui::refresh_all(&settings, &tabs.query(&TabFilter::all()), surface);
        settings
    }

    /// Final header list for an outgoing request.
    pub fn on_request(&mut self, url: &str, headers: Vec<Header>) -> Vec<Header> {
        let disabled = match self.store.load() {
            Ok(settings) => {
                let site = resolve_site(url);
                is_disabled_for(&settings, settings.mode, site.as_ref())
            }
            Err(e) => {
                log::warn!("(header) {e}; leaving request untouched");
                false
            }
        };
        header::apply(headers, disabled)
    }

    /// Toolbar click on `tab`. Returns the decision after the toggle.
    pub fn on_toggle(
        &mut self,
        tab: &Tab,
        tabs: &impl TabQuery,
        surface: &mut impl ActionSurface,
        bus: &mut impl Broadcast,
    ) -> bool {
        let mut settings = self.settings();
        let site = tab.url.as_deref().and_then(resolve_site);
        let outcome = decision::toggle(&settings, settings.mode, site.as_ref());

        let Some(delta) = outcome.delta else {
            return outcome.disabled;
        };
        self.persist(&delta);
        settings.apply(&delta);
        bus.broadcast(&Message::toggled());

        let open = tabs.query(&TabFilter::all());
        match (settings.mode, site) {
            (Mode::PerSite, Some(site)) => ui::refresh_site(&settings, &site, &open, surface),
            _ => ui::refresh_all(&settings, &open, surface),
        }
        outcome.disabled
    }

    /// Operating mode chosen on the options page.
    pub fn on_mode_change(
        &mut self,
        mode: Mode,
        tabs: &impl TabQuery,
        surface: &mut impl ActionSurface,
        bus: &mut impl Broadcast,
    ) {
        let mut settings = self.settings();
        log::info!("(mode) Changing mode to: {mode}");
        let delta = decision::set_mode(mode);
        self.persist(&delta);
        settings.apply(&delta);
        bus.broadcast(&Message::ModeChange(mode));
        ui::refresh_all(&settings, &tabs.query(&TabFilter::all()), surface);
    }

    /// Tab activated, navigated, or its window focused.
    pub fn on_tab_focus(&mut self, tab: &Tab, surface: &mut impl ActionSurface) {
        let settings = self.settings();
        ui::reflect_tab(&settings, tab, surface);
    }

    /// Another extension view changed persisted state.
    ///
    /// A mode change carries the new mode, which is folded in even when the
    /// local store has not seen the write yet. A toggle only says "reload",
    /// so the host should `replace_backend` first.
    pub fn on_message(
        &mut self,
        message: &Message,
        tabs: &impl TabQuery,
        surface: &mut impl ActionSurface,
    ) {
        log::debug!("(msg) received {message:?}");
        let mut settings = self.settings();
        if let Message::ModeChange(mode) = *message {
            settings.apply(&decision::set_mode(mode));
        }
        ui::refresh_all(&settings, &tabs.query(&TabFilter::all()), surface);
    }

    pub fn options_summary(&mut self) -> OptionsSummary {
        options::summarize(&self.settings())
    }

    /// Write a delta; failures leave it unpersisted until the next success.
    fn persist(&mut self, delta: &PartialSettings) {
        match self.store.save(delta) {
            Ok(()) => {}
            Err(e @ StoreError::UnknownSchemaVersion { .. }) => {
                log::warn!("(settings) not saving: {e}");
            }
            Err(e) => log::warn!("(settings) save failed: {e}"),
        }
    }
}
