//! Toolbar icon and title reflection
//!
//! Maps the decision for each tab to toolbar parameters. Rendering is the
//! host's job; everything here is a pure function of the settings passed in,
//! so overlapping refreshes converge regardless of call order.

use serde::Serialize;

use crate::decision::is_disabled_for;
use crate::types::{Mode, Settings, Tab, TabId};
use crate::url::{resolve_site, SiteKey};

pub const TITLE_DISABLED: &str = "Tell servers NOT to use PageSpeed";
pub const TITLE_ALLOWED: &str = "Allow use of PageSpeed";

const ICON_SIZES: [u32; 2] = [16, 32];

// =============================================================================
// Icon State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconVariant {
    Plain,
    Slash,
}

/// Icon paths keyed by pixel size.
pub type IconPaths = Vec<(u32, String)>;

/// What the toolbar button shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconState {
    pub variant: IconVariant,
    pub title: &'static str,
}

impl IconState {
    pub fn paths(&self) -> IconPaths {
        let suffix = match self.variant {
            IconVariant::Plain => "",
            IconVariant::Slash => "-slash",
        };
        ICON_SIZES
            .iter()
            .map(|size| (*size, format!("icons/logo-{size}{suffix}.png")))
            .collect()
    }
}

pub fn icon_for(disabled: bool) -> IconState {
    if disabled {
        IconState {
            variant: IconVariant::Slash,
            title: TITLE_DISABLED,
        }
    } else {
        IconState {
            variant: IconVariant::Plain,
            title: TITLE_ALLOWED,
        }
    }
}

// =============================================================================
// Action Surface
// =============================================================================

/// Toolbar action capability. `tab == None` sets the default shown by every
/// tab without an override.
pub trait ActionSurface {
    fn set_icon(&mut self, tab: Option<TabId>, paths: &IconPaths);
    fn set_title(&mut self, tab: Option<TabId>, title: &str);
    /// Drop a tab's override so it shows the default again.
    fn clear_tab(&mut self, tab: TabId);
}

/// A toolbar call for the host to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum UiCommand {
    #[serde(rename_all = "camelCase")]
    SetIcon {
        tab_id: Option<TabId>,
        path: std::collections::BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    SetTitle { tab_id: Option<TabId>, title: String },
    #[serde(rename_all = "camelCase")]
    ClearTab { tab_id: TabId },
}

impl ActionSurface for Vec<UiCommand> {
    fn set_icon(&mut self, tab: Option<TabId>, paths: &IconPaths) {
        self.push(UiCommand::SetIcon {
            tab_id: tab,
            path: paths
                .iter()
                .map(|(size, path)| (size.to_string(), path.clone()))
                .collect(),
        });
    }

    fn set_title(&mut self, tab: Option<TabId>, title: &str) {
        self.push(UiCommand::SetTitle {
            tab_id: tab,
            title: title.to_string(),
        });
    }

    fn clear_tab(&mut self, tab: TabId) {
        self.push(UiCommand::ClearTab { tab_id: tab });
    }
}

// =============================================================================
// Refresh
// =============================================================================

fn show(surface: &mut impl ActionSurface, tab: Option<TabId>, state: IconState) {
    surface.set_icon(tab, &state.paths());
    surface.set_title(tab, state.title);
}

/// Reflect one tab under the stored mode.
pub fn reflect_tab(settings: &Settings, tab: &Tab, surface: &mut impl ActionSurface) {
    match settings.mode {
        Mode::Global => show(surface, None, icon_for(settings.global_disabled)),
        Mode::PerSite => {
            let site = tab.url.as_deref().and_then(resolve_site);
            let disabled = is_disabled_for(settings, Mode::PerSite, site.as_ref());
            show(surface, Some(tab.id), icon_for(disabled));
        }
    }
}

/// Reflect every tab under the stored mode.
///
/// Global mode clears per-tab overrides and sets one extension-wide icon;
/// per-site mode resets that default to the plain icon (for tabs opened
/// later) and sets an icon on each tab.
pub fn refresh_all(settings: &Settings, tabs: &[Tab], surface: &mut impl ActionSurface) {
    match settings.mode {
        Mode::Global => {
            for tab in tabs {
                surface.clear_tab(tab.id);
            }
            show(surface, None, icon_for(settings.global_disabled));
        }
        Mode::PerSite => {
            show(surface, None, icon_for(false));
            for tab in tabs {
                reflect_tab(settings, tab, surface);
            }
        }
    }
    log::debug!("(ui) refreshed {} tabs in {} mode", tabs.len(), settings.mode);
}

/// Reflect every tab showing `site` after its flag changed.
pub fn refresh_site(
    settings: &Settings,
    site: &SiteKey,
    tabs: &[Tab],
    surface: &mut impl ActionSurface,
) {
    let state = icon_for(is_disabled_for(settings, Mode::PerSite, Some(site)));
    for tab in tabs {
        let tab_site = tab.url.as_deref().and_then(resolve_site);
        if tab_site.as_ref() == Some(site) {
            show(surface, Some(tab.id), state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PartialSettings, SiteChange};

    fn tab(id: TabId, url: &str) -> Tab {
        Tab {
            id,
            url: Some(url.to_string()),
            active: false,
            window_id: 1,
        }
    }

    fn per_site_with(disabled: &[&str]) -> Settings {
        let mut settings = Settings::default();
        settings.apply(&PartialSettings {
            sites: disabled
                .iter()
                .map(|s| SiteChange { site: SiteKey::from_stored(s).unwrap(), disabled: true })
                .collect(),
            ..Default::default()
        });
        settings
    }

    fn titles(commands: &[UiCommand]) -> Vec<(Option<TabId>, String)> {
        commands
            .iter()
            .filter_map(|c| match c {
                UiCommand::SetTitle { tab_id, title } => Some((*tab_id, title.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_icon_for() {
        let off = icon_for(true);
        assert_eq!(off.variant, IconVariant::Slash);
        assert_eq!(off.title, TITLE_DISABLED);
        assert_eq!(
            off.paths(),
            vec![
                (16, "icons/logo-16-slash.png".to_string()),
                (32, "icons/logo-32-slash.png".to_string())
            ]
        );

        let on = icon_for(false);
        assert_eq!(on.variant, IconVariant::Plain);
        assert_eq!(on.title, TITLE_ALLOWED);
        assert_eq!(on.paths()[0].1, "icons/logo-16.png");
    }

    #[test]
    fn test_refresh_all_global() {
        let mut settings = Settings::default();
        settings.mode = Mode::Global;
        let tabs = vec![tab(1, "https://a.com/"), tab(2, "https://b.com/")];

        let mut commands: Vec<UiCommand> = Vec::new();
        refresh_all(&settings, &tabs, &mut commands);

        assert_eq!(commands[0], UiCommand::ClearTab { tab_id: 1 });
        assert_eq!(commands[1], UiCommand::ClearTab { tab_id: 2 });
        assert_eq!(titles(&commands), vec![(None, TITLE_DISABLED.to_string())]);
    }

    #[test]
    fn test_refresh_all_per_site() {
        let settings = per_site_with(&["a.com"]);
        let tabs = vec![tab(1, "https://a.com/x"), tab(2, "https://b.com/"), tab(3, "about:blank")];

        let mut commands: Vec<UiCommand> = Vec::new();
        refresh_all(&settings, &tabs, &mut commands);

        assert_eq!(
            titles(&commands),
            vec![
                (None, TITLE_ALLOWED.to_string()),
                (Some(1), TITLE_DISABLED.to_string()),
                (Some(2), TITLE_ALLOWED.to_string()),
                (Some(3), TITLE_ALLOWED.to_string()),
            ]
        );
    }

    #[test]
    fn test_per_site_resets_global_default_icon() {
        let mut settings = per_site_with(&["a.com"]);
        settings.mode = Mode::Global;
        let tabs = vec![tab(1, "https://a.com/")];

        let mut commands: Vec<UiCommand> = Vec::new();
        refresh_all(&settings, &tabs, &mut commands);
        settings.mode = Mode::PerSite;
        refresh_all(&settings, &tabs, &mut commands);

        // The last extension-wide icon is the plain one, so new tabs start plain
        let default_icon = commands.iter().rev().find_map(|c| match c {
            UiCommand::SetIcon { tab_id: None, path } => Some(path.clone()),
            _ => None,
        });
        assert_eq!(default_icon.unwrap()["16"], "icons/logo-16.png");
        let default_title = titles(&commands).into_iter().rev().find(|(t, _)| t.is_none());
        assert_eq!(default_title, Some((None, TITLE_ALLOWED.to_string())));
    }

    #[test]
    fn test_refresh_site_fans_out() {
        let settings = per_site_with(&["a.com"]);
        let tabs = vec![tab(1, "https://a.com/x"), tab(2, "https://b.com/"), tab(3, "http://A.com/y")];
        let site = SiteKey::from_stored("a.com").unwrap();

        let mut commands: Vec<UiCommand> = Vec::new();
        refresh_site(&settings, &site, &tabs, &mut commands);

        assert_eq!(
            titles(&commands),
            vec![(Some(1), TITLE_DISABLED.to_string()), (Some(3), TITLE_DISABLED.to_string())]
        );
    }

    #[test]
    fn test_refresh_converges() {
        let settings = per_site_with(&["a.com"]);
        let tabs = vec![tab(1, "https://a.com/"), tab(2, "https://b.com/")];

        let mut first: Vec<UiCommand> = Vec::new();
        refresh_all(&settings, &tabs, &mut first);
        refresh_all(&settings, &tabs[1..], &mut first);
        let mut second: Vec<UiCommand> = Vec::new();
        refresh_all(&settings, &tabs[1..], &mut second);
        refresh_all(&settings, &tabs, &mut second);

        let last = |commands: &[UiCommand], id| {
            titles(commands).into_iter().rev().find(|(t, _)| *t == Some(id)).map(|(_, title)| title)
        };
        for id in [1, 2] {
            assert_eq!(last(&first[..], id), last(&second[..], id));
        }
    }

    #[test]
    fn test_command_wire_shape() {
        let mut commands: Vec<UiCommand> = Vec::new();
        commands.set_icon(Some(3), &icon_for(false).paths());
        assert_eq!(
            serde_json::to_value(&commands[0]).unwrap(),
            serde_json::json!({
                "op": "setIcon",
                "tabId": 3,
                "path": {"16": "icons/logo-16.png", "32": "icons/logo-32.png"}
            })
        );
    }
}
