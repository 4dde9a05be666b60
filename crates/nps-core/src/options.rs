//! Options page summary of the current mode.

use serde::Serialize;

use crate::types::{Mode, Settings};

pub const GLOBAL_DISABLED_TEXT: &str = "Requesting to not use";
pub const GLOBAL_ALLOWED_TEXT: &str = "Allowing usage";

/// What the options page shows under the mode selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum OptionsSummary {
    #[serde(rename = "global")]
    Global { state: &'static str },
    /// Empty list renders as "(none)"
    #[serde(rename = "persite", rename_all = "camelCase")]
    PerSite { disabled_sites: Vec<String> },
}

pub fn summarize(settings: &Settings) -> OptionsSummary {
    match settings.mode {
        Mode::Global => OptionsSummary::Global {
            state: if settings.global_disabled {
                GLOBAL_DISABLED_TEXT
            } else {
                GLOBAL_ALLOWED_TEXT
            },
        },
        Mode::PerSite => OptionsSummary::PerSite {
            disabled_sites: settings.disabled_sites().map(|s| s.to_string()).collect(),
        },
    }
}
