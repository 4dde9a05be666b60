//! Core type definitions for NoPageSpeed
//!
//! These types map directly to the persisted storage layout and to the
//! objects the extension host hands to the background operations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::url::SiteKey;

/// Latest schema version understood by this build.
pub const LATEST_VERSION: u32 = 2;

// =============================================================================
// Operating Mode
// =============================================================================

/// Which flag governs header injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// One flag governs every site
    #[serde(rename = "global")]
    Global,
    /// Independent flag per hostname
    #[default]
    #[serde(rename = "persite")]
    PerSite,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerSite => "persite",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operating mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "persite" => Ok(Self::PerSite),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Per-site preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    pub is_disabled: bool,
}

/// The persisted preference singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Schema version; only ever raised by migration
    pub version: u32,
    pub mode: Mode,
    pub global_disabled: bool,
    pub per_site: BTreeMap<SiteKey, SiteSetting>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            mode: Mode::PerSite,
            global_disabled: true,
            per_site: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Stored flag for a site; absent means not disabled.
    pub fn site_disabled(&self, site: &SiteKey) -> bool {
        self.per_site.get(site).is_some_and(|s| s.is_disabled)
    }

    /// Sites whose flag is set, in key order.
    pub fn disabled_sites(&self) -> impl Iterator<Item = &SiteKey> {
        self.per_site
            .iter()
            .filter(|(_, setting)| setting.is_disabled)
            .map(|(site, _)| site)
    }

    /// Fold a delta into this value.
    pub fn apply(&mut self, delta: &PartialSettings) {
        if let Some(mode) = delta.mode {
            self.mode = mode;
        }
        if let Some(disabled) = delta.global_disabled {
            self.global_disabled = disabled;
        }
        for change in &delta.sites {
            set_site_flag(&mut self.per_site, &change.site, change.disabled);
        }
    }
}

/// Record a per-site flag; clearing it drops the entry.
pub(crate) fn set_site_flag(
    per_site: &mut BTreeMap<SiteKey, SiteSetting>,
    site: &SiteKey,
    disabled: bool,
) {
    if disabled {
        per_site.insert(site.clone(), SiteSetting { is_disabled: true });
    } else {
        per_site.remove(site);
    }
}

/// A single per-site flag change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteChange {
    pub site: SiteKey,
    pub disabled: bool,
}

/// Fields to persist. `None` / empty means unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialSettings {
    pub mode: Option<Mode>,
    pub global_disabled: Option<bool>,
    pub sites: Vec<SiteChange>,
}

impl PartialSettings {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.global_disabled.is_none() && self.sites.is_empty()
    }
}

// =============================================================================
// Request Headers
// =============================================================================

/// One outgoing request header, as the interception hook delivers it.
///
/// The host sends either a text `value` or a `binaryValue` byte array. Both
/// are carried through untouched so a header list round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<Vec<u8>>,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            binary_value: None,
        }
    }
}

// =============================================================================
// Tabs
// =============================================================================

pub type TabId = i32;
pub type WindowId = i32;

/// Read-only view of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub window_id: WindowId,
}
