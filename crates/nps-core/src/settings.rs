//! Versioned settings store
//!
//! Each field lives under its own storage key so that writes to different
//! fields never overwrite each other:
//!
//! | key               | shape                                      |
//! |-------------------|--------------------------------------------|
//! | `version`         | number                                     |
//! | `mode`            | `"global"` or `"persite"`                  |
//! | `globalDisabled`  | bool                                       |
//! | `persiteSettings` | array of `[site, {"isDisabled": bool}]`    |
//! | `isDisabled`      | schema 1 flat flag, dropped by migration   |

use std::collections::BTreeMap;

use serde_json::Value;

use crate::storage::{StorageBackend, StorageError};
use crate::types::{set_site_flag, Mode, PartialSettings, Settings, SiteSetting, LATEST_VERSION};
use crate::url::SiteKey;

pub const KEY_VERSION: &str = "version";
pub const KEY_MODE: &str = "mode";
pub const KEY_GLOBAL_DISABLED: &str = "globalDisabled";
pub const KEY_PERSITE: &str = "persiteSettings";
pub const KEY_LEGACY_DISABLED: &str = "isDisabled";

/// Version assumed for a populated store without a version key.
const UNVERSIONED: u32 = 1;

/// Error type for settings persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
    #[error("Unknown schema version: found {found}, supported up to {supported}")]
    UnknownSchemaVersion { found: u32, supported: u32 },
}

/// Settings persistence and migration over a storage backend.
pub struct SettingsStore<S> {
    backend: S,
}

impl<S: StorageBackend> SettingsStore<S> {
    /// Upgrade steps in order; entry `n` lifts schema `n + 1` to `n + 2`.
    /// The length is tied to `LATEST_VERSION`, so bumping it without adding
    /// a step does not compile.
    const MIGRATIONS: [fn(&mut Self) -> Result<(), StoreError>; (LATEST_VERSION - UNVERSIONED) as usize] =
        [Self::migrate_v1_to_v2];

    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Read the persisted settings, initializing or migrating as needed.
    ///
    /// A store written by a newer build is read without migration; its
    /// `version` is reported as found and `save` will refuse to write.
    pub fn load(&mut self) -> Result<Settings, StoreError> {
        if self.backend.is_empty()? {
            log::info!("(init) No persistent state found, initializing...");
            let settings = Settings::default();
            self.write_defaults(&settings)?;
            return Ok(settings);
        }

        let stored = self.stored_version()?;
        let version = match self.migrate(stored) {
            Ok(version) => version,
            Err(StoreError::UnknownSchemaVersion { found, supported }) => {
                log::warn!(
                    "(init) Stored schema {found} is newer than {supported}, reading known fields only"
                );
                found
            }
            Err(e) => return Err(e),
        };

        let settings = Settings {
            version,
            mode: self.read_mode()?,
            global_disabled: self.read_global_disabled()?,
            per_site: self.read_per_site()?,
        };
        log::debug!(
            "(init) Loaded persistent state: mode={} globalDisabled={} sites={}",
            settings.mode,
            settings.global_disabled,
            settings.per_site.len()
        );
        Ok(settings)
    }

    /// Apply upgrade steps from `from` to the latest version.
    ///
    /// Every step persists its own version bump, so an interrupted run
    /// resumes at the step that did not finish.
    pub fn migrate(&mut self, from: u32) -> Result<u32, StoreError> {
        if from > LATEST_VERSION {
            return Err(StoreError::UnknownSchemaVersion {
                found: from,
                supported: LATEST_VERSION,
            });
        }

        // Nothing predates schema 1
        let current = from.max(UNVERSIONED);
        for (target, step) in (UNVERSIONED + 1..).zip(Self::MIGRATIONS) {
            if target <= current {
                continue;
            }
            step(self)?;
            self.backend.set(KEY_VERSION, Value::from(target))?;
            log::info!("(migrate) upgraded settings to schema {target}");
        }
        Ok(LATEST_VERSION)
    }

    /// Persist only the changed fields of `partial`.
    pub fn save(&mut self, partial: &PartialSettings) -> Result<(), StoreError> {
        if partial.is_empty() {
            return Ok(());
        }

        let stored = self.stored_version()?;
        if stored > LATEST_VERSION {
            return Err(StoreError::UnknownSchemaVersion {
                found: stored,
                supported: LATEST_VERSION,
            });
        }

        if let Some(mode) = partial.mode {
            self.backend.set(KEY_MODE, Value::from(mode.as_str()))?;
        }
        if let Some(disabled) = partial.global_disabled {
            self.backend.set(KEY_GLOBAL_DISABLED, Value::Bool(disabled))?;
        }
        if !partial.sites.is_empty() {
            // Re-read so concurrent changes to other sites survive.
            let mut per_site = self.read_per_site()?;
            for change in &partial.sites {
                set_site_flag(&mut per_site, &change.site, change.disabled);
            }
            self.backend.set(KEY_PERSITE, encode_per_site(&per_site))?;
        }
        Ok(())
    }

    fn write_defaults(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.backend.set(KEY_MODE, Value::from(settings.mode.as_str()))?;
        self.backend
            .set(KEY_GLOBAL_DISABLED, Value::Bool(settings.global_disabled))?;
        self.backend.set(KEY_PERSITE, encode_per_site(&settings.per_site))?;
        self.backend.set(KEY_VERSION, Value::from(settings.version))?;
        Ok(())
    }

    fn migrate_v1_to_v2(&mut self) -> Result<(), StoreError> {
        self.backend.remove(KEY_LEGACY_DISABLED)?;

        if !matches!(self.backend.get(KEY_GLOBAL_DISABLED)?, Some(Value::Bool(_))) {
            self.backend.set(KEY_GLOBAL_DISABLED, Value::Bool(true))?;
        }
        if !matches!(self.backend.get(KEY_PERSITE)?, Some(Value::Array(_))) {
            self.backend.set(KEY_PERSITE, Value::Array(Vec::new()))?;
        }
        if self.read_mode_value()?.is_none() {
            self.backend.set(KEY_MODE, Value::from(Mode::default().as_str()))?;
        }
        Ok(())
    }

    fn stored_version(&self) -> Result<u32, StoreError> {
        Ok(match self.backend.get(KEY_VERSION)? {
            None => UNVERSIONED,
            Some(value) => match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(v) => v,
                None => {
                    log::warn!("(init) ignoring malformed version {value}");
                    UNVERSIONED
                }
            },
        })
    }

    fn read_mode_value(&self) -> Result<Option<Mode>, StoreError> {
        Ok(self
            .backend
            .get(KEY_MODE)?
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok())))
    }

    fn read_mode(&self) -> Result<Mode, StoreError> {
        Ok(self.read_mode_value()?.unwrap_or_else(|| {
            log::warn!("(init) stored mode missing or malformed, using {}", Mode::default());
            Mode::default()
        }))
    }

    fn read_global_disabled(&self) -> Result<bool, StoreError> {
        Ok(match self.backend.get(KEY_GLOBAL_DISABLED)? {
            Some(Value::Bool(b)) => b,
            other => {
                if other.is_some() {
                    log::warn!("(init) malformed {KEY_GLOBAL_DISABLED}, using default");
                }
                Settings::default().global_disabled
            }
        })
    }

    fn read_per_site(&self) -> Result<BTreeMap<SiteKey, SiteSetting>, StoreError> {
        Ok(match self.backend.get(KEY_PERSITE)? {
            Some(value) => decode_per_site(value),
            None => BTreeMap::new(),
        })
    }
}

/// Serialize the per-site map as JS `Map` entries.
fn encode_per_site(per_site: &BTreeMap<SiteKey, SiteSetting>) -> Value {
    let entries: Vec<(&SiteKey, &SiteSetting)> = per_site.iter().collect();
    serde_json::to_value(entries).unwrap_or_else(|_| Value::Array(Vec::new()))
}

/// Parse JS `Map` entries, skipping malformed ones.
fn decode_per_site(value: Value) -> BTreeMap<SiteKey, SiteSetting> {
    let Value::Array(items) = value else {
        log::warn!("(init) malformed {KEY_PERSITE}, ignoring");
        return BTreeMap::new();
    };

    let mut per_site = BTreeMap::new();
    for item in items {
        match serde_json::from_value::<(String, SiteSetting)>(item) {
            Ok((host, setting)) => match SiteKey::from_stored(&host) {
                Some(site) => {
                    per_site.insert(site, setting);
                }
                None => log::warn!("(init) skipping empty site key"),
            },
            Err(e) => log::warn!("(init) skipping malformed site entry: {e}"),
        }
    }
    per_site
}
