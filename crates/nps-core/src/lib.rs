//! NoPageSpeed Core Library
//!
//! This crate decides, per outgoing request, whether to send `PageSpeed: off`
//! and keeps the toolbar button in sync with that decision.
//!
//! # Architecture
//!
//! All decision logic is pure: settings are loaded from a `StorageBackend` at
//! the start of each operation and passed explicitly to every function.
//! Browser capabilities (storage, tab queries, toolbar action, messaging) are
//! traits the host implements, so the same engine runs under the wasm
//! bindings, the CLI and the tests.
//!
//! # Modules
//!
//! - `url`: Site key extraction from request and tab URLs
//! - `types`: Settings, mode, headers and tabs
//! - `storage`: Key-value storage port and in-memory store
//! - `settings`: Versioned settings store and schema migration
//! - `decision`: Disabled decision engine
//! - `header`: `PageSpeed` header injection
//! - `ui`: Toolbar icon/title reflection
//! - `host`: Tab query and broadcast ports
//! - `options`: Options page summary
//! - `background`: Named event handlers tying it all together

pub mod background;
pub mod decision;
pub mod header;
pub mod host;
pub mod options;
pub mod settings;
pub mod storage;
pub mod types;
pub mod ui;
pub mod url;

// Re-export commonly used types
pub use background::Background;
pub use decision::{is_disabled_for, toggle, ToggleOutcome};
pub use host::{Broadcast, Message, TabFilter, TabQuery};
pub use settings::{SettingsStore, StoreError};
pub use storage::{MemoryStorage, StorageBackend, StorageChange, StorageError};
pub use types::{Header, Mode, PartialSettings, Settings, SiteSetting, Tab, LATEST_VERSION};
pub use ui::{icon_for, ActionSurface, IconState, IconVariant, UiCommand};
pub use url::{resolve_site, SiteKey, SiteKeyError};
