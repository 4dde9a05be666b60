//! Disabled decision engine
//!
//! One engine for both operating modes: the mode parameter selects which
//! stored flag is consulted or flipped.

use crate::types::{Mode, PartialSettings, Settings, SiteChange};
use crate::url::SiteKey;

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Decision after the toggle
    pub disabled: bool,
    /// Fields to persist; `None` when nothing changed
    pub delta: Option<PartialSettings>,
}

/// Whether requests for `site` should carry `PageSpeed: off`.
pub fn is_disabled_for(settings: &Settings, mode: Mode, site: Option<&SiteKey>) -> bool {
    match mode {
        Mode::Global => settings.global_disabled,
        Mode::PerSite => site.is_some_and(|site| settings.site_disabled(site)),
    }
}

/// Flip the flag governing `site` under `mode`.
///
/// Per-site mode without a resolvable site is a no-op.
pub fn toggle(settings: &Settings, mode: Mode, site: Option<&SiteKey>) -> ToggleOutcome {
    let current = is_disabled_for(settings, mode, site);
    let disabled = !current;

    let delta = match (mode, site) {
        (Mode::Global, _) => PartialSettings {
            global_disabled: Some(disabled),
            ..Default::default()
        },
        (Mode::PerSite, Some(site)) => PartialSettings {
            sites: vec![SiteChange {
                site: site.clone(),
                disabled,
            }],
            ..Default::default()
        },
        (Mode::PerSite, None) => {
            log::debug!("(toggle) no site for per-site toggle, ignoring");
            return ToggleOutcome {
                disabled: current,
                delta: None,
            };
        }
    };

    log::info!(
        "(toggle) mode={mode} site={} isDisabled={disabled}",
        site.map_or("-", SiteKey::as_str)
    );
    ToggleOutcome {
        disabled,
        delta: Some(delta),
    }
}

/// Switch the operating mode. Stored flags are left alone.
pub fn set_mode(mode: Mode) -> PartialSettings {
    PartialSettings {
        mode: Some(mode),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(s: &str) -> SiteKey {
        SiteKey::from_stored(s).unwrap()
    }

    fn toggled(settings: &Settings, mode: Mode, key: Option<&SiteKey>) -> (bool, Settings) {
        let outcome = toggle(settings, mode, key);
        let mut next = settings.clone();
        if let Some(delta) = &outcome.delta {
            next.apply(delta);
        }
        (outcome.disabled, next)
    }

    #[test]
    fn test_global_reads_global_flag() {
        let mut settings = Settings::default();
        assert!(is_disabled_for(&settings, Mode::Global, None));
        settings.global_disabled = false;
        assert!(!is_disabled_for(&settings, Mode::Global, Some(&site("a.com"))));
    }

    #[test]
    fn test_per_site_defaults_to_enabled() {
        let settings = Settings::default();
        assert!(!is_disabled_for(&settings, Mode::PerSite, Some(&site("a.com"))));
        assert!(!is_disabled_for(&settings, Mode::PerSite, None));
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let a = site("example.com");
        for mode in [Mode::Global, Mode::PerSite] {
            let start = Settings::default();
            let before = is_disabled_for(&start, mode, Some(&a));
            let (first, once) = toggled(&start, mode, Some(&a));
            assert_eq!(first, !before);
            let (second, twice) = toggled(&once, mode, Some(&a));
            assert_eq!(second, before);
            assert_eq!(is_disabled_for(&twice, mode, Some(&a)), before);
        }
    }

    #[test]
    fn test_per_site_toggle_twice_clears_site() {
        let a = site("example.com");
        let (_, once) = toggled(&Settings::default(), Mode::PerSite, Some(&a));
        assert!(is_disabled_for(&once, Mode::PerSite, Some(&a)));
        let (_, twice) = toggled(&once, Mode::PerSite, Some(&a));
        assert!(!is_disabled_for(&twice, Mode::PerSite, Some(&a)));
    }

    #[test]
    fn test_per_site_toggle_is_isolated() {
        let a = site("a.com");
        let b = site("b.com");
        let mut start = Settings::default();
        start.apply(&PartialSettings {
            sites: vec![SiteChange { site: b.clone(), disabled: true }],
            ..Default::default()
        });

        let (_, next) = toggled(&start, Mode::PerSite, Some(&a));
        assert_eq!(next.global_disabled, start.global_disabled);
        assert_eq!(
            is_disabled_for(&next, Mode::Global, Some(&a)),
            is_disabled_for(&start, Mode::Global, Some(&a))
        );
        assert!(next.site_disabled(&b));
        assert!(next.site_disabled(&a));
    }

    #[test]
    fn test_per_site_toggle_without_site_is_noop() {
        let settings = Settings::default();
        let outcome = toggle(&settings, Mode::PerSite, None);
        assert!(!outcome.disabled);
        assert_eq!(outcome.delta, None);
    }

    #[test]
    fn test_global_toggle_ignores_sites() {
        let outcome = toggle(&Settings::default(), Mode::Global, None);
        assert!(!outcome.disabled);
        let delta = outcome.delta.unwrap();
        assert_eq!(delta.global_disabled, Some(false));
        assert!(delta.sites.is_empty());
    }

    #[test]
    fn test_set_mode_keeps_flags() {
        let mut settings = Settings::default();
        settings.apply(&PartialSettings {
            sites: vec![SiteChange { site: site("a.com"), disabled: true }],
            ..Default::default()
        });
        let before = settings.clone();
        settings.apply(&set_mode(Mode::Global));
        assert_eq!(settings.mode, Mode::Global);
        assert_eq!(settings.per_site, before.per_site);
        assert_eq!(settings.global_disabled, before.global_disabled);
    }
}
