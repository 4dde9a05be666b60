//! Site key resolution
//!
//! Extracts the normalized hostname used to index per-site settings.
//! Parsing works directly on string slices; only the final key allocates.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Errors
// =============================================================================

/// Why a URL produced no site key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiteKeyError {
    #[error("Empty URL")]
    Empty,
    #[error("Unsupported scheme in URL: {0}")]
    UnsupportedScheme(String),
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

// =============================================================================
// Scheme Extraction
// =============================================================================

/// Schemes whose requests carry the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Fast scheme extraction without URL parsing.
#[inline]
pub fn extract_scheme(url: &str) -> Option<Scheme> {
    let bytes = url.as_bytes();
    if bytes.len() >= 8 && bytes[..8].eq_ignore_ascii_case(b"https://") {
        Some(Scheme::Https)
    } else if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"http://") {
        Some(Scheme::Http)
    } else {
        None
    }
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();
    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
///
/// Userinfo and port are excluded. IPv6 literals keep their brackets.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first path, query or fragment delimiter
    let authority_end = bytes[scheme_end..]
        .iter()
        .position(|&b| b == b'/' || b == b'?' || b == b'#')
        .map_or(bytes.len(), |i| scheme_end + i);

    // Skip userinfo (last '@' wins, passwords may contain '@')
    let host_start = bytes[scheme_end..authority_end]
        .iter()
        .rposition(|&b| b == b'@')
        .map_or(scheme_end, |i| scheme_end + i + 1);

    if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end].iter().position(|&b| b == b']')?;
        return Some((host_start, host_start + close + 1));
    }

    let host_end = bytes[host_start..authority_end]
        .iter()
        .position(|&b| b == b':')
        .map_or(authority_end, |i| host_start + i);

    Some((host_start, host_end))
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

// =============================================================================
// Site Key
// =============================================================================

/// Normalized hostname indexing per-site settings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    /// Resolve the site key of an http(s) URL.
    pub fn from_url(url: &str) -> Result<Self, SiteKeyError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SiteKeyError::Empty);
        }
        if extract_scheme(url).is_none() {
            return Err(SiteKeyError::UnsupportedScheme(url.to_string()));
        }

        let host = extract_host(url)
            .map(|h| h.trim_end_matches('.'))
            .filter(|h| !h.is_empty() && *h != "[]")
            .ok_or_else(|| SiteKeyError::MissingHost(url.to_string()))?;

        Ok(Self(host.to_ascii_lowercase()))
    }

    /// Wrap an already-normalized hostname, as read back from storage.
    ///
    /// Returns `None` for an empty string.
    pub fn from_stored(host: &str) -> Option<Self> {
        let host = host.trim().trim_end_matches('.');
        if host.is_empty() {
            None
        } else {
            Some(Self(host.to_ascii_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SiteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a site key, logging and discarding failures.
///
/// Invalid URLs behave as "no site": never disabled, never persisted.
pub fn resolve_site(url: &str) -> Option<SiteKey> {
    match SiteKey::from_url(url) {
        Ok(site) => Some(site),
        Err(e) => {
            log::debug!("(site) no site key: {e}");
            None
        }
    }
}
