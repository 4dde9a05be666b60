//! Request header injection

use crate::types::Header;

pub const PAGESPEED_HEADER: &str = "PageSpeed";
pub const PAGESPEED_OFF: &str = "off";

/// Set `PageSpeed: off` on an outgoing header list when `disabled`.
///
/// An existing header (any case) is overwritten in place; otherwise one is
/// appended. With `disabled == false` the list is returned untouched, an
/// existing header included.
pub fn apply(mut headers: Vec<Header>, disabled: bool) -> Vec<Header> {
    if !disabled {
        return headers;
    }

    match headers
        .iter_mut()
        .find(|h| h.name.eq_ignore_ascii_case(PAGESPEED_HEADER))
    {
        Some(header) => {
            log::debug!("(header) Modifying header");
            header.value = Some(PAGESPEED_OFF.to_string());
            header.binary_value = None;
        }
        None => {
            log::debug!("(header) Added header");
            headers.push(Header::new(PAGESPEED_HEADER, PAGESPEED_OFF));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs.iter().map(|(n, v)| Header::new(*n, *v)).collect()
    }

    #[test]
    fn test_not_disabled_is_identity() {
        let headers = list(&[("Accept", "*/*"), ("pagespeed", "on")]);
        assert_eq!(apply(headers.clone(), false), headers);
        assert_eq!(apply(Vec::new(), false), Vec::new());
    }

    #[test]
    fn test_appends_when_absent() {
        let headers = list(&[("Accept", "*/*"), ("User-Agent", "x")]);
        let out = apply(headers.clone(), true);
        assert_eq!(out.len(), headers.len() + 1);
        assert_eq!(&out[..2], &headers[..]);
        assert_eq!(out.last(), Some(&Header::new("PageSpeed", "off")));
    }

    #[test]
    fn test_overwrites_in_place() {
        let headers = list(&[("Accept", "*/*"), ("PAGESPEED", "on"), ("Cookie", "a=b")]);
        let out = apply(headers, true);
        assert_eq!(
            out,
            list(&[("Accept", "*/*"), ("PAGESPEED", "off"), ("Cookie", "a=b")])
        );
    }

    #[test]
    fn test_idempotent() {
        for headers in [list(&[]), list(&[("Accept", "*/*")]), list(&[("PageSpeed", "on")])] {
            let once = apply(headers, true);
            assert_eq!(apply(once.clone(), true), once);
        }
    }

    #[test]
    fn test_binary_value_round_trips() {
        let wire = serde_json::json!([
            {"name": "Accept", "value": "*/*"},
            {"name": "X-Bin", "binaryValue": [1, 2, 3]},
        ]);
        let headers: Vec<Header> = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(headers[1].value, None);
        assert_eq!(headers[1].binary_value, Some(vec![1, 2, 3]));

        let out = apply(headers, false);
        assert_eq!(serde_json::to_value(&out).unwrap(), wire);
    }

    #[test]
    fn test_binary_pagespeed_overwritten_as_text() {
        let headers: Vec<Header> =
            serde_json::from_value(serde_json::json!([{"name": "pagespeed", "binaryValue": [111, 110]}]))
                .unwrap();
        assert_eq!(
            serde_json::to_value(apply(headers, true)).unwrap(),
            serde_json::json!([{"name": "pagespeed", "value": "off"}])
        );
    }

    #[test]
    fn test_global_scenarios() {
        assert_eq!(
            apply(list(&[("Accept", "*/*")]), false),
            list(&[("Accept", "*/*")])
        );
        assert_eq!(
            apply(list(&[("PageSpeed", "on")]), true),
            list(&[("PageSpeed", "off")])
        );
    }
}
