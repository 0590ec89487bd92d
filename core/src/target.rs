//! URL resolution: base + path suffix + query string.
//!
//! Query values are JSON-encoded one at a time before form encoding, so
//! `5` goes on the wire as `5`, `"a"` as `%22a%22` and objects as their JSON
//! text. Servers decode each value with a JSON parser.

use ::url::form_urlencoded;

use crate::descriptor::{Descriptor, Query};

/// Join `base` and `suffix` with exactly one `/`.
///
/// Stray delimiters on either side are collapsed, so `users` + `7`,
/// `users/` + `7` and `users` + `/7` all give `users/7`. An empty suffix
/// leaves `base` untouched.
pub fn join_path(base: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), suffix)
}

/// Render `query` as `name=value` pairs with each value JSON-encoded.
///
/// Returns an empty string for an empty map; no leading `?`.
pub fn serialize_query(query: &Query) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in query {
        serializer.append_pair(name, &value.to_string());
    }
    serializer.finish()
}

/// Resolve the final URL for `descriptor` against `endpoint`.
///
/// An explicit descriptor URL wins over the endpoint. The path suffix is
/// joined onto the path part of the base; a query string already on the
/// base stays after the suffix and the descriptor's query follows it with
/// `&`.
pub fn resolve(endpoint: &str, descriptor: &Descriptor) -> String {
    let base = descriptor.url.as_deref().unwrap_or(endpoint);
    let (path_part, existing) = match base.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (base, None),
    };

    let mut url = match descriptor.path.as_deref() {
        Some(path) => join_path(path_part, path),
        None => path_part.to_string(),
    };

    if let Some(existing) = existing.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(existing);
    }

    if let Some(query) = descriptor.query.as_ref().filter(|q| !q.is_empty()) {
        url.push(if existing.is_some_and(|q| !q.is_empty()) { '&' } else { '?' });
        url.push_str(&serialize_query(query));
    }

    url
}
