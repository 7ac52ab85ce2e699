//! URL helpers for `include` resolution.

/// True iff `url` does not start with a scheme (`[a-z]+:`), `/`, `?`, or `#`.
pub fn is_relative_url(url: &str) -> bool {
    match url.as_bytes().first() {
        None => true,
        Some(b'/') | Some(b'?') | Some(b'#') => false,
        Some(_) => {
            let scheme_len = url.bytes().take_while(u8::is_ascii_lowercase).count();
            !(scheme_len > 0 && url.as_bytes().get(scheme_len) == Some(&b':'))
        }
    }
}

/// The prefix of `url` up to and including its final `/`, or the empty
/// string when it has none.
pub fn base_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(index) => &url[..=index],
        None => "",
    }
}

/// Resolve `url` against `base` when it is relative; pass it through
/// unchanged otherwise.
pub(crate) fn resolve_against(base: &str, url: &str) -> String {
    if is_relative_url(url) {
        format!("{base}{url}")
    } else {
        url.to_string()
    }
}
