use std::cmp::Ordering;

/// Locale-aware string ordering.
///
/// In the browser this is `String.prototype.localeCompare` (the user's locale, as the
/// publication screens sort). Native builds (unit tests) fall back to a case-folded
/// comparison with a plain byte-order tie break.
#[cfg(target_arch = "wasm32")]
pub(crate) fn locale_compare(a: &str, b: &str) -> Ordering {
    let a = js_sys::JsString::from(a);
    a.locale_compare(b, &js_sys::Array::new(), &js_sys::Object::new())
        .cmp(&0)
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
