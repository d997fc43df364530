//! Embedded in-app browser detection.
//!
//! The hosted identity provider's popup flow breaks inside in-app webviews,
//! so sign-in is refused there and Android callers get an `intent://` URL
//! that reopens the page in a real browser.

/// Classify a user agent as a known embedded in-app browser.
///
/// The returned label is stable and ends up in error payloads, so existing
/// values must not change.
pub fn detect_embedded_browser(user_agent: &str) -> Option<&'static str> {
    let ua = user_agent.to_lowercase();

    if ua.contains("kakaotalk") {
        return Some("kakaotalk");
    }
    if ua.contains("instagram") {
        return Some("instagram");
    }
    if ua.contains("fban") || ua.contains("fbav") {
        return Some("facebook");
    }
    if ua.contains("line/") {
        return Some("line");
    }
    if ua.contains("naver") {
        return Some("naver-inapp");
    }
    // Android system webviews advertise "; wv" in the platform segment.
    if ua.contains("android") && ua.contains("wv") {
        return Some("android-webview");
    }

    None
}

/// Build a URL that escapes an Android in-app browser into Chrome.
///
/// Only meaningful for Android user agents and http(s) targets; everywhere
/// else there is no portable escape and the caller gets `None`.
pub fn external_browser_url(target_url: &str, user_agent: &str) -> Option<String> {
    if !user_agent.to_lowercase().contains("android") {
        return None;
    }

    let (scheme, rest) = target_url.split_once("://")?;
    if scheme != "http" && scheme != "https" {
        return None;
    }

    Some(format!(
        "intent://{rest}#Intent;scheme={scheme};package=com.android.chrome;end"
    ))
}
