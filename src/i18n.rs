use lazy_static::lazy_static;
use std::env;

lazy_static! {
    // Current locale
    static ref LANG: String = {
        // Fall back to English
        let default_lang = "en".to_string();
        // LANG usually looks like `en_US.UTF-8`; only `en` is needed
        env::var("LANG")
            .ok()
            .and_then(|l| l.split(['_', '.']).next().map(|s| s.to_string()))
            .filter(|l| !l.is_empty() && l != "C" && l != "POSIX")
            .unwrap_or(default_lang)
    };
}

/// Set the message locale from the environment
///
/// Call once at startup, before any message is rendered.
pub fn setup_i18n() {
    rust_i18n::set_locale(&LANG);
}

/// Locale picked by [`setup_i18n`]
pub fn current_language() -> &'static str {
    &LANG
}
