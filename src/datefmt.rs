//! Localized date formatting for run timestamps.
//!
//! Renders full month name, day, hour and minute for a given locale tag.
//! Parsed locales are memoized process-wide, so repeated formatter lookups
//! for an unchanged locale are a map hit rather than a fresh parse.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Locale, Utc};

static LOCALES: OnceLock<Mutex<HashMap<String, Locale>>> = OnceLock::new();

/// Formats dates as e.g. "November 20, 3:30 PM" in the requested locale.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
}

impl DateFormatter {
    /// Look up a formatter for a locale tag ("en-US", "pt_BR", ...).
    /// Unknown tags fall back to the POSIX locale.
    pub fn for_locale(tag: &str) -> Self {
        let cache = LOCALES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut cache = cache.lock().expect("locale cache poisoned");
        let locale = *cache
            .entry(tag.to_string())
            .or_insert_with(|| parse_locale(tag));
        Self { locale }
    }

    pub fn format(&self, date: DateTime<Utc>) -> String {
        date.format_localized("%B %-d, %-I:%M %p", self.locale)
            .to_string()
    }
}

fn parse_locale(tag: &str) -> Locale {
    // chrono locale names are underscore-separated.
    Locale::try_from(tag.replace('-', "_").as_str()).unwrap_or(Locale::POSIX)
}
