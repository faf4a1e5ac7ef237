use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use num_format::{Locale, ToFormattedString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

static WARNED_MESSAGES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

pub fn warn_once(message: impl Into<String>) {
    let message = message.into();
    let cache = WARNED_MESSAGES.get_or_init(|| Mutex::new(HashSet::new()));

    if let Ok(mut warned) = cache.lock()
        && warned.insert(message.clone())
    {
        eprintln!("{message}");
    }
}

#[derive(Clone)]
pub struct NumberFormatOptions {
    pub use_comma: bool,
    pub use_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for NumberFormatOptions {
    fn default() -> Self {
        Self {
            use_comma: false,
            use_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

fn locale_for(name: &str) -> Locale {
    match name {
        "de" => Locale::de,
        "fr" => Locale::fr,
        "es" => Locale::es,
        "it" => Locale::it,
        "ja" => Locale::ja,
        "ko" => Locale::ko,
        "zh" => Locale::zh,
        _ => Locale::en,
    }
}

/// Format a count for display. Accepts u32, u64 and friends.
pub fn format_number(n: impl Into<u64>, options: &NumberFormatOptions) -> String {
    let n: u64 = n.into();

    if options.use_human {
        let (scaled, suffix) = if n >= 1_000_000_000_000 {
            (n as f64 / 1_000_000_000_000.0, "t")
        } else if n >= 1_000_000_000 {
            (n as f64 / 1_000_000_000.0, "b")
        } else if n >= 1_000_000 {
            (n as f64 / 1_000_000.0, "m")
        } else if n >= 1_000 {
            (n as f64 / 1_000.0, "k")
        } else {
            return n.to_string();
        };
        format!("{scaled:.prec$}{suffix}", prec = options.decimal_places)
    } else if options.use_comma {
        n.to_formatted_string(&locale_for(&options.locale))
    } else {
        n.to_string()
    }
}

/// Format a fractional value such as an average word count.
pub fn format_decimal(value: f64, options: &NumberFormatOptions) -> String {
    format!("{value:.prec$}", prec = options.decimal_places)
}

/// Get the system's local timezone as an IANA timezone string (e.g., "America/Chicago")
pub fn get_local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a configured time zone name. An empty name means the system zone;
/// an unknown system zone falls back to UTC.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    if name.is_empty() {
        let local = get_local_timezone();
        return Ok(local.parse::<Tz>().unwrap_or_else(|_| {
            warn_once(format!("⚠️  Unknown system time zone {local}, using UTC"));
            Tz::UTC
        }));
    }

    name.parse::<Tz>()
        .map_err(|_| anyhow!("Unknown time zone: {name}"))
}

/// Shorten a label to `max` characters, marking the cut with an ellipsis.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let kept: String = label.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Custom serde deserializer that reads a value of the wrong type as `None`
/// instead of failing the whole document.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = simd_json::OwnedValue::deserialize(deserializer)?;
    Ok(simd_json::serde::from_owned_value(value).ok())
}
