use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::loader::DEFAULT_ARCHIVE_FILE;
use crate::ranking::DEFAULT_MESSAGE_THRESHOLD;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding one subdirectory per conversation. Relative paths
    /// are resolved against the working directory.
    pub messages_dir: String,
    pub archive_file: String,
    pub max_conversations: usize,
    pub message_threshold: usize,
    /// Index into the ranked conversation list to chart.
    pub conversation: usize,
    pub histogram_bins: usize,
    pub top_words: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// IANA time zone for time-of-day charts. Empty means the system zone.
    pub timezone: String,
    pub number_comma: bool,
    pub number_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            messages_dir: "messages".to_string(),
            archive_file: DEFAULT_ARCHIVE_FILE.to_string(),
            max_conversations: 1000,
            message_threshold: DEFAULT_MESSAGE_THRESHOLD,
            conversation: 0,
            histogram_bins: 100,
            top_words: 10,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: String::new(),
            number_comma: false,
            number_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

thread_local! {
    static TEST_CONFIG_PATH: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

#[cfg(test)]
pub fn set_test_config_path(path: PathBuf) {
    TEST_CONFIG_PATH.with(|p| *p.borrow_mut() = Some(path));
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(test)]
        {
            if let Some(path) = TEST_CONFIG_PATH.with(|p| p.borrow().clone()) {
                return Ok(path);
            }
        }

        Ok(dirs::home_dir()
            .context("Could not find home directory")?
            .join(".chatstats.toml"))
    }

    pub fn load() -> Result<Option<Config>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(Some(config))
    }

    /// Load the config file, falling back to defaults when it is missing or
    /// broken.
    pub fn load_or_default() -> Config {
        match Self::load() {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring config file: {e:#}");
                Config::default()
            }
        }
    }

    pub fn save(&self, silent: bool) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        if !silent {
            println!("✅ Configuration saved to: {}", config_path.display());
        }

        Ok(())
    }
}

// CLI helper functions
pub fn create_default_config(overwrite: bool) -> Result<()> {
    let config = Config::default();
    if !std::fs::exists(Config::config_path()?)? || overwrite {
        config.save(true)?;

        println!("📝 Created default configuration file.");
        println!("📍 Change settings with:");
        println!("   chatstats config set messages-dir ~/facebook/messages/inbox");
        println!("or edit");
        println!("   {}", Config::config_path()?.display());
    } else {
        println!("Configuration already exists.  Pass `--overwrite` to overwrite.");
    }

    Ok(())
}

pub fn show_config() -> Result<()> {
    match Config::load()? {
        Some(config) => {
            let analysis = &config.analysis;
            let display = &config.display;
            println!("🔧 Current configuration:");
            println!("   Messages Dir: {}", analysis.messages_dir);
            println!("   Archive File: {}", analysis.archive_file);
            println!("   Max Conversations: {}", analysis.max_conversations);
            println!("   Message Threshold: {}", analysis.message_threshold);
            println!("   Conversation: {}", analysis.conversation);
            println!("   Histogram Bins: {}", analysis.histogram_bins);
            println!("   Top Words: {}", analysis.top_words);
            println!(
                "   Timezone: {}",
                if display.timezone.is_empty() {
                    "System"
                } else {
                    display.timezone.as_str()
                }
            );
            println!("   Number Comma: {}", display.number_comma);
            println!("   Number Human: {}", display.number_human);
            println!("   Locale: {}", display.locale);
            println!("   Decimal Places: {}", display.decimal_places);
        }
        None => {
            println!("❌ No configuration file found.");
            println!("   Run 'chatstats config init' to create one.");
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Invalid boolean value. Use 'true' or 'false'")
}

fn parse_count(value: &str) -> Result<usize> {
    value.parse::<usize>().context("Invalid number value")
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?.unwrap_or_default();

    match key {
        "messages-dir" => config.analysis.messages_dir = value.to_string(),
        "archive-file" => config.analysis.archive_file = value.to_string(),
        "max-conversations" => config.analysis.max_conversations = parse_count(value)?,
        "message-threshold" => config.analysis.message_threshold = parse_count(value)?,
        "conversation" => config.analysis.conversation = parse_count(value)?,
        "histogram-bins" => {
            let bins = parse_count(value)?;
            if bins == 0 {
                anyhow::bail!("histogram-bins must be at least 1");
            }
            config.analysis.histogram_bins = bins;
        }
        "top-words" => config.analysis.top_words = parse_count(value)?,
        "timezone" => {
            if !value.is_empty() {
                crate::utils::resolve_timezone(value)?;
            }
            config.display.timezone = value.to_string();
        }
        "number-comma" => config.display.number_comma = parse_bool(value)?,
        "number-human" => config.display.number_human = parse_bool(value)?,
        "locale" => config.display.locale = value.to_string(),
        "decimal-places" => config.display.decimal_places = parse_count(value)?,
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    config.save(false)?;
    Ok(())
}
