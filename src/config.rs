use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sampler: SamplerConfig,
    pub pipeline: PipelineConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub theme: String,
    pub hide_system_processes: bool,
    pub hide_inaccessible_processes: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 2000,
            theme: "light".to_string(),
            hide_system_processes: false,
            hide_inaccessible_processes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_ms: u64,
    pub cpu_sample_every: u32,
    pub disk_io_threshold_mb: f64,
    pub name_max_len: usize,
    pub user_max_len: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            interval_ms: 4000,
            cpu_sample_every: 4,
            disk_io_threshold_mb: 50.0,
            name_max_len: 30,
            user_max_len: 15,
        }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub render_delay_ms: u64,
    pub search_debounce_ms: u64,
    pub scroll_idle_ms: u64,
    pub scroll_retry_ms: u64,
    pub scroll_retry_max_ms: u64,
    pub resume_delay_ms: u64,
    pub move_idle_ms: u64,
    pub fill_interval_ms: u64,
    pub fill_batch: usize,
    pub fallback_visible_rows: usize,
    pub significance: SignificanceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            render_delay_ms: 20,
            search_debounce_ms: 200,
            scroll_idle_ms: 300,
            scroll_retry_ms: 250,
            scroll_retry_max_ms: 1000,
            resume_delay_ms: 10,
            move_idle_ms: 300,
            fill_interval_ms: 80,
            fill_batch: 8,
            fallback_visible_rows: 20,
            significance: SignificanceConfig::default(),
        }
    }
}

/// Thresholds above which a new snapshot skips the render coalescing delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    pub memory_percent_delta: f64,
    pub top_n: usize,
    pub process_count_delta: usize,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        SignificanceConfig {
            memory_percent_delta: 0.5,
            top_n: 3,
            process_count_delta: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub search: String,
    pub terminate: String,
    pub open_location: String,
    pub toggle_system: String,
    pub toggle_inaccessible: String,
    pub cycle_theme: String,
    pub refresh: String,
    pub select: String,
    pub help: String,
    pub elevate: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            search: "/".to_string(),
            terminate: "k".to_string(),
            open_location: "o".to_string(),
            toggle_system: "s".to_string(),
            toggle_inaccessible: "i".to_string(),
            cycle_theme: "t".to_string(),
            refresh: "r".to_string(),
            select: "Space".to_string(),
            help: "?".to_string(),
            elevate: "e".to_string(),
        }
    }
}

/// Parse a keybind string such as `"q"`, `"Enter"` or `"Space"`.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    match s {
        "Enter" => Some(KeyCode::Enter),
        "Esc" | "Escape" => Some(KeyCode::Esc),
        "Tab" => Some(KeyCode::Tab),
        "Space" => Some(KeyCode::Char(' ')),
        "Backspace" => Some(KeyCode::Backspace),
        "Delete" | "Del" => Some(KeyCode::Delete),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(KeyCode::Char(c)),
                _ => None,
            }
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("taskwatch").join("config.toml"))
}

/// Replace values that would stall the loop with their defaults.
pub fn validate(config: &mut Config) {
    let general = GeneralConfig::default();
    let sampler = SamplerConfig::default();
    if config.general.refresh_rate_ms == 0 {
        tracing::warn!("refresh_rate_ms must be positive, using default");
        config.general.refresh_rate_ms = general.refresh_rate_ms;
    }
    if config.sampler.interval_ms == 0 {
        tracing::warn!("interval_ms must be positive, using default");
        config.sampler.interval_ms = sampler.interval_ms;
    }
    if config.sampler.cpu_sample_every == 0 {
        config.sampler.cpu_sample_every = sampler.cpu_sample_every;
    }
    if config.pipeline.fill_batch == 0 {
        config.pipeline.fill_batch = PipelineConfig::default().fill_batch;
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Config::default()
        }),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "unreadable config, using defaults");
            }
            Config::default()
        }
    }
}

pub fn save_config_to_path(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
