use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use stuck_server::SequencerOptions;
use stuck_world::safe_location::{DEFAULT_MAX_Y, DEFAULT_MIN_Y};
use stuck_world::SearchSettings;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/stuck.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StuckConfig {
    /// Seconds between two successful uses by the same player.
    pub cooldown_seconds: i64,
    /// Horizontal search radius in blocks around the player.
    pub search_radius: i32,
    /// Random columns tried before giving up.
    pub max_attempts: i64,
    pub min_y: i32,
    pub max_y: i32,
    pub debug: bool,
    pub avoid_hazardous_blocks: bool,
    pub avoid_unstable_blocks: bool,
    pub print_success_message: bool,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 30,
            search_radius: 5,
            max_attempts: 50,
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
            debug: false,
            avoid_hazardous_blocks: true,
            avoid_unstable_blocks: true,
            print_success_message: true,
        }
    }
}

impl StuckConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load and validate configuration from `path`.
    ///
    /// A missing file is created with the defaults; unreadable or malformed
    /// files fall back to the defaults without touching the file.
    pub fn load_from_path(path: &Path) -> Self {
        let config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<StuckConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    StuckConfig::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let defaults = StuckConfig::default();
                match defaults.save_to_path(path) {
                    Ok(()) => info!("Wrote default configuration to {}", path.display()),
                    Err(err) => warn!(
                        "Config not found at {} and defaults could not be written: {err:#}",
                        path.display()
                    ),
                }
                defaults
            }
            Err(err) => {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
                StuckConfig::default()
            }
        };

        let config = config.validated();
        info!(
            "Loaded configuration: cooldown={}s, radius={}, maxAttempts={}, Y-range={}-{}",
            config.cooldown_seconds,
            config.search_radius,
            config.max_attempts,
            config.min_y,
            config.max_y
        );
        config
    }

    /// Save configuration to an explicit path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self).context("serializing configuration")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Clamp out-of-range values, logging each correction.
    pub fn validated(mut self) -> Self {
        let defaults = StuckConfig::default();
        if self.cooldown_seconds < 0 {
            warn!(
                "cooldown-seconds {} is negative, using 0",
                self.cooldown_seconds
            );
            self.cooldown_seconds = 0;
        }
        if self.cooldown_seconds > i64::from(u32::MAX) {
            warn!(
                "cooldown-seconds {} is too large, using {}",
                self.cooldown_seconds,
                u32::MAX
            );
            self.cooldown_seconds = i64::from(u32::MAX);
        }
        if self.search_radius < 0 {
            warn!("search-radius {} is negative, using 0", self.search_radius);
            self.search_radius = 0;
        }
        if self.max_attempts < 1 {
            warn!("max-attempts {} is below 1, using 1", self.max_attempts);
            self.max_attempts = 1;
        }
        if self.max_attempts > i64::from(u32::MAX) {
            warn!(
                "max-attempts {} is too large, using {}",
                self.max_attempts,
                u32::MAX
            );
            self.max_attempts = i64::from(u32::MAX);
        }
        if self.min_y > self.max_y {
            warn!(
                "min-y {} is above max-y {}, using {}-{}",
                self.min_y, self.max_y, defaults.min_y, defaults.max_y
            );
            self.min_y = defaults.min_y;
            self.max_y = defaults.max_y;
        }
        self
    }

    /// Cooldown window in whole seconds.
    pub fn cooldown_secs(&self) -> u32 {
        u32::try_from(self.cooldown_seconds.max(0)).unwrap_or(u32::MAX)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            radius: self.search_radius.max(0),
            max_attempts: u32::try_from(self.max_attempts.max(1)).unwrap_or(u32::MAX),
            min_y: self.min_y,
            max_y: self.max_y,
            avoid_hazardous: self.avoid_hazardous_blocks,
            avoid_unstable: self.avoid_unstable_blocks,
            debug: self.debug,
        }
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            print_success_message: self.print_success_message,
            debug: self.debug,
        }
    }
}
