use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Base URLs of the upstream services. Overridable so tests can point the
/// resolvers at a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openweather: String,
    pub open_meteo: String,
    pub open_meteo_geocoding: String,
    pub nominatim: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            open_meteo: "https://api.open-meteo.com".to_string(),
            open_meteo_geocoding: "https://geocoding-api.open-meteo.com".to_string(),
            nominatim: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Weather and geocoding calls.
    pub request_secs: u64,
    /// Timezone lookups.
    pub timezone_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: 10, timezone_secs: 5 }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn timezone(&self) -> Duration {
        Duration::from_secs(self.timezone_secs)
    }
}

/// Region-specific heuristics: which queries get the region-biased geocoder,
/// and which suffixes the forward retry ladder appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionProfile {
    /// ISO 3166-1 alpha-2 code passed to the biased provider.
    pub country_code: String,
    pub keywords: Vec<String>,
    /// Locality-unit markers (e.g. "sector").
    pub locality_keywords: Vec<String>,
    pub retry_suffixes: Vec<String>,
    /// A query ending with this (case-insensitive) already names the region.
    pub region_suffix: String,
}

impl Default for RegionProfile {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            country_code: "in".to_string(),
            keywords: words(&[
                "sector",
                "block",
                "phase",
                "colony",
                "nagar",
                "vihar",
                "delhi",
                "gurgaon",
                "gurugram",
                "faridabad",
                "noida",
                "ghaziabad",
                "haryana",
                "punjab",
                "uttar pradesh",
                "up",
                "india",
            ]),
            locality_keywords: words(&["sector", "block"]),
            retry_suffixes: words(&[", India", ", Kupwara, India"]),
            region_suffix: "india".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [providers.openweather]
/// api_key = "..."
///
/// [timeouts]
/// request_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: HashMap<String, ProviderConfig>,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
    pub user_agent: String,
    pub region: RegionProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
            user_agent: "globe-weather-app/1.0".to_string(),
            region: RegionProfile::default(),
        }
    }
}

/// Environment variable that overrides the stored OpenWeather key.
pub const OPENWEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk (empty default if it doesn't exist yet), then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Overlay credentials from the environment. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(OPENWEATHER_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key.trim().to_string());
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "globe-weather", "globe")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present and non-blank.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }
}
