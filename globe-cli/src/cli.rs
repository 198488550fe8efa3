use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use globe_core::{
    Config, Coordinates, Pipeline, ProviderId, WeatherClass, WeatherQuery, WeatherSignal,
    contract::{AmbientSelector, LibraryAmbientSelector, PlaybackDirective, SpeechSink, announce},
    error::Result as ResolveResult,
};
use serde::Serialize;
use std::process::ExitCode;
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "globe", version, about = "Place search, weather and local time")]
pub struct Cli {
    /// Debug-level logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather".
        provider: String,
    },

    /// Find coordinates for a place name.
    Geocode {
        query: String,

        /// Return up to eight ranked suggestions instead of the best match.
        #[arg(long)]
        autocomplete: bool,
    },

    /// Find the place name for coordinates.
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Current weather at coordinates.
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Place text the coordinates came from, used to pick the displayed name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Geocode, fetch weather and local time, and print the full record.
    Resolve {
        query: String,

        /// Print the spoken summary instead of JSON.
        #[arg(long)]
        speech: bool,
    },

    /// Classify a weather code or description and pick an ambient sound.
    Classify {
        /// Numeric code (WMO or OpenWeather) or free text.
        weather: String,

        /// Precipitation rate in mm/h.
        #[arg(long)]
        intensity: Option<f64>,
    },
}

#[derive(Serialize)]
struct Classification {
    class: WeatherClass,
    playback: PlaybackDirective,
}

/// Speech stand-in: writes the sentence to stdout.
struct StdoutSpeech;

#[async_trait]
impl SpeechSink for StdoutSpeech {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Geocode { query, autocomplete } => {
                let pipeline = pipeline()?;
                emit(pipeline.geocode(&query, autocomplete).await)
            }
            Command::Reverse { lat, lon } => match Coordinates::from_parts(lat, lon) {
                Ok(coords) => emit(pipeline()?.reverse(coords).await),
                Err(e) => emit::<()>(Err(e)),
            },
            Command::Weather { lat, lon, name } => match Coordinates::from_parts(lat, lon) {
                Ok(coords) => emit(pipeline()?.weather(&WeatherQuery::new(coords, name)).await),
                Err(e) => emit::<()>(Err(e)),
            },
            Command::Resolve { query, speech } => {
                let pipeline = pipeline()?;
                let record = pipeline.resolve_query(&query).await;
                match record {
                    Ok(record) if speech => {
                        announce(&record, &StdoutSpeech).await?;
                        Ok(ExitCode::SUCCESS)
                    }
                    other => emit(other),
                }
            }
            Command::Classify { weather, intensity } => {
                let class = WeatherClass::from_signal(&WeatherSignal::from_text(&weather));
                let playback = LibraryAmbientSelector::default().select(class, intensity);
                emit(Ok(Classification { class, playback }))
            }
        }
    }
}

fn pipeline() -> Result<Pipeline> {
    let config = Config::load()?;
    Pipeline::new(&config)
}

/// Print a success value as JSON, or the error record with a failing exit code.
fn emit<T: Serialize>(result: ResolveResult<T>) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_record())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn configure(provider: &str) -> Result<ExitCode> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_api_key() {
        bail!("{id} needs no credentials");
    }

    let api_key = inquire::Password::new(&format!("{id} API key:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let mut config = Config::load()?;
    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    let path = Config::config_file_path()?;
    debug!(path = %path.display(), "config written");
    println!("Saved {id} credentials to {}", path.display());
    Ok(ExitCode::SUCCESS)
}
