//! Core library for the `globe` CLI.
//!
//! This crate defines:
//! - Configuration, credentials and the regional search profile
//! - Provider clients (OpenWeather, Open-Meteo, Nominatim) and the
//!   fallback chains that try them in order
//! - Geocoding, weather, timezone and naming resolvers
//! - Weather classification and the speech / ambient-playback contracts
//!
//! It is used by `globe-cli`, but [`Pipeline`] can be embedded anywhere
//! that has a tokio runtime.

pub mod assemble;
pub mod classify;
pub mod config;
pub mod contract;
pub mod disambiguate;
pub mod error;
pub mod geocode;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod timezone;
pub mod weather;

pub use classify::{WeatherClass, WeatherSignal};
pub use config::{Config, ProviderConfig, RegionProfile};
pub use error::{ErrorKind, ErrorRecord, ResolveError};
pub use geocode::{GeocodeAnswer, GeocodeResolver};
pub use model::{Coordinates, GeocodeCandidate, PlaceName, ResolvedRecord, WeatherObservation};
pub use pipeline::Pipeline;
pub use provider::ProviderId;
pub use weather::{WeatherQuery, WeatherReport};
