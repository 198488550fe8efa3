use anyhow::Result as AnyResult;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    assemble::ResponseAssembler,
    config::Config,
    error::Result,
    geocode::{GeocodeAnswer, GeocodeResolver},
    model::{Coordinates, GeocodeCandidate, PlaceName, ResolvedRecord},
    provider::ProviderClient,
    timezone::{self, TimezoneResolver},
    weather::{WeatherQuery, WeatherReport, WeatherResolver},
};

/// Everything wired from one [`Config`]: a shared HTTP client and the
/// geocoding, weather and timezone resolvers.
#[derive(Debug)]
pub struct Pipeline {
    geocoder: Arc<GeocodeResolver>,
    weather: WeatherResolver,
    timezone: TimezoneResolver,
    assembler: ResponseAssembler,
}

impl Pipeline {
    pub fn new(config: &Config) -> AnyResult<Self> {
        let http = ProviderClient::new(&config.user_agent, config.timeouts.request())?;
        let geocoder = Arc::new(GeocodeResolver::new(config, &http));
        let weather = WeatherResolver::new(config, &http, Arc::clone(&geocoder));
        let timezone = TimezoneResolver::new(config, &http);

        debug!(weather = ?weather.tiers(), "pipeline ready");
        Ok(Self { geocoder, weather, timezone, assembler: ResponseAssembler })
    }

    pub async fn geocode(&self, text: &str, autocomplete: bool) -> Result<GeocodeAnswer> {
        self.geocoder.forward(text, autocomplete).await
    }

    pub async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceName> {
        self.geocoder.reverse(coordinates).await
    }

    pub async fn weather(&self, query: &WeatherQuery) -> Result<WeatherReport> {
        self.weather.resolve(query).await
    }

    /// Place text in, full record out.
    pub async fn resolve_query(&self, text: &str) -> Result<ResolvedRecord> {
        let candidate = self.geocoder.best(text).await?;
        info!(label = %candidate.place.canonical_label, provider = %candidate.place.provider, "query geocoded");
        self.assemble(candidate.coordinates, Some(&candidate), Some(text.trim().to_string()))
            .await
    }

    /// Coordinates in, full record out. `search_name` is the place text the
    /// user typed, if any.
    pub async fn resolve_coordinates(
        &self,
        coordinates: Coordinates,
        search_name: Option<String>,
    ) -> Result<ResolvedRecord> {
        self.assemble(coordinates, None, search_name).await
    }

    async fn assemble(
        &self,
        coordinates: Coordinates,
        geocoded: Option<&GeocodeCandidate>,
        search_name: Option<String>,
    ) -> Result<ResolvedRecord> {
        let query = WeatherQuery::new(coordinates, search_name);
        let (report, lookup) =
            tokio::join!(self.weather.resolve(&query), self.timezone.lookup(coordinates));
        let report = report?;

        let tz = timezone::settle(lookup.as_ref(), report.utc_offset_seconds, Utc::now());
        Ok(self.assembler.assemble(coordinates, geocoded, report, tz))
    }
}
