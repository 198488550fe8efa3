use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    config::Config,
    disambiguate::NameDisambiguator,
    error::{ResolveError, Result},
    geocode::GeocodeResolver,
    model::{Coordinates, NameChoice, PlaceName, WeatherObservation},
    provider::{
        Chain, Outcome, ProviderClient, ProviderId, openmeteo::OpenMeteoWeather,
        openweather::OpenWeatherProvider,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub coordinates: Coordinates,
    /// The user's original place text, if the coordinates came from a search.
    pub search_name: Option<String>,
}

impl WeatherQuery {
    pub fn new(coordinates: Coordinates, search_name: Option<String>) -> Self {
        Self { coordinates, search_name }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub observation: WeatherObservation,
    /// Place the weather provider named, or the reverse-geocoded one.
    pub place: Option<PlaceName>,
    pub country_code: Option<String>,
    /// Displayed name after reconciling with the search name.
    pub name: Option<NameChoice>,
    /// Provider-reported UTC offset, used as the last timezone tier.
    pub utc_offset_seconds: Option<i32>,
}

/// Current weather with provider fallback: OpenWeather when a key is
/// configured, Open-Meteo otherwise or on failure.
#[derive(Debug)]
pub struct WeatherResolver {
    chain: Chain<WeatherQuery, WeatherReport>,
    geocoder: Arc<GeocodeResolver>,
    disambiguator: NameDisambiguator,
}

impl WeatherResolver {
    pub fn new(config: &Config, http: &ProviderClient, geocoder: Arc<GeocodeResolver>) -> Self {
        let mut chain: Chain<WeatherQuery, WeatherReport> = Chain::new("weather");
        match config.provider_api_key(ProviderId::OpenWeather) {
            Some(key) => {
                chain = chain.then(OpenWeatherProvider::new(
                    key.to_string(),
                    &config.endpoints.openweather,
                    http.clone(),
                ));
            }
            None => debug!("no OpenWeather key configured, using Open-Meteo only"),
        }
        let chain = chain.then(OpenMeteoWeather::new(&config.endpoints.open_meteo, http.clone()));

        Self {
            chain,
            geocoder,
            disambiguator: NameDisambiguator::new(config.region.locality_keywords.clone()),
        }
    }

    pub fn tiers(&self) -> Vec<String> {
        self.chain.tier_names()
    }

    pub async fn resolve(&self, query: &WeatherQuery) -> Result<WeatherReport> {
        let mut report = match self.chain.run(query).await {
            Outcome::Found(report) => report,
            Outcome::Empty | Outcome::Failed => {
                return Err(ResolveError::ServiceUnavailable(
                    "Weather service unavailable at the moment.".into(),
                ));
            }
        };

        if report.place.is_none() {
            report.place = self.geocoder.reverse_place(query.coordinates).await;
        }
        if let Some(place) = &mut report.place {
            place.raw_query = query.search_name.clone();
            if report.country_code.is_none() {
                report.country_code = place.country_code.clone();
            }
        }

        let canonical = report.place.as_ref().map(|p| p.canonical_label.as_str());
        report.name = self.disambiguator.choose(query.search_name.as_deref(), canonical);

        info!(
            provider = %report.observation.provider,
            name = ?report.name.as_ref().map(|n| n.selected.as_str()),
            "weather resolved"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resolver(config: &Config) -> WeatherResolver {
        let http = ProviderClient::new("test", Duration::from_secs(1)).unwrap();
        let geocoder = Arc::new(GeocodeResolver::new(config, &http));
        WeatherResolver::new(config, &http, geocoder)
    }

    #[test]
    fn without_key_only_open_meteo_runs() {
        let r = resolver(&Config::default());
        assert_eq!(r.tiers(), vec!["open-meteo"]);
    }

    #[test]
    fn with_key_openweather_goes_first() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let r = resolver(&config);
        assert_eq!(r.tiers(), vec!["openweather", "open-meteo"]);
    }
}
