use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    geocode::ForwardQuery,
    label::{AddressParts, compose_lean_parts, compose_parts, join_parts},
    model::{CodeScheme, Coordinates, GeocodeCandidate, PlaceName, WeatherCode, WeatherObservation},
    provider::{ProviderClient, ProviderId, Strategy, non_blank},
    timezone::ZoneLookup,
    weather::{WeatherQuery, WeatherReport},
};

/// Text for WMO present-weather codes. Anything outside the table is
/// "weather unavailable".
pub fn wmo_description(code: Option<i32>) -> &'static str {
    match code {
        Some(0) => "clear sky",
        Some(1) => "mainly clear",
        Some(2) => "partly cloudy",
        Some(3) => "overcast",
        Some(45) => "fog",
        Some(48) => "depositing rime fog",
        Some(51) => "light drizzle",
        Some(53) => "moderate drizzle",
        Some(55) => "dense drizzle",
        Some(56) => "light freezing drizzle",
        Some(57) => "dense freezing drizzle",
        Some(61) => "slight rain",
        Some(63) => "moderate rain",
        Some(65) => "heavy rain",
        Some(66) => "light freezing rain",
        Some(67) => "heavy freezing rain",
        Some(71) => "slight snow",
        Some(73) => "moderate snow",
        Some(75) => "heavy snow",
        Some(77) => "snow grains",
        Some(80) => "slight rain showers",
        Some(81) => "moderate rain showers",
        Some(82) => "violent rain showers",
        Some(85) => "slight snow showers",
        Some(86) => "heavy snow showers",
        Some(95) => "thunderstorm",
        Some(96) => "thunderstorm with slight hail",
        Some(99) => "thunderstorm with heavy hail",
        _ => "weather unavailable",
    }
}

/// Keyless current conditions. Supplies no place name.
#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    base_url: String,
    http: ProviderClient,
}

impl OpenMeteoWeather {
    pub fn new(base_url: &str, http: ProviderClient) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: OmCurrent,
    utc_offset_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    weather_code: Option<i32>,
    precipitation: Option<f64>,
}

impl OmForecastResponse {
    fn into_report(self) -> WeatherReport {
        let code = self.current.weather_code;
        WeatherReport {
            observation: WeatherObservation {
                description: wmo_description(code).to_string(),
                temp_c: self.current.temperature_2m,
                humidity: self.current.relative_humidity_2m,
                wind_speed: self.current.wind_speed_10m,
                weather_code: code.map(|value| WeatherCode { scheme: CodeScheme::Wmo, value }),
                precipitation_mm: self.current.precipitation,
                provider: ProviderId::OpenMeteo,
            },
            place: None,
            country_code: None,
            name: None,
            utc_offset_seconds: self.utc_offset_seconds,
        }
    }
}

#[async_trait]
impl Strategy<WeatherQuery, WeatherReport> for OpenMeteoWeather {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn attempt(&self, query: &WeatherQuery) -> Result<Option<WeatherReport>> {
        let url = format!("{}/v1/forecast", self.base_url);
        let resp: OmForecastResponse = self
            .http
            .get_json(
                ProviderId::OpenMeteo,
                &url,
                &[
                    ("latitude", query.coordinates.lat.to_string()),
                    ("longitude", query.coordinates.lon.to_string()),
                    (
                        "current",
                        "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code,precipitation"
                            .to_string(),
                    ),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        Ok(Some(resp.into_report()))
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    #[serde(default)]
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_code: Option<String>,
    country: Option<String>,
    admin1: Option<String>,
    admin2: Option<String>,
    admin3: Option<String>,
}

impl OmPlace {
    fn country_code(&self) -> Option<String> {
        non_blank(self.country_code.clone()).map(|c| c.to_uppercase())
    }

    fn into_candidate(self, query: &str, locality_keywords: &[String]) -> Option<GeocodeCandidate> {
        let coordinates = Coordinates::new(self.latitude?, self.longitude?).ok()?;
        let parts = AddressParts {
            place_name: self.name.clone(),
            city: self.admin3.clone().or_else(|| self.admin2.clone()),
            state: self.admin1.clone(),
            ..Default::default()
        };
        let components = compose_parts(&parts, Some(query), locality_keywords)
            .unwrap_or_else(|| vec![query.trim().to_string()]);

        Some(GeocodeCandidate {
            coordinates,
            place: PlaceName {
                raw_query: Some(query.to_string()),
                canonical_label: join_parts(&components),
                country_code: self.country_code(),
                country: non_blank(self.country),
                provider: ProviderId::OpenMeteo,
                components,
            },
            rank: 0,
        })
    }

    /// Name plus admin levels, at most three parts.
    fn into_lean_place(self) -> Option<PlaceName> {
        let components = compose_lean_parts(
            &[
                self.name.as_deref(),
                self.admin3.as_deref(),
                self.admin2.as_deref(),
                self.admin1.as_deref(),
            ],
            3,
        )?;
        Some(PlaceName {
            raw_query: None,
            canonical_label: join_parts(&components),
            country_code: self.country_code(),
            country: non_blank(self.country),
            provider: ProviderId::OpenMeteo,
            components,
        })
    }
}

/// Forward search. With a suffix it becomes one rung of the retry ladder:
/// the suffix is appended to the query text, and the rung is skipped when
/// the query already names the region.
#[derive(Debug, Clone)]
pub struct OpenMeteoSearch {
    base_url: String,
    http: ProviderClient,
    locality_keywords: Vec<String>,
    suffix: Option<String>,
    region_suffix: String,
}

impl OpenMeteoSearch {
    pub fn new(base_url: &str, http: ProviderClient, locality_keywords: Vec<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            locality_keywords,
            suffix: None,
            region_suffix: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: &str, region_suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self.region_suffix = region_suffix.trim().to_lowercase();
        self
    }

    fn search_text(&self, query: &ForwardQuery) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}", query.text.trim(), suffix),
            None => query.text.clone(),
        }
    }

    pub async fn search(&self, query: &ForwardQuery) -> Result<Vec<GeocodeCandidate>> {
        let url = format!("{}/v1/search", self.base_url);
        let resp: OmGeocodingResponse = self
            .http
            .get_json(
                ProviderId::OpenMeteo,
                &url,
                &[
                    ("name", self.search_text(query)),
                    ("count", query.limit.to_string()),
                    ("language", "en".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let candidates = resp
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|place| place.into_candidate(&query.text, &self.locality_keywords))
            .take(query.limit)
            .enumerate()
            .map(|(rank, mut candidate)| {
                candidate.rank = rank;
                candidate
            })
            .collect();

        Ok(candidates)
    }
}

#[async_trait]
impl Strategy<ForwardQuery, Vec<GeocodeCandidate>> for OpenMeteoSearch {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    fn name(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("open-meteo[+{:?}]", suffix),
            None => "open-meteo".to_string(),
        }
    }

    fn applies(&self, query: &ForwardQuery) -> bool {
        match &self.suffix {
            Some(_) => {
                let text = query.text.trim().to_lowercase();
                self.region_suffix.is_empty() || !text.ends_with(&self.region_suffix)
            }
            None => true,
        }
    }

    async fn attempt(&self, query: &ForwardQuery) -> Result<Option<Vec<GeocodeCandidate>>> {
        let candidates = self.search(query).await?;
        Ok((!candidates.is_empty()).then_some(candidates))
    }
}

/// Reverse lookup with the lean label.
#[derive(Debug, Clone)]
pub struct OpenMeteoReverse {
    base_url: String,
    http: ProviderClient,
}

impl OpenMeteoReverse {
    pub fn new(base_url: &str, http: ProviderClient) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

#[async_trait]
impl Strategy<Coordinates, PlaceName> for OpenMeteoReverse {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn attempt(&self, coordinates: &Coordinates) -> Result<Option<PlaceName>> {
        let url = format!("{}/v1/reverse", self.base_url);
        let resp: OmGeocodingResponse = self
            .http
            .get_json(
                ProviderId::OpenMeteo,
                &url,
                &[
                    ("latitude", coordinates.lat.to_string()),
                    ("longitude", coordinates.lon.to_string()),
                    ("language", "en".to_string()),
                    ("count", "1".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(resp
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(OmPlace::into_lean_place))
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoTimezone {
    base_url: String,
    http: ProviderClient,
}

impl OpenMeteoTimezone {
    pub fn new(base_url: &str, http: ProviderClient) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

#[derive(Debug, Deserialize)]
struct OmTimezoneResponse {
    timezone: Option<String>,
    utc_offset_seconds: Option<i32>,
}

#[async_trait]
impl Strategy<Coordinates, ZoneLookup> for OpenMeteoTimezone {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn attempt(&self, coordinates: &Coordinates) -> Result<Option<ZoneLookup>> {
        let url = format!("{}/v1/timezone", self.base_url);
        let resp: OmTimezoneResponse = self
            .http
            .get_json(
                ProviderId::OpenMeteo,
                &url,
                &[
                    ("latitude", coordinates.lat.to_string()),
                    ("longitude", coordinates.lon.to_string()),
                ],
            )
            .await?;

        let lookup = ZoneLookup {
            zone_name: non_blank(resp.timezone),
            utc_offset_seconds: resp.utc_offset_seconds,
        };
        Ok((lookup.zone_name.is_some() || lookup.utc_offset_seconds.is_some()).then_some(lookup))
    }
}
