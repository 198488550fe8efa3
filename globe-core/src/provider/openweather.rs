use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    model::{CodeScheme, PlaceName, WeatherCode, WeatherObservation},
    provider::{ProviderClient, ProviderId, Strategy, non_blank},
    weather::{WeatherQuery, WeatherReport},
};

/// Current conditions from OpenWeather, looked up by coordinates.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: ProviderClient,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, http: ProviderClient) -> Self {
        Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http }
    }

    async fn fetch_current(&self, query: &WeatherQuery) -> Result<OwCurrentResponse> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        self.http
            .get_json(
                ProviderId::OpenWeather,
                &url,
                &[
                    ("lat", query.coordinates.lat.to_string()),
                    ("lon", query.coordinates.lon.to_string()),
                    ("appid", self.api_key.clone()),
                    ("units", "metric".to_string()),
                ],
            )
            .await
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: Option<i32>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    rain: OwRain,
    /// Shift in seconds from UTC.
    timezone: Option<i32>,
}

impl OwCurrentResponse {
    fn into_report(self, raw_query: Option<String>) -> Result<WeatherReport> {
        let first = self.weather.into_iter().next();
        let weather_code = first
            .as_ref()
            .and_then(|w| w.id)
            .map(|value| WeatherCode { scheme: CodeScheme::OpenWeather, value });
        let description = first
            .and_then(|w| non_blank(w.description))
            .ok_or_else(|| anyhow!("OpenWeather response contained no weather description"))?;

        let country_code = non_blank(self.sys.country).map(|c| c.to_uppercase());
        let place = non_blank(self.name).map(|name| PlaceName {
            raw_query,
            canonical_label: name.clone(),
            country_code: country_code.clone(),
            country: None,
            provider: ProviderId::OpenWeather,
            components: vec![name],
        });

        Ok(WeatherReport {
            observation: WeatherObservation {
                description,
                temp_c: self.main.temp,
                humidity: self.main.humidity,
                wind_speed: self.wind.speed,
                weather_code,
                precipitation_mm: self.rain.one_hour,
                provider: ProviderId::OpenWeather,
            },
            place,
            country_code,
            name: None,
            utc_offset_seconds: self.timezone,
        })
    }
}

#[async_trait]
impl Strategy<WeatherQuery, WeatherReport> for OpenWeatherProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn attempt(&self, query: &WeatherQuery) -> Result<Option<WeatherReport>> {
        let parsed = self.fetch_current(query).await?;
        parsed.into_report(query.search_name.clone()).map(Some)
    }
}
