use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::{error::ResolveError, provider::ProviderId};

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ResolveError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ResolveError::InvalidInput(format!(
                "latitude must be within [-90, 90], got {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ResolveError::InvalidInput(format!(
                "longitude must be within [-180, 180], got {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Validate optional inputs, as they arrive from a request.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Result<Self, ResolveError> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Err(ResolveError::InvalidInput("lat and lon required".into())),
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lat={:.6}, lon={:.6}", self.lat, self.lon)
    }
}

/// Numbering scheme a weather code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeScheme {
    /// WMO 4677 present-weather codes (0-99), as used by Open-Meteo.
    Wmo,
    /// OpenWeather condition ids (200-804).
    OpenWeather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCode {
    pub scheme: CodeScheme,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub description: String,
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather_code: Option<WeatherCode>,
    /// Precipitation rate in mm/h, when the provider reports one.
    pub precipitation_mm: Option<f64>,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceName {
    pub raw_query: Option<String>,
    pub canonical_label: String,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub provider: ProviderId,
    /// Name parts, most specific first.
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub coordinates: Coordinates,
    pub place: PlaceName,
    pub rank: usize,
}

/// Timezone and local time at a location. All fields are `None` only when
/// every lookup tier failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    pub zone_name: Option<String>,
    pub utc_offset_seconds: Option<i32>,
    /// ISO-8601 timestamp with offset.
    pub local_time: Option<String>,
}

impl TimezoneInfo {
    pub fn is_empty(&self) -> bool {
        self.zone_name.is_none() && self.utc_offset_seconds.is_none() && self.local_time.is_none()
    }
}

/// Which timezone tier produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezoneSource {
    ZoneLookup,
    ProviderOffset,
    FallbackOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Query,
    Canonical,
}

/// Outcome of reconciling the user's query name with a provider name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChoice {
    pub selected: String,
    pub discarded: Option<String>,
    pub source: NameSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub weather: ProviderId,
    pub place: Option<ProviderId>,
    pub geocode: Option<ProviderId>,
    pub timezone: Option<TimezoneSource>,
    pub name: Option<NameChoice>,
}

/// Everything known about one location, assembled per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub name: Option<String>,
    pub coordinates: Coordinates,
    pub country_code: Option<String>,
    pub weather: WeatherObservation,
    pub timezone: TimezoneInfo,
    pub provenance: Provenance,
}

impl ResolvedRecord {
    /// Plain sentence handed to the speech collaborator.
    pub fn speech_text(&self) -> String {
        let mut text = match &self.name {
            Some(name) => format!("Weather in {name}: {}", self.weather.description),
            None => format!("Weather here: {}", self.weather.description),
        };

        if let Some(temp) = self.weather.temp_c {
            text.push_str(&format!(", {temp:.0} degrees Celsius"));
        }
        if let Some(humidity) = self.weather.humidity {
            text.push_str(&format!(", humidity {humidity:.0} percent"));
        }
        if let Some(wind) = self.weather.wind_speed {
            text.push_str(&format!(", wind {wind:.1}"));
        }
        text.push('.');

        let clock = self
            .timezone
            .local_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok());
        if let Some(local) = clock {
            text.push_str(&format!(" Local time is {}.", local.format("%H:%M")));
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResolvedRecord {
        ResolvedRecord {
            name: Some("Sector 14, Gurugram".into()),
            coordinates: Coordinates::new(28.47, 77.04).unwrap(),
            country_code: Some("IN".into()),
            weather: WeatherObservation {
                description: "haze".into(),
                temp_c: Some(31.4),
                humidity: Some(48.0),
                wind_speed: None,
                weather_code: Some(WeatherCode { scheme: CodeScheme::OpenWeather, value: 721 }),
                precipitation_mm: None,
                provider: ProviderId::OpenWeather,
            },
            timezone: TimezoneInfo {
                zone_name: Some("Asia/Kolkata".into()),
                utc_offset_seconds: Some(19800),
                local_time: Some("2024-03-01T18:45:10+05:30".into()),
            },
            provenance: Provenance {
                weather: ProviderId::OpenWeather,
                place: Some(ProviderId::OpenWeather),
                geocode: None,
                timezone: Some(TimezoneSource::ZoneLookup),
                name: None,
            },
        }
    }

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(matches!(Coordinates::new(90.1, 0.0), Err(ResolveError::InvalidInput(_))));
        assert!(matches!(Coordinates::new(0.0, -180.5), Err(ResolveError::InvalidInput(_))));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinates_from_parts_requires_both() {
        let err = Coordinates::from_parts(Some(10.0), None).unwrap_err();
        assert_eq!(err.to_string(), "lat and lon required");
        assert!(Coordinates::from_parts(Some(10.0), Some(20.0)).is_ok());
    }

    #[test]
    fn timezone_info_default_is_empty() {
        assert!(TimezoneInfo::default().is_empty());
        let info = TimezoneInfo { utc_offset_seconds: Some(0), ..Default::default() };
        assert!(!info.is_empty());
    }

    #[test]
    fn speech_text_mentions_name_weather_and_clock() {
        let text = record().speech_text();
        assert_eq!(
            text,
            "Weather in Sector 14, Gurugram: haze, 31 degrees Celsius, humidity 48 percent. \
             Local time is 18:45."
        );
    }

    #[test]
    fn speech_text_without_name_or_time() {
        let mut rec = record();
        rec.name = None;
        rec.timezone = TimezoneInfo::default();
        rec.weather.temp_c = None;
        rec.weather.humidity = None;

        assert_eq!(rec.speech_text(), "Weather here: haze.");
    }
}
