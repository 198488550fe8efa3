//! Weather categorisation for ambient-sound selection.
//!
//! Numeric codes from either scheme and free-text descriptions go through a
//! single ordered rule table. Code rules sit ahead of keyword rules, so a
//! code that resolves always wins and text is only consulted otherwise.

use serde::{Deserialize, Serialize};

use crate::model::{CodeScheme, WeatherCode, WeatherObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherClass {
    Storm,
    Rain,
    Snow,
    Fog,
    Sunny,
    Cloudy,
    Wind,
    Ambient,
}

impl WeatherClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherClass::Storm => "storm",
            WeatherClass::Rain => "rain",
            WeatherClass::Snow => "snow",
            WeatherClass::Fog => "fog",
            WeatherClass::Sunny => "sunny",
            WeatherClass::Cloudy => "cloudy",
            WeatherClass::Wind => "wind",
            WeatherClass::Ambient => "ambient",
        }
    }

    pub fn from_signal(signal: &WeatherSignal) -> Self {
        RULES
            .iter()
            .find(|rule| rule.predicate.matches(signal))
            .map(|rule| rule.class)
            .unwrap_or(WeatherClass::Ambient)
    }

    /// Heavy precipitation upgrades rain to storm; light precipitation
    /// upgrades an unclassified signal to rain.
    pub fn with_intensity(self, intensity: Option<f64>) -> Self {
        match (self, intensity) {
            (WeatherClass::Rain, Some(rate)) if rate > HEAVY_PRECIPITATION_MM => WeatherClass::Storm,
            (WeatherClass::Ambient, Some(rate)) if rate > LIGHT_PRECIPITATION_MM => WeatherClass::Rain,
            (class, _) => class,
        }
    }
}

impl std::fmt::Display for WeatherClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precipitation rates (mm/h) for [`WeatherClass::with_intensity`].
pub const HEAVY_PRECIPITATION_MM: f64 = 10.0;
pub const LIGHT_PRECIPITATION_MM: f64 = 2.0;

/// What is known about the weather: an optional code, optionally tagged with
/// its scheme, and an optional description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSignal {
    pub code: Option<i32>,
    pub scheme: Option<CodeScheme>,
    pub text: Option<String>,
}

impl WeatherSignal {
    /// A bare code, matched against every scheme.
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code), ..Default::default() }
    }

    pub fn from_weather_code(code: WeatherCode) -> Self {
        Self { code: Some(code.value), scheme: Some(code.scheme), text: None }
    }

    /// Text that is purely numeric is treated as a bare code.
    pub fn from_text(text: &str) -> Self {
        match text.trim().parse::<i32>() {
            Ok(code) => Self::from_code(code),
            Err(_) => Self { text: Some(text.to_string()), ..Default::default() },
        }
    }

    pub fn from_observation(observation: &WeatherObservation) -> Self {
        Self {
            code: observation.weather_code.map(|c| c.value),
            scheme: observation.weather_code.map(|c| c.scheme),
            text: Some(observation.description.clone()),
        }
    }
}

enum Predicate {
    Code { scheme: CodeScheme, from: i32, to: i32 },
    Keywords(&'static [&'static str]),
}

impl Predicate {
    fn matches(&self, signal: &WeatherSignal) -> bool {
        match self {
            Predicate::Code { scheme, from, to } => match signal.code {
                Some(code) => {
                    signal.scheme.is_none_or(|s| s == *scheme) && (*from..=*to).contains(&code)
                }
                None => false,
            },
            Predicate::Keywords(list) => match &signal.text {
                Some(text) => {
                    let text = text.to_lowercase();
                    list.iter().any(|w| text.contains(w))
                }
                None => false,
            },
        }
    }
}

struct Rule {
    predicate: Predicate,
    class: WeatherClass,
}

const fn ow(from: i32, to: i32, class: WeatherClass) -> Rule {
    Rule { predicate: Predicate::Code { scheme: CodeScheme::OpenWeather, from, to }, class }
}

const fn wmo(from: i32, to: i32, class: WeatherClass) -> Rule {
    Rule { predicate: Predicate::Code { scheme: CodeScheme::Wmo, from, to }, class }
}

const fn words(list: &'static [&'static str], class: WeatherClass) -> Rule {
    Rule { predicate: Predicate::Keywords(list), class }
}

use WeatherClass::*;

static RULES: &[Rule] = &[
    ow(200, 232, Storm),
    wmo(95, 99, Storm),
    ow(300, 321, Rain),
    wmo(51, 57, Rain),
    ow(500, 531, Rain),
    wmo(61, 67, Rain),
    wmo(80, 82, Rain),
    ow(600, 622, Snow),
    wmo(71, 77, Snow),
    wmo(85, 86, Snow),
    ow(701, 762, Fog),
    wmo(45, 45, Fog),
    wmo(48, 48, Fog),
    wmo(0, 0, Sunny),
    ow(800, 800, Sunny),
    ow(801, 804, Cloudy),
    wmo(1, 3, Cloudy),
    words(&["storm", "thunder", "tornado", "hail"], Storm),
    words(&["rain", "drizzle", "shower", "precipitation"], Rain),
    words(&["snow", "sleet", "blizzard"], Snow),
    words(&["fog", "mist", "haze", "smoke", "dust"], Fog),
    words(&["wind", "breezy", "gust"], Wind),
    words(&["clear", "sunny"], Sunny),
    words(&["cloud", "overcast", "broken", "scattered"], Cloudy),
];
