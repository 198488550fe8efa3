use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{
    geocode::ForwardQuery,
    label::{AddressParts, compose_parts, join_parts},
    model::{Coordinates, GeocodeCandidate, PlaceName},
    provider::{ProviderClient, ProviderId, Strategy, non_blank},
};

/// OpenStreetMap Nominatim, optionally biased to one country.
#[derive(Debug, Clone)]
pub struct Nominatim {
    base_url: String,
    http: ProviderClient,
    country_bias: Option<String>,
    locality_keywords: Vec<String>,
}

impl Nominatim {
    pub fn new(base_url: &str, http: ProviderClient, locality_keywords: Vec<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            country_bias: None,
            locality_keywords,
        }
    }

    pub fn biased_to(mut self, country_code: &str) -> Self {
        self.country_bias = non_blank(Some(country_code.to_lowercase()));
        self
    }

    fn common_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "jsonv2".to_string()),
            ("accept-language", "en".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        if let Some(cc) = &self.country_bias {
            params.push(("countrycodes", cc.clone()));
        }
        params
    }

    pub async fn search(&self, query: &ForwardQuery) -> Result<Vec<GeocodeCandidate>> {
        let url = format!("{}/search", self.base_url);
        let mut params = self.common_params();
        params.push(("q", query.text.clone()));
        params.push(("limit", query.limit.to_string()));

        let places: Vec<NmPlace> = self.http.get_json(ProviderId::Nominatim, &url, &params).await?;

        let candidates = places
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

    pub async fn reverse(&self, coordinates: Coordinates) -> Result<Option<PlaceName>> {
        let url = format!("{}/reverse", self.base_url);
        let mut params = self.common_params();
        params.push(("lat", coordinates.lat.to_string()));
        params.push(("lon", coordinates.lon.to_string()));
        params.push(("zoom", "12".to_string()));

        let resp: NmReverse = self.http.get_json(ProviderId::Nominatim, &url, &params).await?;
        if let Some(error) = resp.error {
            return Err(anyhow!("Nominatim reverse lookup failed: {error}"));
        }

        let address = resp.address.unwrap_or_default();
        let parts = address.to_parts(resp.name, resp.display_name);
        let Some(components) = compose_parts(&parts, None, &self.locality_keywords) else {
            return Ok(None);
        };

        Ok(Some(PlaceName {
            raw_query: None,
            canonical_label: join_parts(&components),
            country_code: non_blank(address.country_code).map(|c| c.to_uppercase()),
            country: non_blank(address.country),
            provider: ProviderId::Nominatim,
            components,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NmAddress {
    suburb: Option<String>,
    neighbourhood: Option<String>,
    quarter: Option<String>,
    residential: Option<String>,
    city: Option<String>,
    town: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NmAddress {
    fn to_parts(&self, name: Option<String>, display_name: Option<String>) -> AddressParts {
        AddressParts {
            suburb: self.suburb.clone(),
            neighbourhood: self.neighbourhood.clone(),
            quarter: self.quarter.clone(),
            residential: self.residential.clone(),
            place_name: name,
            city: self.city.clone(),
            town: self.town.clone(),
            municipality: self.municipality.clone(),
            state: self.state.clone(),
            display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NmPlace {
    lat: Option<String>,
    lon: Option<String>,
    name: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    address: NmAddress,
}

impl NmPlace {
    fn into_candidate(self, query: &str, locality_keywords: &[String]) -> Option<GeocodeCandidate> {
        let lat = self.lat.as_deref().unwrap_or_default();
        let lon = self.lon.as_deref().unwrap_or_default();
        let coordinates = match (lat.trim().parse(), lon.trim().parse()) {
            (Ok(lat), Ok(lon)) => Coordinates::new(lat, lon).ok(),
            _ => None,
        };
        let Some(coordinates) = coordinates else {
            debug!(lat, lon, "skipping Nominatim result with bad coordinates");
            return None;
        };

        let parts = self.address.to_parts(self.name, self.display_name);
        let components = compose_parts(&parts, Some(query), locality_keywords)
            .unwrap_or_else(|| vec![query.trim().to_string()]);

        Some(GeocodeCandidate {
            coordinates,
            place: PlaceName {
                raw_query: Some(query.to_string()),
                canonical_label: join_parts(&components),
                country_code: non_blank(self.address.country_code).map(|c| c.to_uppercase()),
                country: non_blank(self.address.country),
                provider: ProviderId::Nominatim,
                components,
            },
            rank: 0,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    name: Option<String>,
    display_name: Option<String>,
    address: Option<NmAddress>,
    error: Option<String>,
}

/// Forward tier: text search.
#[async_trait]
impl Strategy<ForwardQuery, Vec<GeocodeCandidate>> for Nominatim {
    fn provider(&self) -> ProviderId {
        ProviderId::Nominatim
    }

    fn name(&self) -> String {
        match &self.country_bias {
            Some(cc) => format!("nominatim[{cc}]"),
            None => "nominatim".to_string(),
        }
    }

    async fn attempt(&self, query: &ForwardQuery) -> Result<Option<Vec<GeocodeCandidate>>> {
        let candidates = self.search(query).await?;
        Ok((!candidates.is_empty()).then_some(candidates))
    }
}

/// Reverse tier: coordinates to a labelled place.
#[async_trait]
impl Strategy<Coordinates, PlaceName> for Nominatim {
    fn provider(&self) -> ProviderId {
        ProviderId::Nominatim
    }

    fn name(&self) -> String {
        match &self.country_bias {
            Some(cc) => format!("nominatim[{cc}]"),
            None => "nominatim".to_string(),
        }
    }

    async fn attempt(&self, coordinates: &Coordinates) -> Result<Option<PlaceName>> {
        self.reverse(*coordinates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locality() -> Vec<String> {
        vec!["sector".into(), "block".into()]
    }

    #[test]
    fn search_result_builds_label_from_address() {
        let place: NmPlace = serde_json::from_str(
            r#"{
                "lat": "28.4690", "lon": "77.0410",
                "name": "Sector 14",
                "display_name": "Sector 14, Gurugram, Gurugram District, Haryana, 122001, India",
                "address": {
                    "suburb": "Sector 14", "city": "Gurugram", "state": "Haryana",
                    "country": "India", "country_code": "in"
                }
            }"#,
        )
        .unwrap();

        let candidate = place.into_candidate("sector 14 gurugram", &locality()).unwrap();

        assert_eq!(candidate.place.canonical_label, "Sector 14, Gurugram");
        assert_eq!(candidate.place.components, vec!["Sector 14", "Gurugram"]);
        assert_eq!(candidate.place.country_code.as_deref(), Some("IN"));
        assert_eq!(candidate.place.country.as_deref(), Some("India"));
        assert!((candidate.coordinates.lat - 28.469).abs() < 1e-9);
    }

    #[test]
    fn search_result_without_address_uses_display_name() {
        let place: NmPlace = serde_json::from_str(
            r#"{"lat": "34.52", "lon": "74.25",
                "display_name": "Kupwara, Kupwara District, Jammu and Kashmir, India"}"#,
        )
        .unwrap();

        let candidate = place.into_candidate("Kupwara", &locality()).unwrap();
        assert_eq!(candidate.place.canonical_label, "Kupwara, Kupwara District, Jammu and Kashmir");
        assert_eq!(candidate.place.country_code, None);
    }

    #[test]
    fn search_result_with_nothing_falls_back_to_query() {
        let place: NmPlace = serde_json::from_str(r#"{"lat": "1.0", "lon": "2.0"}"#).unwrap();
        let candidate = place.into_candidate(" Somewhere ", &locality()).unwrap();
        assert_eq!(candidate.place.canonical_label, "Somewhere");
    }

    #[test]
    fn bad_coordinates_are_skipped() {
        let place: NmPlace =
            serde_json::from_str(r#"{"lat": "north", "lon": "2.0", "name": "X"}"#).unwrap();
        assert!(place.into_candidate("x", &locality()).is_none());

        let place: NmPlace =
            serde_json::from_str(r#"{"lat": "95.0", "lon": "2.0", "name": "X"}"#).unwrap();
        assert!(place.into_candidate("x", &locality()).is_none());
    }

    #[test]
    fn result_missing_lat_does_not_sink_the_list() {
        let places: Vec<NmPlace> = serde_json::from_str(
            r#"[
                {"lon": "77.0", "name": "Ghost"},
                {"lat": "28.4690", "lon": "77.0410",
                 "address": {"suburb": "Sector 14", "city": "Gurugram"}}
            ]"#,
        )
        .unwrap();

        let candidates: Vec<_> = places
            .into_iter()
            .filter_map(|place| place.into_candidate("Sector 14", &locality()))
            .collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].place.canonical_label, "Sector 14, Gurugram");
    }

    #[test]
    fn bias_is_lowercased_and_blank_ignored() {
        let http = ProviderClient::new("test", std::time::Duration::from_secs(1)).unwrap();
        let n = Nominatim::new("http://localhost/", http.clone(), locality()).biased_to("IN");
        assert_eq!(n.country_bias.as_deref(), Some("in"));
        assert_eq!(n.base_url, "http://localhost");
        assert_eq!(Strategy::<Coordinates, PlaceName>::name(&n), "nominatim[in]");

        let n = Nominatim::new("http://localhost", http, locality()).biased_to(" ");
        assert_eq!(n.country_bias, None);
    }
}
