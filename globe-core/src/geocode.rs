//! Forward and reverse geocoding across Nominatim and Open-Meteo.
//!
//! Forward flow, region-specific query:
//!   Nominatim (biased) → Open-Meteo → Open-Meteo + suffix₁ → Open-Meteo + suffix₂
//! Forward flow, anything else:
//!   Open-Meteo → Nominatim (unbiased) → Open-Meteo + suffix₁ → Open-Meteo + suffix₂
//! Reverse flow:
//!   Nominatim (biased) → Open-Meteo reverse

use serde::Serialize;
use tracing::info;

use crate::{
    config::{Config, RegionProfile},
    error::{ResolveError, Result},
    label::mentions_word,
    model::{Coordinates, GeocodeCandidate, PlaceName},
    provider::{
        Chain, Outcome, ProviderClient,
        nominatim::Nominatim,
        openmeteo::{OpenMeteoReverse, OpenMeteoSearch},
    },
};

/// Upper bound on autocomplete suggestions.
pub const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardQuery {
    pub text: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeocodeAnswer {
    Best(GeocodeCandidate),
    Suggestions { suggestions: Vec<GeocodeCandidate> },
}

type ForwardChain = Chain<ForwardQuery, Vec<GeocodeCandidate>>;

#[derive(Debug)]
pub struct GeocodeResolver {
    region: RegionProfile,
    region_chain: ForwardChain,
    general_chain: ForwardChain,
    reverse_chain: Chain<Coordinates, PlaceName>,
}

impl GeocodeResolver {
    pub fn new(config: &Config, http: &ProviderClient) -> Self {
        let region = config.region.clone();
        let endpoints = &config.endpoints;
        let locality = region.locality_keywords.clone();

        let nominatim = Nominatim::new(&endpoints.nominatim, http.clone(), locality.clone());
        let biased = nominatim.clone().biased_to(&region.country_code);
        let open_meteo =
            OpenMeteoSearch::new(&endpoints.open_meteo_geocoding, http.clone(), locality.clone());

        let with_ladder = |mut chain: ForwardChain| {
            for suffix in &region.retry_suffixes {
                chain = chain.then(open_meteo.clone().with_suffix(suffix, &region.region_suffix));
            }
            chain
        };

        let region_chain = with_ladder(
            ForwardChain::new("geocode")
                .then(biased.clone())
                .then(open_meteo.clone()),
        );
        let general_chain = with_ladder(
            ForwardChain::new("geocode")
                .then(open_meteo.clone())
                .then(nominatim),
        );

        let reverse_chain = Chain::<Coordinates, PlaceName>::new("reverse-geocode")
            .then(biased)
            .then(OpenMeteoReverse::new(&endpoints.open_meteo_geocoding, http.clone()));

        Self { region, region_chain, general_chain, reverse_chain }
    }

    /// Whether the query mentions any of the region's locality or
    /// administrative terms.
    pub fn is_region_specific(&self, text: &str) -> bool {
        mentions_word(text, &self.region.keywords)
    }

    fn chain_for(&self, text: &str) -> &ForwardChain {
        if self.is_region_specific(text) { &self.region_chain } else { &self.general_chain }
    }

    pub fn forward_tiers(&self, text: &str) -> Vec<String> {
        self.chain_for(text).tier_names()
    }

    async fn forward_candidates(&self, text: &str, limit: usize) -> Result<Vec<GeocodeCandidate>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResolveError::InvalidInput("Missing query text".into()));
        }

        let query = ForwardQuery { text: text.to_string(), limit };
        match self.chain_for(text).run(&query).await {
            Outcome::Found(candidates) => Ok(candidates),
            Outcome::Empty => Err(ResolveError::NoResults("No results".into())),
            Outcome::Failed => Err(ResolveError::ServiceUnavailable("Geocoding failed".into())),
        }
    }

    /// Single best candidate (rank 0).
    pub async fn best(&self, text: &str) -> Result<GeocodeCandidate> {
        let candidates = self.forward_candidates(text, MAX_SUGGESTIONS).await?;
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoResults("No results".into()))
    }

    /// Up to [`MAX_SUGGESTIONS`] ranked candidates.
    pub async fn suggestions(&self, text: &str) -> Result<Vec<GeocodeCandidate>> {
        self.forward_candidates(text, MAX_SUGGESTIONS).await
    }

    pub async fn forward(&self, text: &str, autocomplete: bool) -> Result<GeocodeAnswer> {
        if autocomplete {
            let suggestions = self.suggestions(text).await?;
            Ok(GeocodeAnswer::Suggestions { suggestions })
        } else {
            self.best(text).await.map(GeocodeAnswer::Best)
        }
    }

    pub async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceName> {
        match self.reverse_chain.run(&coordinates).await {
            Outcome::Found(place) => {
                info!(label = %place.canonical_label, provider = %place.provider, "reverse geocoded");
                Ok(place)
            }
            Outcome::Empty => Err(ResolveError::NoResults(format!("No place found at {coordinates}"))),
            Outcome::Failed => {
                Err(ResolveError::ServiceUnavailable("Reverse geocoding failed".into()))
            }
        }
    }

    /// Reverse lookup that degrades to `None`.
    pub async fn reverse_place(&self, coordinates: Coordinates) -> Option<PlaceName> {
        self.reverse_chain.run(&coordinates).await.found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resolver() -> GeocodeResolver {
        let config = Config::default();
        let http = ProviderClient::new("test", Duration::from_secs(1)).unwrap();
        GeocodeResolver::new(&config, &http)
    }

    #[test]
    fn region_classification_uses_whole_words() {
        let r = resolver();
        assert!(r.is_region_specific("Sector 14, Gurugram"));
        assert!(r.is_region_specific("Lajpat Nagar"));
        assert!(r.is_region_specific("Agra, Uttar Pradesh"));
        assert!(!r.is_region_specific("Kupwara"));
        assert!(!r.is_region_specific("Paris"));
    }

    #[test]
    fn chains_are_ordered_per_classification() {
        let r = resolver();
        assert_eq!(
            r.forward_tiers("Sector 14"),
            vec![
                "nominatim[in]",
                "open-meteo",
                "open-meteo[+\", India\"]",
                "open-meteo[+\", Kupwara, India\"]",
            ]
        );
        assert_eq!(
            r.forward_tiers("Kupwara"),
            vec![
                "open-meteo",
                "nominatim",
                "open-meteo[+\", India\"]",
                "open-meteo[+\", Kupwara, India\"]",
            ]
        );
    }

    #[tokio::test]
    async fn blank_query_is_input_error() {
        let err = resolver().best("   ").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput(_)));
    }
}
