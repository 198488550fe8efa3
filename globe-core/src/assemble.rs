use crate::{
    model::{Coordinates, GeocodeCandidate, Provenance, ResolvedRecord},
    timezone::ResolvedTimezone,
    weather::WeatherReport,
};

/// Folds the independently resolved parts into one record, recording which
/// provider supplied each part. Missing values stay `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(
        &self,
        coordinates: Coordinates,
        geocoded: Option<&GeocodeCandidate>,
        weather: WeatherReport,
        timezone: ResolvedTimezone,
    ) -> ResolvedRecord {
        let name = weather
            .name
            .as_ref()
            .map(|choice| choice.selected.clone())
            .or_else(|| geocoded.map(|c| c.place.canonical_label.clone()));

        let country_code = weather
            .country_code
            .clone()
            .or_else(|| geocoded.and_then(|c| c.place.country_code.clone()));

        let provenance = Provenance {
            weather: weather.observation.provider,
            place: weather.place.as_ref().map(|p| p.provider),
            geocode: geocoded.map(|c| c.place.provider),
            timezone: timezone.source,
            name: weather.name,
        };

        ResolvedRecord {
            name,
            coordinates,
            country_code,
            weather: weather.observation,
            timezone: timezone.info,
            provenance,
        }
    }
}
