use crate::{
    label::mentions_keyword,
    model::{NameChoice, NameSource},
};

/// Picks between the user's query text and a provider's canonical name.
///
/// The query wins when it names a locality unit, contains a comma, or has
/// more whitespace-separated tokens than the canonical name. This is a
/// surface heuristic and intentionally nothing more.
#[derive(Debug, Clone)]
pub struct NameDisambiguator {
    locality_keywords: Vec<String>,
}

impl NameDisambiguator {
    pub fn new(locality_keywords: Vec<String>) -> Self {
        Self { locality_keywords }
    }

    pub fn choose(&self, query: Option<&str>, canonical: Option<&str>) -> Option<NameChoice> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let canonical = canonical.map(str::trim).filter(|c| !c.is_empty());

        match (query, canonical) {
            (None, None) => None,
            (Some(q), None) => Some(NameChoice {
                selected: q.to_string(),
                discarded: None,
                source: NameSource::Query,
            }),
            (None, Some(c)) => Some(NameChoice {
                selected: c.to_string(),
                discarded: None,
                source: NameSource::Canonical,
            }),
            (Some(q), Some(c)) if self.query_is_more_specific(q, c) => Some(NameChoice {
                selected: q.to_string(),
                discarded: Some(c.to_string()),
                source: NameSource::Query,
            }),
            (Some(q), Some(c)) => Some(NameChoice {
                selected: c.to_string(),
                discarded: Some(q.to_string()),
                source: NameSource::Canonical,
            }),
        }
    }

    fn query_is_more_specific(&self, query: &str, canonical: &str) -> bool {
        mentions_keyword(query, &self.locality_keywords)
            || query.contains(',')
            || query.split_whitespace().count() > canonical.split_whitespace().count()
    }
}
