//! Display-label composition shared by forward and reverse geocoding.
//!
//! A label is built from structured address fields, most local first:
//! one "local" part (suburb > neighbourhood > quarter > residential >
//! place name), one settlement part (city > town > municipality), and the
//! state only while fewer than two parts were collected. The count is
//! taken before duplicates are dropped (first occurrence kept), so a place
//! whose name equals its city stays a single part. Joined with ", ".
//! Without structured fields the provider's raw display string is cut to
//! its first three comma-separated segments, four when the query names a
//! locality unit.

/// Structured address fields as reported by a geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub quarter: Option<String>,
    pub residential: Option<String>,
    pub place_name: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub display_name: Option<String>,
}

const LABEL_SEPARATOR: &str = ", ";
const DISPLAY_SEGMENTS: usize = 3;
const DISPLAY_SEGMENTS_LOCALITY: usize = 4;

fn first_present<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn push_unique(parts: &mut Vec<String>, value: &str) {
    if !parts.iter().any(|p| p == value) {
        parts.push(value.to_string());
    }
}

/// Name parts in descending specificity, or `None` when nothing usable exists.
pub fn compose_parts(
    address: &AddressParts,
    query: Option<&str>,
    locality_keywords: &[String],
) -> Option<Vec<String>> {
    let mut collected: Vec<&str> = Vec::new();

    collected.extend(first_present(&[
        &address.suburb,
        &address.neighbourhood,
        &address.quarter,
        &address.residential,
        &address.place_name,
    ]));
    collected.extend(first_present(&[&address.city, &address.town, &address.municipality]));

    if collected.len() < 2 {
        collected.extend(first_present(&[&address.state]));
    }

    if !collected.is_empty() {
        let mut parts = Vec::new();
        for part in collected {
            push_unique(&mut parts, part);
        }
        return Some(parts);
    }

    let display = first_present(&[&address.display_name])?;
    let keep = match query {
        Some(q) if mentions_keyword(q, locality_keywords) => DISPLAY_SEGMENTS_LOCALITY,
        _ => DISPLAY_SEGMENTS,
    };

    let mut segments = Vec::new();
    for segment in display.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        push_unique(&mut segments, segment);
        if segments.len() == keep {
            break;
        }
    }

    (!segments.is_empty()).then_some(segments)
}

pub fn compose_label(
    address: &AddressParts,
    query: Option<&str>,
    locality_keywords: &[String],
) -> Option<String> {
    compose_parts(address, query, locality_keywords).map(|p| p.join(LABEL_SEPARATOR))
}

/// Leaner composition for providers with only a name and admin levels:
/// present fields in the given order, deduplicated, at most `max` of them.
pub fn compose_lean_parts(fields: &[Option<&str>], max: usize) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    for field in fields.iter().flatten().map(|f| f.trim()).filter(|f| !f.is_empty()) {
        push_unique(&mut parts, field);
        if parts.len() == max {
            break;
        }
    }
    (!parts.is_empty()).then_some(parts)
}

pub fn join_parts(parts: &[String]) -> String {
    parts.join(LABEL_SEPARATOR)
}

/// Case-insensitive substring match against any keyword.
pub fn mentions_keyword(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && text.contains(&k))
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive whole-word match against any keyword. Multi-word
/// keywords ("uttar pradesh") must appear as consecutive words.
pub fn mentions_word(text: &str, keywords: &[String]) -> bool {
    let haystack = words(text);
    keywords.iter().map(|k| words(k)).any(|needle| {
        !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
    })
}
