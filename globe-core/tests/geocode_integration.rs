//! Integration tests for forward and reverse geocoding using wiremock.
//!
//! Every upstream base URL points at one mock server; unmatched requests
//! get wiremock's 404, which the chains treat as a failed tier.

use globe_core::{Config, Coordinates, GeocodeAnswer, Pipeline, ProviderId, ResolveError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.endpoints.openweather = server.uri();
    config.endpoints.open_meteo = server.uri();
    config.endpoints.open_meteo_geocoding = server.uri();
    config.endpoints.nominatim = server.uri();
    config.timeouts.request_secs = 2;
    config.timeouts.timezone_secs = 2;
    config
}

fn kupwara_result() -> serde_json::Value {
    serde_json::json!({
        "results": [{
            "name": "Kupwara",
            "latitude": 34.52,
            "longitude": 74.25,
            "country_code": "IN",
            "country": "India",
            "admin1": "Jammu and Kashmir",
            "admin2": "Kupwara"
        }]
    })
}

#[tokio::test]
async fn test_retry_ladder_reaches_district_suffix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Kupwara, Kupwara, India"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kupwara_result()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Kupwara, India"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let answer = pipeline.geocode("Kupwara", false).await.unwrap();

    let GeocodeAnswer::Best(best) = answer else {
        panic!("expected a single best candidate");
    };
    assert_eq!(best.rank, 0);
    assert_eq!(best.coordinates, Coordinates::new(34.52, 74.25).unwrap());
    assert_eq!(best.place.provider, ProviderId::OpenMeteo);
    assert_eq!(best.place.canonical_label, "Kupwara");
    assert_eq!(best.place.country_code.as_deref(), Some("IN"));
    assert_eq!(best.place.raw_query.as_deref(), Some("Kupwara"));
}

#[tokio::test]
async fn test_query_naming_region_skips_suffix_rungs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Kupwara, India, India"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kupwara_result()))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .with_priority(10)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("countrycodes", "in"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let err = pipeline.geocode("Kupwara, India", false).await.unwrap_err();

    assert!(matches!(err, ResolveError::NoResults(_)), "{err:?}");
}

#[tokio::test]
async fn test_region_query_prefers_biased_nominatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("countrycodes", "in"))
        .and(query_param("q", "Sector 14, Gurugram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "lat": "28.4690",
                "lon": "77.0410",
                "display_name": "Sector 14, Gurugram, Haryana, 122001, India",
                "address": {
                    "suburb": "Sector 14",
                    "city": "Gurugram",
                    "state": "Haryana",
                    "country": "India",
                    "country_code": "in"
                }
            },
            {
                "lat": "not-a-number",
                "lon": "77.0",
                "display_name": "Broken"
            },
            {
                "lon": "77.0",
                "display_name": "No latitude"
            },
            {
                "lat": "28.4700",
                "lon": "77.0500",
                "address": { "suburb": "Sector 14 Market", "city": "Gurugram" }
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let answer = pipeline.geocode("Sector 14, Gurugram", true).await.unwrap();

    let GeocodeAnswer::Suggestions { suggestions } = answer else {
        panic!("expected suggestions");
    };
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].rank, 0);
    assert_eq!(suggestions[0].place.canonical_label, "Sector 14, Gurugram");
    assert_eq!(suggestions[0].place.provider, ProviderId::Nominatim);
    assert_eq!(suggestions[1].rank, 1);
    assert_eq!(suggestions[1].place.canonical_label, "Sector 14 Market, Gurugram");
}

#[tokio::test]
async fn test_every_provider_down_is_service_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let err = pipeline.geocode("Paris", false).await.unwrap_err();

    assert!(matches!(err, ResolveError::ServiceUnavailable(_)), "{err:?}");
    assert_eq!(err.to_record().kind.as_str(), "service-unavailable-error");
}

#[tokio::test]
async fn test_blank_query_never_reaches_providers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let err = pipeline.geocode("   ", true).await.unwrap_err();

    assert!(matches!(err, ResolveError::InvalidInput(_)));
}

#[tokio::test]
async fn test_reverse_falls_back_to_open_meteo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "name": "Gurugram",
                "latitude": 28.4595,
                "longitude": 77.0266,
                "country_code": "IN",
                "country": "India",
                "admin2": "Gurgaon",
                "admin1": "Haryana"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let place = pipeline.reverse(Coordinates::new(28.4595, 77.0266).unwrap()).await.unwrap();

    assert_eq!(place.provider, ProviderId::OpenMeteo);
    assert_eq!(place.country_code.as_deref(), Some("IN"));
    assert_eq!(place.canonical_label, "Gurugram, Gurgaon, Haryana");
}

#[tokio::test]
async fn test_reverse_error_payload_is_a_failed_tier() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Unable to geocode"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(&config_for(&mock_server)).unwrap();
    let err = pipeline.reverse(Coordinates::new(0.0, -160.0).unwrap()).await.unwrap_err();

    assert!(matches!(err, ResolveError::NoResults(_)), "{err:?}");
}
