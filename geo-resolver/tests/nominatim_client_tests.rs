//! Nominatim client tests against a mock HTTP server

use geo_common::config::GeocoderConfig;
use geo_resolver::services::{GeocodeProvider, NominatimClient, ResolutionMiss};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GeocoderConfig {
    GeocoderConfig {
        base_url: server.uri(),
        user_agent: "geo-resolver-tests/1.0".to_string(),
        timeout_secs: 2,
        ..GeocoderConfig::default()
    }
}

#[tokio::test]
async fn test_sends_query_parameters_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "10 Downing St, London"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("addressdetails", "1"))
        .and(header("user-agent", "geo-resolver-tests/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "51.5033635",
            "lon": "-0.1276248",
            "display_name": "10 Downing Street, London",
            "importance": 0.72,
            "address": {"road": "Downing Street", "city": "London", "country": "United Kingdom"}
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    let place = client.resolve("10 Downing St, London").await.unwrap();

    assert_eq!(place.lat, 51.5033635);
    assert_eq!(place.lng, -0.1276248);
    assert_eq!(place.display_name, "10 Downing Street, London");
    assert_eq!(place.metadata.importance, Some(0.72));
    assert_eq!(place.metadata.detail_field_count(), 3);
}

#[tokio::test]
async fn test_numeric_coordinates_and_missing_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"lat": 1.5, "lon": 2.5}])))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    let place = client.resolve("Somewhere").await.unwrap();

    assert_eq!(place.lat, 1.5);
    assert_eq!(place.lng, 2.5);
    assert_eq!(place.display_name, "");
    assert_eq!(place.metadata.importance, None);
    assert_eq!(place.metadata.detail_field_count(), 0);
}

#[tokio::test]
async fn test_empty_result_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.resolve("Atlantis").await.unwrap_err(), ResolutionMiss::NoResults);
}

#[tokio::test]
async fn test_server_error_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.resolve("Paris").await.unwrap_err(), ResolutionMiss::HttpStatus(500));
}

#[tokio::test]
async fn test_rate_limited_response_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.resolve("Paris").await.unwrap_err(), ResolutionMiss::HttpStatus(429));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    assert!(matches!(
        client.resolve("Paris").await.unwrap_err(),
        ResolutionMiss::Parse(_)
    ));
}

#[tokio::test]
async fn test_unparseable_coordinate_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"lat": "north", "lon": "2.35"}])),
        )
        .mount(&server)
        .await;

    let client = NominatimClient::new(&config_for(&server)).unwrap();
    assert!(matches!(
        client.resolve("Paris").await.unwrap_err(),
        ResolutionMiss::Parse(_)
    ));
}

#[tokio::test]
async fn test_slow_server_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = NominatimClient::new(&GeocoderConfig {
        timeout_secs: 1,
        ..config_for(&server)
    })
    .unwrap();
    assert_eq!(client.resolve("Paris").await.unwrap_err(), ResolutionMiss::Timeout);
}

#[test]
fn test_search_url_joins_base() {
    let client = NominatimClient::new(&GeocoderConfig {
        base_url: "http://localhost:8080/".to_string(),
        ..GeocoderConfig::default()
    })
    .unwrap();
    assert_eq!(client.search_url(), "http://localhost:8080/search");
}
