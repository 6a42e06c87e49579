//! Place search behavior against a mock HTTP server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use waymark_enrich::PlacesClient;

#[tokio::test]
async fn test_search_maps_first_result_into_enrichment() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "places": [{
            "id": "ChIJexample",
            "displayName": { "text": "Example Bistro" },
            "formattedAddress": "123 Main St, Springfield",
            "location": { "latitude": 10.0, "longitude": 20.0 },
            "types": ["restaurant", "food"],
            "rating": 4.5,
            "userRatingCount": 321,
            "websiteUri": "https://bistro.example",
            "internationalPhoneNumber": "+1 555-867-5309",
            "regularOpeningHours": { "weekdayDescriptions": ["Mon: 11-10", "Tue: 11-10"] },
            "priceLevel": "PRICE_LEVEL_MODERATE"
        }, {
            "id": "ignored-second-result"
        }]
    });

    Mock::given(method("POST"))
        .and(path("/places:searchText"))
        .and(header("X-Goog-Api-Key", "places-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = PlacesClient::new("places-key".to_string()).with_base_url(server.uri());
    let enrichment = client
        .search("Example Bistro", 10.0, 20.0)
        .await
        .unwrap()
        .expect("enrichment expected");

    assert_eq!(enrichment.place_id, "ChIJexample");
    assert_eq!(enrichment.rating, Some(4.5));
    assert_eq!(enrichment.review_count, Some(321));
    assert_eq!(enrichment.types, vec!["restaurant", "food"]);
    assert_eq!(enrichment.phone.as_deref(), Some("+1 555-867-5309"));
    assert_eq!(enrichment.formatted_address.as_deref(), Some("123 Main St, Springfield"));
    assert_eq!(enrichment.hours.as_deref(), Some("Mon: 11-10; Tue: 11-10"));
    assert_eq!(enrichment.price_range.as_deref(), Some("$$"));
}

#[tokio::test]
async fn test_empty_result_list_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = PlacesClient::new("places-key".to_string()).with_base_url(server.uri());
    let enrichment = client.search("Nowhere", 0.0, 0.0).await.unwrap();
    assert!(enrichment.is_none());
}

#[tokio::test]
async fn test_api_error_degrades_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("key not authorized"))
        .mount(&server)
        .await;

    let client = PlacesClient::new("places-key".to_string()).with_base_url(server.uri());
    let enrichment = client.search("Anywhere", 1.0, 1.0).await.unwrap();
    assert!(enrichment.is_none());
}
