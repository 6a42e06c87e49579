//! End-to-end save pipeline behavior with stubbed external services.
//!
//! The generative backend is canned, the fetched page and places API are
//! served by a local mock server; only PostgreSQL is real (tests are
//! gated on DATABASE_URL like the rest of the db-backed suite).

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use waymark_api::services::{run_save, PipelineDeps, SaveInput, StageOutcome};
use waymark_core::{UsageRepository, UsagePeriod, UserRepository};
use waymark_db::test_fixtures::TestDatabase;
use waymark_enrich::{ContentFetcher, PlacesClient};
use waymark_inference::mock::MockBackend;

const GEOCODE_REPLY: &str = r#"{
    "location_name": "Example Bistro",
    "address": "123 Main St",
    "coordinates": { "lat": 10.0, "lng": 20.0 },
    "confidence": "high",
    "reasoning": "address present on the page"
}"#;

async fn mock_page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/restaurant"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Example Bistro</title></head>
               <body><div class="address">123 Main St, Springfield Plaza</div></body></html>"#,
        ))
        .mount(&server)
        .await;
    server
}

async fn mock_places_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/places:searchText"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "places": [{
                "id": "ChIJexample",
                "rating": 4.5,
                "userRatingCount": 100,
                "formattedAddress": "123 Main St, Springfield"
            }]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_url_save_resolves_coordinates_and_enrichment() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("pipeline@example.com", false).await;
    let user = test_db.db.users.get(user_id).await.unwrap();
    let trip_id = test_db.seed_trip(user_id, "Pipeline Trip").await;

    let page_server = mock_page_server().await;
    let places_server = mock_places_server().await;

    let deps = PipelineDeps {
        generation: Some(Arc::new(MockBackend::replying(GEOCODE_REPLY))),
        transcription: None,
        places: Some(
            PlacesClient::new("places-key".to_string()).with_base_url(places_server.uri()),
        ),
    };

    let outcome = run_save(
        &test_db.db,
        &ContentFetcher::new(),
        &deps,
        &user,
        SaveInput {
            trip_id,
            name: "Example Bistro".to_string(),
            source_url: Some(format!("{}/restaurant", page_server.uri())),
            audio: None,
        },
    )
    .await
    .expect("pipeline run");

    let location = &outcome.location.location;
    assert_eq!(location.name, "Example Bistro");
    assert_eq!(location.latitude, 10.0);
    assert_eq!(location.longitude, 20.0);
    assert_eq!(location.place_rating, Some(4.5));
    assert_eq!(location.url_title.as_deref(), Some("Example Bistro"));

    let applied: Vec<&str> = outcome
        .stages
        .iter()
        .filter(|s| s.outcome == StageOutcome::Applied)
        .map(|s| s.stage)
        .collect();
    assert!(applied.contains(&"fetch_content"));
    assert!(applied.contains(&"geocode"));
    assert!(applied.contains(&"enrich"));

    // Geocode, tags, and the places search each reported to the ledger.
    let summary = test_db
        .db
        .usage
        .summary(UsagePeriod::Day, None, Some(user_id))
        .await
        .unwrap();
    let total_calls: i64 = summary.by_service.iter().map(|s| s.count).sum();
    assert!(total_calls >= 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_save_persists_even_when_everything_degrades() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("degraded@example.com", false).await;
    let user = test_db.db.users.get(user_id).await.unwrap();
    let trip_id = test_db.seed_trip(user_id, "Degraded Trip").await;

    // No credentials configured, unreachable page, audio present.
    let deps = PipelineDeps {
        generation: None,
        transcription: None,
        places: None,
    };

    let outcome = run_save(
        &test_db.db,
        &ContentFetcher::new(),
        &deps,
        &user,
        SaveInput {
            trip_id,
            name: "Mystery Spot".to_string(),
            source_url: Some("http://192.0.2.1:9/unreachable".to_string()),
            audio: Some((vec![0u8; 32_000], "audio/webm".to_string())),
        },
    )
    .await
    .expect("pipeline must still persist");

    let location = &outcome.location.location;
    assert_eq!(location.name, "Mystery Spot");
    assert_eq!(location.latitude, 0.0);
    assert_eq!(location.longitude, 0.0);
    assert!(outcome.location.tags.is_empty());

    // Every generative stage failed; enrichment skipped on unresolved
    // coordinates.
    let failed: Vec<&str> = outcome
        .stages
        .iter()
        .filter(|s| matches!(s.outcome, StageOutcome::Failed(_)))
        .map(|s| s.stage)
        .collect();
    assert!(failed.contains(&"transcribe"));
    assert!(failed.contains(&"geocode"));
    assert!(failed.contains(&"extract_tags"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_geocode_failure_skips_enrichment() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("skipped@example.com", false).await;
    let user = test_db.db.users.get(user_id).await.unwrap();
    let trip_id = test_db.seed_trip(user_id, "Skip Trip").await;

    let places_server = mock_places_server().await;

    // Model replies with prose; geocoding degrades to null coordinates,
    // so the places stage must never fire.
    let deps = PipelineDeps {
        generation: Some(Arc::new(MockBackend::replying("no json in sight"))),
        transcription: None,
        places: Some(
            PlacesClient::new("places-key".to_string()).with_base_url(places_server.uri()),
        ),
    };

    let outcome = run_save(
        &test_db.db,
        &ContentFetcher::new(),
        &deps,
        &user,
        SaveInput {
            trip_id,
            name: "Vague Place".to_string(),
            source_url: None,
            audio: None,
        },
    )
    .await
    .expect("pipeline run");

    let enrich = outcome
        .stages
        .iter()
        .find(|s| s.stage == "enrich")
        .expect("enrich stage reported");
    assert!(matches!(enrich.outcome, StageOutcome::Skipped(_)));
    assert_eq!(outcome.location.location.latitude, 0.0);

    test_db.cleanup().await;
}
