//! Location round-trip and search behavior.

use std::collections::HashSet;

use waymark_core::{
    CreateLocationRequest, LocationRepository, LocationSearchRequest, TagCategory, TagRepository,
    TagSuggestion,
};
use waymark_db::test_fixtures::TestDatabase;

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_create_then_fetch_preserves_name_and_tag_set() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("roundtrip@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Roundtrip").await;

    let location = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "Example Bistro".to_string(),
            latitude: 10.0,
            longitude: 20.0,
            address: Some("123 Main St".to_string()),
            ..Default::default()
        })
        .await
        .expect("insert");

    let suggestions = vec![
        TagSuggestion {
            name: "french".to_string(),
            category: TagCategory::Cuisine,
            existing: false,
        },
        TagSuggestion {
            name: "date-night".to_string(),
            category: TagCategory::Ambience,
            existing: false,
        },
    ];
    let tag_ids = test_db
        .db
        .tags
        .resolve_suggestions(&suggestions)
        .await
        .expect("resolve");
    test_db
        .db
        .tags
        .attach_to_location(location.id, &tag_ids)
        .await
        .expect("attach");

    let fetched = test_db
        .db
        .locations
        .fetch(location.id, user_id)
        .await
        .expect("fetch");

    assert_eq!(fetched.location.name, "Example Bistro");
    assert_eq!(fetched.location.latitude, 10.0);
    assert_eq!(fetched.location.longitude, 20.0);

    // Tag set comparison is order-independent.
    let names: HashSet<String> = fetched.tags.iter().map(|t| t.name.clone()).collect();
    let expected: HashSet<String> = ["french", "date-night"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, expected);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_order_index_appends_within_trip() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("order@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Ordering").await;

    let first = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "First".to_string(),
            latitude: 1.0,
            longitude: 1.0,
            ..Default::default()
        })
        .await
        .expect("insert first");
    let second = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "Second".to_string(),
            latitude: 2.0,
            longitude: 2.0,
            ..Default::default()
        })
        .await
        .expect("insert second");

    assert!(second.order_index > first.order_index);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_search_by_query_and_tag() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("search@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Search Trip").await;

    let bistro = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "Harbor Bistro".to_string(),
            latitude: 1.0,
            longitude: 1.0,
            ..Default::default()
        })
        .await
        .expect("insert bistro");
    let _museum = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "City Museum".to_string(),
            latitude: 2.0,
            longitude: 2.0,
            ..Default::default()
        })
        .await
        .expect("insert museum");

    let tag_ids = test_db
        .db
        .tags
        .resolve_suggestions(&[TagSuggestion {
            name: "seafood".to_string(),
            category: TagCategory::Cuisine,
            existing: false,
        }])
        .await
        .expect("resolve");
    test_db
        .db
        .tags
        .attach_to_location(bistro.id, &tag_ids)
        .await
        .expect("attach");

    let by_query = test_db
        .db
        .locations
        .search(LocationSearchRequest {
            user_id,
            query: Some("bistro".to_string()),
            ..Default::default()
        })
        .await
        .expect("search by query");
    assert_eq!(by_query.len(), 1);
    assert_eq!(by_query[0].location.name, "Harbor Bistro");

    let by_tag = test_db
        .db
        .locations
        .search(LocationSearchRequest {
            user_id,
            tag_names: vec!["seafood".to_string()],
            ..Default::default()
        })
        .await
        .expect("search by tag");
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].location.id, bistro.id);

    // A LIKE wildcard in the query is treated literally.
    let wildcard = test_db
        .db
        .locations
        .search(LocationSearchRequest {
            user_id,
            query: Some("%".to_string()),
            ..Default::default()
        })
        .await
        .expect("wildcard search");
    assert!(wildcard.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_delete_location_recomputes_usage_counts() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("usage@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Usage Trip").await;
    let location = test_db
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id,
            user_id,
            name: "Counted".to_string(),
            latitude: 1.0,
            longitude: 1.0,
            ..Default::default()
        })
        .await
        .expect("insert");

    let tag_ids = test_db
        .db
        .tags
        .resolve_suggestions(&[TagSuggestion {
            name: "fleeting".to_string(),
            category: TagCategory::Feature,
            existing: false,
        }])
        .await
        .expect("resolve");
    test_db
        .db
        .tags
        .attach_to_location(location.id, &tag_ids)
        .await
        .expect("attach");

    let tag = test_db.db.tags.get(tag_ids[0]).await.expect("get tag");
    assert_eq!(tag.usage_count, 1);

    test_db
        .db
        .locations
        .delete(location.id, user_id)
        .await
        .expect("delete");

    let tag = test_db.db.tags.get(tag_ids[0]).await.expect("get tag");
    assert_eq!(tag.usage_count, 0, "cascade delete keeps counts in line");

    test_db.cleanup().await;
}
