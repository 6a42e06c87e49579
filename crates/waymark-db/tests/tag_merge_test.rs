//! Tag merge and delete semantics.
//!
//! Merging a source tag into a target must preserve the union of tagged
//! locations, never double-tag a location, remove the source tag, and
//! leave usage_count equal to the live association count.

use std::collections::HashSet;

use uuid::Uuid;
use waymark_core::{TagCategory, TagDeleteOutcome, TagRepository};
use waymark_db::test_fixtures::TestDatabase;

async fn tagged_locations(db: &TestDatabase, tag_id: Uuid) -> HashSet<Uuid> {
    sqlx::query_scalar::<_, Uuid>("SELECT location_id FROM location_tag WHERE tag_id = $1")
        .bind(tag_id)
        .fetch_all(&db.pool)
        .await
        .expect("Failed to list associations")
        .into_iter()
        .collect()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_merge_preserves_union_and_removes_source() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("merge@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Merge Trip").await;

    let a = test_db.seed_location(trip_id, user_id, "Place A").await;
    let b = test_db.seed_location(trip_id, user_id, "Place B").await;
    let c = test_db.seed_location(trip_id, user_id, "Place C").await;

    let source = test_db
        .db
        .tags
        .create("cozy", TagCategory::Ambience, false)
        .await
        .expect("create source");
    let target = test_db
        .db
        .tags
        .create("intimate", TagCategory::Ambience, false)
        .await
        .expect("create target");

    // source: A, B — target: B, C. B would double-tag if merge is naive.
    test_db
        .db
        .tags
        .attach_to_location(a, &[source.id])
        .await
        .expect("tag a");
    test_db
        .db
        .tags
        .attach_to_location(b, &[source.id, target.id])
        .await
        .expect("tag b");
    test_db
        .db
        .tags
        .attach_to_location(c, &[target.id])
        .await
        .expect("tag c");

    let union_before: HashSet<Uuid> = tagged_locations(&test_db, source.id)
        .await
        .union(&tagged_locations(&test_db, target.id).await)
        .copied()
        .collect();

    let result = test_db
        .db
        .tags
        .merge(source.id, target.id)
        .await
        .expect("merge");

    let after = tagged_locations(&test_db, target.id).await;
    assert_eq!(after, union_before, "union of tagged locations preserved");
    assert_eq!(after.len(), 3);

    // Source tag and its associations are gone.
    assert!(test_db.db.tags.get(source.id).await.is_err());
    assert!(tagged_locations(&test_db, source.id).await.is_empty());

    // usage_count matches the live association count.
    assert_eq!(result.target.usage_count, 3);
    assert_eq!(result.merged_count, 2);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_merge_with_self_is_rejected() {
    let test_db = TestDatabase::new().await;
    let tag = test_db
        .db
        .tags
        .create("solo", TagCategory::Feature, false)
        .await
        .expect("create");

    let err = test_db.db.tags.merge(tag.id, tag.id).await.unwrap_err();
    assert!(err.to_string().contains("merge a tag with itself"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_create_normalizes_and_rejects_duplicates() {
    let test_db = TestDatabase::new().await;

    let tag = test_db
        .db
        .tags
        .create("Rooftop Bar", TagCategory::PlaceType, false)
        .await
        .expect("create");
    assert_eq!(tag.name, "rooftop-bar");

    // Case-insensitive duplicate, normalized from different raw input.
    let err = test_db
        .db
        .tags
        .create("ROOFTOP   BAR", TagCategory::PlaceType, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_delete_soft_when_used_hard_when_free() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("delete@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Delete Trip").await;
    let location = test_db.seed_location(trip_id, user_id, "Somewhere").await;

    let used = test_db
        .db
        .tags
        .create("used-tag", TagCategory::Feature, false)
        .await
        .expect("create used");
    test_db
        .db
        .tags
        .attach_to_location(location, &[used.id])
        .await
        .expect("attach");

    let outcome = test_db.db.tags.delete(used.id).await.expect("delete used");
    assert_eq!(outcome, TagDeleteOutcome::SoftDeleted);
    let reloaded = test_db.db.tags.get(used.id).await.expect("still present");
    assert!(!reloaded.is_active);

    // Detach, then the inactive zero-usage tag hard-deletes.
    test_db
        .db
        .tags
        .set_for_location(location, &[])
        .await
        .expect("clear tags");
    let outcome = test_db.db.tags.delete(used.id).await.expect("delete free");
    assert_eq!(outcome, TagDeleteOutcome::HardDeleted);
    assert!(test_db.db.tags.get(used.id).await.is_err());

    test_db.cleanup().await;
}
