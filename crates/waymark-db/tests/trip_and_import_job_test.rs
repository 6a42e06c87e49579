//! Trip repository and import-job counter behavior.

use waymark_core::{
    CreateTripRequest, Error, ImportJobRepository, ImportStatus, TripRepository,
    UpdateTripRequest,
};
use waymark_db::test_fixtures::TestDatabase;

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_create_trip_generates_share_token_and_lists_with_counts() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("trips@example.com", false).await;

    let trip = test_db
        .db
        .trips
        .create(
            user_id,
            CreateTripRequest {
                title: "Kyoto in May".to_string(),
                description: Some("Temples and kaiseki".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("create trip");

    assert_eq!(trip.share_token.len(), 16);
    assert_eq!(trip.title, "Kyoto in May");

    test_db.seed_location(trip.id, user_id, "Kinkaku-ji").await;
    test_db.seed_location(trip.id, user_id, "Nishiki Market").await;

    let summaries = test_db.db.trips.list(user_id).await.expect("list");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].location_count, 2);
    assert_eq!(summaries[0].preview_locations.len(), 2);

    // The share token resolves without an owner check.
    let shared = test_db
        .db
        .trips
        .get_by_share_token(&trip.share_token)
        .await
        .expect("share lookup");
    assert_eq!(shared.id, trip.id);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_trip_access_is_owner_scoped() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.seed_user("owner@example.com", false).await;
    let stranger = test_db.seed_user("stranger@example.com", false).await;
    let trip_id = test_db.seed_trip(owner, "Private Trip").await;

    let err = test_db.db.trips.get(trip_id, stranger).await.unwrap_err();
    assert!(matches!(err, Error::TripNotFound(_)));

    let err = test_db
        .db
        .trips
        .update(
            trip_id,
            stranger,
            UpdateTripRequest {
                title: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TripNotFound(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with a reachable PostgreSQL
async fn test_import_job_counters_and_finalize() {
    let test_db = TestDatabase::new().await;
    let user_id = test_db.seed_user("import@example.com", false).await;
    let trip_id = test_db.seed_trip(user_id, "Import Trip").await;

    let job = test_db
        .db
        .import_jobs
        .create(user_id, trip_id, "text")
        .await
        .expect("create job");
    assert_eq!(job.status, ImportStatus::Processing);
    assert_eq!(job.processed_locations, 0);

    test_db.db.import_jobs.set_total(job.id, 3).await.expect("set total");
    for _ in 0..3 {
        test_db
            .db
            .import_jobs
            .increment_processed(job.id)
            .await
            .expect("increment");
    }
    test_db
        .db
        .import_jobs
        .finalize(job.id, ImportStatus::Completed, 2, Some("Could not geocode: Mystery"))
        .await
        .expect("finalize");

    let finished = test_db.db.import_jobs.get(job.id).await.expect("get");
    assert_eq!(finished.status, ImportStatus::Completed);
    assert_eq!(finished.total_locations, 3);
    assert_eq!(finished.processed_locations, 3);
    assert_eq!(finished.imported_locations, 2);
    assert!(finished.error_message.as_deref().unwrap().contains("Mystery"));
    assert!(finished.completed_at.is_some());

    test_db.cleanup().await;
}
