//! Bulk operation behavior: fail-fast validation, batch bounds, and
//! all-or-nothing persistence over the in-memory store.

use prospect::domain::galaxy::{
    self, Galaxy, GalaxyFilter, NewGalaxy, NewGalaxyRequest, UpdateGalaxyRequest,
    UpdateGalaxyWithId,
};
use prospect::prelude::*;
use uuid::Uuid;

fn galaxy_service() -> EntityService<Galaxy, InMemoryStore<Galaxy>> {
    EntityService::new(InMemoryStore::new())
}

fn new_galaxy(name: &str) -> NewGalaxy {
    NewGalaxy {
        name: Name::parse(name).unwrap(),
        owner_user_id: Uuid::new_v4(),
    }
}

fn new_request(name: &str) -> NewGalaxyRequest {
    NewGalaxyRequest {
        name: name.to_string(),
        owner_user_id: Uuid::new_v4().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Validation phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_items_are_all_reported_and_nothing_persists() {
    let service = galaxy_service();

    // Items 1 and 3 are invalid: empty name, malformed owner UUID.
    let batch = vec![
        new_request("Ahazi"),
        NewGalaxyRequest {
            name: String::new(),
            owner_user_id: Uuid::new_v4().to_string(),
        },
        new_request("Starsider"),
        NewGalaxyRequest {
            name: "Chilastra".to_string(),
            owner_user_id: "not-a-uuid".to_string(),
        },
        new_request("Bria"),
    ];

    let err = galaxy::convert_new_batch(batch).unwrap_err();
    match &err {
        Error::BulkValidation(errors) => {
            assert_eq!(errors.len(), 2, "exactly the two bad items are reported");
            assert_eq!(errors[0].index, 1);
            assert_eq!(errors[1].index, 3);
        }
        other => panic!("expected BulkValidation, got {other:?}"),
    }

    // The conversion failed, so no storage call was ever made.
    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 0);
}

#[test]
fn batch_bounds_are_enforced_before_any_work() {
    assert!(validate_batch_size(0).is_err());
    assert!(validate_batch_size(101).is_err());
    assert!(validate_batch_size(100).is_ok());

    let oversized: Vec<NewGalaxyRequest> = (0..101).map(|i| new_request(&format!("G{i}"))).collect();
    let err = galaxy::convert_new_batch(oversized).unwrap_err();
    assert_eq!(err.error_code(), "FAILED_PRECONDITION");

    let err = galaxy::convert_new_batch(Vec::new()).unwrap_err();
    assert_eq!(err.error_code(), "FAILED_PRECONDITION");
}

// ---------------------------------------------------------------------------
// Persistence phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_create_persists_whole_batch_with_shared_timestamp() {
    let service = galaxy_service();

    let created = service
        .bulk_create(vec![
            new_galaxy("Ahazi"),
            new_galaxy("Starsider"),
            new_galaxy("Chilastra"),
        ])
        .await
        .unwrap();

    assert_eq!(created.len(), 3);
    assert!(
        created
            .iter()
            .all(|g| g.date_created == created[0].date_created),
        "one shared now across the batch"
    );
    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 3);
}

#[tokio::test]
async fn bulk_create_rolls_back_whole_batch_on_storage_conflict() {
    let service = galaxy_service();
    service.create(new_galaxy("Chilastra")).await.unwrap();

    // Five valid items, but the fourth violates the uniqueness invariant
    // at the storage stage.
    let err = service
        .bulk_create(vec![
            new_galaxy("Ahazi"),
            new_galaxy("Starsider"),
            new_galaxy("Bria"),
            new_galaxy("Chilastra"),
            new_galaxy("Kettemoor"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_aborted());
    assert!(err.to_string().contains("item[3]"), "position is reported");

    // None of the five were persisted; only the pre-existing row remains.
    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn bulk_update_applies_patches_to_every_target() {
    let service = galaxy_service();
    let a = service.create(new_galaxy("Ahazi")).await.unwrap();
    let b = service.create(new_galaxy("Starsider")).await.unwrap();

    let items = vec![
        UpdateGalaxyWithId {
            id: a.id.to_string(),
            data: UpdateGalaxyRequest {
                enabled: Some(false),
                ..Default::default()
            },
        },
        UpdateGalaxyWithId {
            id: b.id.to_string(),
            data: UpdateGalaxyRequest {
                name: Some("Starsider Prime".to_string()),
                ..Default::default()
            },
        },
    ];

    let updates = galaxy::convert_update_batch(items).unwrap();
    let updated = service.bulk_update(updates).await.unwrap();

    assert_eq!(updated.len(), 2);
    assert!(!updated[0].enabled);
    assert_eq!(updated[1].name.as_str(), "Starsider Prime");
    assert_eq!(updated[0].date_updated, updated[1].date_updated);

    let fetched = service.query_by_key(&b.id).await.unwrap();
    assert_eq!(fetched.name.as_str(), "Starsider Prime");
}

#[tokio::test]
async fn bulk_update_fails_whole_batch_when_any_id_is_missing() {
    let service = galaxy_service();
    let existing = service.create(new_galaxy("Ahazi")).await.unwrap();

    let updates = vec![
        (
            existing.id,
            prospect::domain::galaxy::UpdateGalaxy {
                enabled: Some(false),
                ..Default::default()
            },
        ),
        (
            Uuid::new_v4(),
            prospect::domain::galaxy::UpdateGalaxy::default(),
        ),
    ];

    let err = service.bulk_update(updates).await.unwrap_err();
    assert!(err.is_not_found());

    // The read phase failed before any write: the first target is
    // untouched.
    let fetched = service.query_by_key(&existing.id).await.unwrap();
    assert!(fetched.enabled);
    assert_eq!(fetched.date_updated, existing.date_updated);
}

#[tokio::test]
async fn bulk_delete_removes_every_key() {
    let service = galaxy_service();
    let a = service.create(new_galaxy("Ahazi")).await.unwrap();
    let b = service.create(new_galaxy("Starsider")).await.unwrap();
    let keep = service.create(new_galaxy("Chilastra")).await.unwrap();

    let ids = galaxy::convert_delete_batch(vec![a.id.to_string(), b.id.to_string()]).unwrap();
    service.bulk_delete(ids).await.unwrap();

    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 1);
    assert!(service.query_by_key(&keep.id).await.is_ok());
}

#[tokio::test]
async fn bulk_delete_conversion_collects_bad_ids() {
    let err = galaxy::convert_delete_batch(vec![
        Uuid::new_v4().to_string(),
        "garbage".to_string(),
        "also garbage".to_string(),
    ])
    .unwrap_err();

    match err {
        Error::BulkValidation(errors) => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].index, 1);
            assert_eq!(errors[1].index, 2);
            assert!(errors.iter().all(|e| e.field == "id"));
        }
        other => panic!("expected BulkValidation, got {other:?}"),
    }
}
