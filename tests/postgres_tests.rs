//! Integration tests for the PostgreSQL store.
//!
//! Validates the generic SQL store against a real database: parameterized
//! WHERE/ORDER BY/OFFSET assembly, uniqueness translation, the
//! set-membership subquery, TEXT[] round-tripping, and transactional
//! all-or-nothing bulk mutation.
//!
//! # Requirements
//!
//! Docker must be running (testcontainers launches a PostgreSQL
//! container). The tests are ignored by default; run them with:
//!
//! ```sh
//! cargo test --test postgres_tests -- --ignored --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single container (via `OnceLock`). Each test creates
//! a fresh `PgPool` and truncates the tables before running; the
//! `--test-threads=1` flag keeps execution sequential.

use prospect::domain::galaxy::{Galaxy, GalaxyFilter, GalaxySort, NewGalaxy};
use prospect::domain::resource::{NewResource, Resource, ResourceFilter, Stats};
use prospect::domain::resource_type::{NewResourceType, ResourceType, StatRanges};
use prospect::domain::user::{NewUser, Role, User};
use prospect::prelude::*;
use prospect::storage::postgres::ensure_schema;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::OnceLock;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh pool per test)
// ---------------------------------------------------------------------------

struct PgTestEnv {
    /// Container handle — dropping this stops the PostgreSQL container,
    /// so it lives in a static for the whole test binary.
    _container: testcontainers::ContainerAsync<Postgres>,
    connection_url: String,
}

static TEST_ENV: OnceLock<PgTestEnv> = OnceLock::new();

async fn init_pg_env() -> &'static PgTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Postgres::default()
        .start()
        .await
        .expect("failed to start PostgreSQL container — is Docker running?");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPool::connect(&url)
        .await
        .expect("failed to connect to PostgreSQL");
    ensure_schema(&pool).await.expect("failed to apply schema");
    pool.close().await;

    let _ = TEST_ENV.set(PgTestEnv {
        _container: container,
        connection_url: url,
    });
    TEST_ENV.get().unwrap()
}

async fn pg_pool() -> PgPool {
    let env = init_pg_env().await;
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&env.connection_url)
        .await
        .expect("failed to connect to PostgreSQL")
}

async fn clean_pool() -> PgPool {
    let pool = pg_pool().await;
    sqlx::query("TRUNCATE galaxies, resources, resource_types, resource_groups, users")
        .execute(&pool)
        .await
        .expect("failed to truncate tables");
    pool
}

fn new_galaxy(name: &str) -> NewGalaxy {
    NewGalaxy {
        name: Name::parse(name).unwrap(),
        owner_user_id: Uuid::new_v4(),
    }
}

fn new_resource(name: &str, resource_type: &str, oq: i16) -> NewResource {
    NewResource {
        name: Name::parse(name).unwrap(),
        galaxy_id: Uuid::new_v4(),
        added_user_id: Uuid::new_v4(),
        resource_type: resource_type.to_string(),
        stats: Stats {
            oq,
            ..Default::default()
        },
    }
}

fn new_resource_type(key: &str, group: &str) -> NewResourceType {
    NewResourceType {
        key: key.to_string(),
        name: format!("{key} display"),
        category: "test".to_string(),
        group: group.to_string(),
        enterable: true,
        max_types: 1,
        ranges: StatRanges::default(),
        container_type: "ore".to_string(),
        inventory_type: "resource_container_ore".to_string(),
        specific_planet: 0,
    }
}

// ---------------------------------------------------------------------------
// CRUD round trips
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires Docker"]
async fn galaxy_round_trip() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    let created = service.create(new_galaxy("Ahazi")).await.unwrap();
    let fetched = service.query_by_key(&created.id).await.unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, created.name);
    assert_eq!(fetched.owner_user_id, created.owner_user_id);
    assert_eq!(fetched.enabled, created.enabled);
    // timestamptz stores microseconds; compare at that precision.
    assert_eq!(
        fetched.date_created.timestamp_micros(),
        created.date_created.timestamp_micros()
    );

    let by_name = service.query_by_name("Ahazi").await.unwrap();
    assert_eq!(by_name.id, created.id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn unique_index_translates_to_aborted() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    service.create(new_galaxy("Ahazi")).await.unwrap();
    let err = service.create(new_galaxy("Ahazi")).await.unwrap_err();
    assert!(err.is_aborted());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn update_persists_patch_and_delete_is_idempotent() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    let created = service.create(new_galaxy("Ahazi")).await.unwrap();
    let updated = service
        .update(
            created.clone(),
            prospect::domain::galaxy::UpdateGalaxy {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.enabled);

    let fetched = service.query_by_key(&created.id).await.unwrap();
    assert!(!fetched.enabled);

    service.delete(&created).await.unwrap();
    service.delete(&created).await.unwrap();
    assert!(service.query_by_key(&created.id).await.is_err());
}

// ---------------------------------------------------------------------------
// Query building against real SQL
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires Docker"]
async fn filtered_ordered_paged_query() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    for i in 0..15 {
        service
            .create(new_galaxy(&format!("Galaxy {i:02}")))
            .await
            .unwrap();
    }

    let order = OrderBy::new(GalaxySort::Name, Direction::Asc);
    let page2 = service
        .query(&GalaxyFilter::default(), order, Page::new(2, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(page2.len(), 5);
    assert_eq!(page2[0].name.as_str(), "Galaxy 10");

    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 15);

    let filter = GalaxyFilter {
        name: Some("Galaxy 0".into()),
        ..Default::default()
    };
    assert_eq!(service.count(&filter).await.unwrap(), 10);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn group_membership_subquery() {
    let pool = clean_pool().await;
    let types = EntityService::new(PostgresStore::<ResourceType>::new(pool.clone()));
    let resources = EntityService::new(PostgresStore::<Resource>::new(pool));

    types
        .bulk_create(vec![
            new_resource_type("copper_polysteel", "mineral"),
            new_resource_type("iron_carbonate", "mineral"),
            new_resource_type("gas_reactive", "gas"),
        ])
        .await
        .unwrap();

    resources
        .create(new_resource("Copper Vein", "copper_polysteel", 500))
        .await
        .unwrap();
    resources
        .create(new_resource("Gas Pocket", "gas_reactive", 500))
        .await
        .unwrap();

    let filter = ResourceFilter {
        resource_group: Some("mineral".into()),
        ..Default::default()
    };
    let matched = resources
        .query(&filter, OrderBy::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].resource_type, "copper_polysteel");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn user_roles_round_trip_through_text_array() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<User>::new(pool));

    let created = service
        .create(NewUser {
            name: Name::parse("Dalla Vayne").unwrap(),
            email: "dalla@example.com".to_string(),
            roles: vec![Role::Admin, Role::User],
            guild: Some("KDS".to_string()),
        })
        .await
        .unwrap();

    let fetched = service.query_by_key(&created.id).await.unwrap();
    assert_eq!(fetched.roles, vec![Role::Admin, Role::User]);
    assert_eq!(fetched.guild.as_deref(), Some("KDS"));

    let by_email = service.query_by_name("dalla@example.com").await.unwrap();
    assert_eq!(by_email.id, created.id);
}

// ---------------------------------------------------------------------------
// Bulk atomicity with real transactions
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires Docker"]
async fn bulk_create_is_all_or_nothing() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    service.create(new_galaxy("Chilastra")).await.unwrap();

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

    // The transaction rolled back: none of the five landed.
    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn bulk_update_and_delete() {
    let pool = clean_pool().await;
    let service = EntityService::new(PostgresStore::<Galaxy>::new(pool));

    let created = service
        .bulk_create(vec![new_galaxy("Ahazi"), new_galaxy("Starsider")])
        .await
        .unwrap();

    let updates = created
        .iter()
        .map(|g| {
            (
                g.id,
                prospect::domain::galaxy::UpdateGalaxy {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
        })
        .collect();
    let updated = service.bulk_update(updates).await.unwrap();
    assert!(updated.iter().all(|g| !g.enabled));

    let filter = GalaxyFilter {
        enabled: Some(false),
        ..Default::default()
    };
    assert_eq!(service.count(&filter).await.unwrap(), 2);

    service
        .bulk_delete(created.iter().map(|g| g.id).collect())
        .await
        .unwrap();
    assert_eq!(service.count(&GalaxyFilter::default()).await.unwrap(), 0);
}
