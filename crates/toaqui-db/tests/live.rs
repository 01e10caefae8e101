//! Live integration tests for toaqui-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database (PostGIS must be
//! available to the server). `"../../migrations"` is relative to
//! `crates/toaqui-db/` and resolves to the workspace migration directory.

use chrono::{TimeZone, Utc};
use toaqui_core::{
    ContactRecord, ImageRecord, ListingSearch, OpeningHoursEntry, ReviewRecord, SearchCriteria,
};
use toaqui_db::{
    delete_listing, get_listing_by_external_id, insert_listing,
    list_listing_facets_within_radius, query_listings_within_radius, DbError, NewListing,
    PgListingStore,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CENTER: (f64, f64) = (-23.5505, -46.6333);

fn new_listing(name: &str, category: &str, latitude: f64, longitude: f64) -> NewListing {
    NewListing {
        external_id: None,
        index: 0,
        logo: String::new(),
        image: String::new(),
        link: String::new(),
        name: name.to_string(),
        category: category.to_string(),
        person: String::new(),
        email: String::new(),
        stars: 4,
        phone: String::new(),
        address: "Centro, São Paulo".to_string(),
        about: String::new(),
        summary: String::new(),
        tags: vec![],
        services: vec![],
        latitude,
        longitude,
        images: vec![],
        reviews: vec![],
        opening_hours: vec![],
        contacts: vec![],
    }
}

async fn seed(pool: &sqlx::PgPool, listing: NewListing) -> Uuid {
    insert_listing(pool, &listing)
        .await
        .unwrap_or_else(|e| panic!("insert_listing failed for '{}': {e}", listing.name))
}

// ---------------------------------------------------------------------------
// Section 1: Radius queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn radius_query_returns_nearest_first_and_excludes_far(pool: sqlx::PgPool) {
    seed(&pool, new_listing("Mid", "cafe", -23.5600, -46.6500)).await;
    seed(&pool, new_listing("Near", "cafe", -23.5510, -46.6340)).await;
    seed(&pool, new_listing("Rio", "cafe", -22.9068, -43.1729)).await;

    let rows = query_listings_within_radius(&pool, CENTER.0, CENTER.1, 5_000.0, None, None)
        .await
        .expect("query_listings_within_radius failed");

    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Near", "Mid"]);
    let near = rows[0].distance_in_meters.expect("distance populated");
    assert!(near > 0.0 && near < 200.0, "unexpected distance {near}");
    assert!((rows[0].latitude - -23.5510).abs() < 1e-9);
    assert!((rows[0].longitude - -46.6340).abs() < 1e-9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn radius_query_filters_by_category_and_keyword(pool: sqlx::PgPool) {
    let mut pizza = new_listing("Bella Pizza", "restaurant", -23.5510, -46.6340);
    pizza.about = "Wood-fired 100% napoletana".to_string();
    seed(&pool, pizza).await;
    seed(&pool, new_listing("Bar do Zé", "bar", -23.5512, -46.6341)).await;

    let restaurants = query_listings_within_radius(
        &pool,
        CENTER.0,
        CENTER.1,
        1_000.0,
        Some("restaurant"),
        None,
    )
    .await
    .unwrap();
    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0].name, "Bella Pizza");

    let by_keyword =
        query_listings_within_radius(&pool, CENTER.0, CENTER.1, 1_000.0, None, Some("PIZZA"))
            .await
            .unwrap();
    assert_eq!(by_keyword.len(), 1);

    let by_about =
        query_listings_within_radius(&pool, CENTER.0, CENTER.1, 1_000.0, None, Some("100%"))
            .await
            .unwrap();
    assert_eq!(by_about.len(), 1);

    let wildcard_only =
        query_listings_within_radius(&pool, CENTER.0, CENTER.1, 1_000.0, None, Some("%"))
            .await
            .unwrap();
    assert_eq!(wildcard_only.len(), 1, "'%' must match literally");
}

#[sqlx::test(migrations = "../../migrations")]
async fn facets_cover_listings_within_radius(pool: sqlx::PgPool) {
    let mut bar = new_listing("Bar", "bar", -23.5510, -46.6340);
    bar.tags = vec!["music".to_string(), "craft beer".to_string()];
    seed(&pool, bar).await;
    let mut far = new_listing("Far", "museum", -22.9068, -43.1729);
    far.tags = vec!["history".to_string()];
    seed(&pool, far).await;

    let facets = list_listing_facets_within_radius(&pool, CENTER.0, CENTER.1, 2_000.0)
        .await
        .unwrap();
    assert_eq!(facets.len(), 1);
    assert_eq!(facets[0].category, "bar");
    assert_eq!(facets[0].tags, ["music", "craft beer"]);
}

// ---------------------------------------------------------------------------
// Section 2: Detail lookup and owned collections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn detail_lookup_returns_all_collections(pool: sqlx::PgPool) {
    let reviewed_at = Utc.with_ymd_and_hms(2018, 12, 3, 15, 0, 0).unwrap();
    let mut listing = new_listing("Padaria", "bakery", -23.5510, -46.6340);
    listing.images = vec![
        ImageRecord {
            image: "front.jpg".to_string(),
            title: "Front".to_string(),
        },
        ImageRecord {
            image: "inside.jpg".to_string(),
            title: "Inside".to_string(),
        },
    ];
    listing.reviews = vec![ReviewRecord {
        title: "Maria".to_string(),
        content: "Best bread in town".to_string(),
        avatar: String::new(),
        stars: 5,
        date: reviewed_at,
    }];
    listing.opening_hours = vec![
        OpeningHoursEntry {
            day_of_week: 6,
            hours: "08:00-12:00".to_string(),
        },
        OpeningHoursEntry {
            day_of_week: 1,
            hours: "07:00-19:00".to_string(),
        },
    ];
    listing.contacts = vec![ContactRecord {
        icon: "email".to_string(),
        content: "oi@padaria.com".to_string(),
        link: "mailto:oi@padaria.com".to_string(),
    }];
    let id = seed(&pool, listing).await;

    let row = get_listing_by_external_id(&pool, id)
        .await
        .unwrap()
        .expect("listing should exist");

    assert!(row.distance_in_meters.is_none());
    assert_eq!(row.images.0.len(), 2);
    assert_eq!(row.images.0[0].image, "front.jpg");
    assert_eq!(row.reviews.0[0].date, reviewed_at);
    let days: Vec<i32> = row.opening_hours.0.iter().map(|h| h.day_of_week).collect();
    assert_eq!(days, [1, 6]);
    assert_eq!(row.contacts.0[0].link, "mailto:oi@padaria.com");
}

#[sqlx::test(migrations = "../../migrations")]
async fn detail_lookup_unknown_id_is_none(pool: sqlx::PgPool) {
    let row = get_listing_by_external_id(&pool, Uuid::new_v4())
        .await
        .unwrap();
    assert!(row.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_keeps_caller_supplied_external_id(pool: sqlx::PgPool) {
    let wanted = Uuid::new_v4();
    let mut listing = new_listing("Fixed", "cafe", -23.5510, -46.6340);
    listing.external_id = Some(wanted);
    assert_eq!(seed(&pool, listing).await, wanted);
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_day_of_week_rolls_back_insert(pool: sqlx::PgPool) {
    let mut listing = new_listing("Broken", "cafe", -23.5510, -46.6340);
    listing.opening_hours = vec![OpeningHoursEntry {
        day_of_week: 9,
        hours: "09:00-17:00".to_string(),
    }];

    assert!(insert_listing(&pool, &listing).await.is_err());
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_cascades_to_owned_collections(pool: sqlx::PgPool) {
    let mut listing = new_listing("Gone", "cafe", -23.5510, -46.6340);
    listing.opening_hours = vec![OpeningHoursEntry {
        day_of_week: 2,
        hours: "09:00-17:00".to_string(),
    }];
    let id = seed(&pool, listing).await;

    delete_listing(&pool, id).await.expect("delete_listing failed");

    let hours: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listing_opening_hours")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(hours, 0);
    assert!(matches!(
        delete_listing(&pool, id).await,
        Err(DbError::NotFound)
    ));
}

// ---------------------------------------------------------------------------
// Section 3: Search pipeline over Postgres
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pipeline_applies_tag_filter_over_store_results(pool: sqlx::PgPool) {
    let mut vegan = new_listing("Green Bowl", "restaurant", -23.5510, -46.6340);
    vegan.tags = vec!["vegan".to_string(), "pet-friendly".to_string()];
    seed(&pool, vegan).await;
    let mut wifi = new_listing("Byte Cafe", "restaurant", -23.5512, -46.6342);
    wifi.tags = vec!["wifi".to_string()];
    seed(&pool, wifi).await;

    let search = ListingSearch::new(PgListingStore::new(pool));
    let criteria = SearchCriteria {
        center_latitude: CENTER.0,
        center_longitude: CENTER.1,
        radius: 1.0,
        unit: "km".to_string(),
        category: None,
        keyword: None,
        tags: vec!["Vegan".to_string()],
    };

    let result = search.search(&criteria).await.expect("search failed");
    assert_eq!(result.total_count, 1);
    assert_eq!(result.items[0].listing.name, "Green Bowl");
    assert!((result.search.radius_in_meters - 1000.0).abs() < f64::EPSILON);
}
