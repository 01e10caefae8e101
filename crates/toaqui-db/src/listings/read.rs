//! Read operations for the `listings` table.
//!
//! Owned collections are aggregated with correlated `jsonb_agg` subqueries,
//! so every function here costs a single round trip.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{FacetRow, ListingRow};

/// Column list shared by every listing projection. `{distance}` is replaced
/// with the distance expression for the query.
const LISTING_COLUMNS: &str = "\
    l.external_id, l.sort_index, l.logo, l.image, l.link, l.name, \
    l.category, l.person, l.email, l.stars, l.phone, l.address, \
    l.about, l.summary, l.tags, l.services, \
    ST_Y(l.location::geometry) AS latitude, \
    ST_X(l.location::geometry) AS longitude, \
    {distance} AS distance_in_meters, \
    COALESCE((\
        SELECT jsonb_agg(jsonb_build_object('image', i.image, 'title', i.title) \
                         ORDER BY i.position, i.id) \
        FROM listing_images i WHERE i.listing_id = l.id\
    ), '[]'::jsonb) AS images, \
    COALESCE((\
        SELECT jsonb_agg(jsonb_build_object(\
                   'title', r.title, 'content', r.content, 'avatar', r.avatar, \
                   'stars', r.stars, 'date', r.review_date) \
               ORDER BY r.review_date DESC, r.id) \
        FROM listing_reviews r WHERE r.listing_id = l.id\
    ), '[]'::jsonb) AS reviews, \
    COALESCE((\
        SELECT jsonb_agg(jsonb_build_object('day_of_week', h.day_of_week, 'hours', h.hours) \
                         ORDER BY h.day_of_week) \
        FROM listing_opening_hours h WHERE h.listing_id = l.id\
    ), '[]'::jsonb) AS opening_hours, \
    COALESCE((\
        SELECT jsonb_agg(jsonb_build_object('icon', c.icon, 'content', c.content, 'link', c.link) \
                         ORDER BY c.position, c.id) \
        FROM listing_contacts c WHERE c.listing_id = l.id\
    ), '[]'::jsonb) AS contacts";

const SEARCH_CENTER: &str = "ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography";

/// Query listings within `radius_in_meters` of a point, nearest first.
///
/// `category` is an exact match; `keyword` is a case-insensitive substring
/// match over name, about and address. Ties on distance are broken by row id
/// so repeated queries return the same order.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn query_listings_within_radius(
    pool: &PgPool,
    center_latitude: f64,
    center_longitude: f64,
    radius_in_meters: f64,
    category: Option<&str>,
    keyword: Option<&str>,
) -> Result<Vec<ListingRow>, sqlx::Error> {
    let distance = format!("ST_Distance(l.location, {SEARCH_CENTER})");
    let sql = format!(
        "SELECT {columns} \
         FROM listings l \
         WHERE ST_DWithin(l.location, {SEARCH_CENTER}, $3) \
           AND ($4::text IS NULL OR l.category = $4) \
           AND ($5::text IS NULL \
                OR l.name ILIKE $5 OR l.about ILIKE $5 OR l.address ILIKE $5) \
         ORDER BY distance_in_meters ASC, l.id ASC",
        columns = LISTING_COLUMNS.replace("{distance}", &distance),
    );

    sqlx::query_as::<_, ListingRow>(&sql)
        .bind(center_latitude)
        .bind(center_longitude)
        .bind(radius_in_meters)
        .bind(category)
        .bind(keyword.map(contains_pattern))
        .fetch_all(pool)
        .await
}

/// Fetch a single listing by its public id, with every owned collection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_listing_by_external_id(
    pool: &PgPool,
    external_id: Uuid,
) -> Result<Option<ListingRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {columns} FROM listings l WHERE l.external_id = $1",
        columns = LISTING_COLUMNS.replace("{distance}", "NULL::float8"),
    );

    sqlx::query_as::<_, ListingRow>(&sql)
        .bind(external_id)
        .fetch_optional(pool)
        .await
}

/// Category and tags for every listing within `radius_in_meters` of a point.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_listing_facets_within_radius(
    pool: &PgPool,
    center_latitude: f64,
    center_longitude: f64,
    radius_in_meters: f64,
) -> Result<Vec<FacetRow>, sqlx::Error> {
    sqlx::query_as::<_, FacetRow>(
        "SELECT l.category, l.tags \
         FROM listings l \
         WHERE ST_DWithin(l.location, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $3) \
         ORDER BY ST_Distance(l.location, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography), \
                  l.id",
    )
    .bind(center_latitude)
    .bind(center_longitude)
    .bind(radius_in_meters)
    .fetch_all(pool)
    .await
}

/// `ILIKE` pattern matching `keyword` anywhere, with wildcards escaped.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
