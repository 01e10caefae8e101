//! Write operations for the `listings` table.
//!
//! The HTTP API is read-only; these exist for seeding and tests.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::types::NewListing;
use crate::DbError;

/// Insert a listing and all of its owned collections in one transaction.
///
/// Returns the listing's public id (generated when `external_id` is `None`).
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any statement fails; nothing is written in
/// that case.
pub async fn insert_listing(pool: &PgPool, listing: &NewListing) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (id, external_id): (i64, Uuid) = sqlx::query_as(
        "INSERT INTO listings \
             (external_id, sort_index, logo, image, link, name, category, person, email, \
              stars, phone, address, about, summary, tags, services, location) \
         VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5, $6, $7, $8, $9, \
                 $10, $11, $12, $13, $14, $15, $16, \
                 ST_SetSRID(ST_MakePoint($18, $17), 4326)::geography) \
         RETURNING id, external_id",
    )
    .bind(listing.external_id)
    .bind(listing.index)
    .bind(&listing.logo)
    .bind(&listing.image)
    .bind(&listing.link)
    .bind(&listing.name)
    .bind(&listing.category)
    .bind(&listing.person)
    .bind(&listing.email)
    .bind(listing.stars)
    .bind(&listing.phone)
    .bind(&listing.address)
    .bind(&listing.about)
    .bind(&listing.summary)
    .bind(&listing.tags)
    .bind(&listing.services)
    .bind(listing.latitude)
    .bind(listing.longitude)
    .fetch_one(&mut *tx)
    .await?;

    insert_children(&mut tx, id, listing).await?;
    tx.commit().await?;

    tracing::debug!(%external_id, name = %listing.name, "listing inserted");
    Ok(external_id)
}

async fn insert_children(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: i64,
    listing: &NewListing,
) -> Result<(), sqlx::Error> {
    if !listing.images.is_empty() {
        let images: Vec<String> = listing.images.iter().map(|i| i.image.clone()).collect();
        let titles: Vec<String> = listing.images.iter().map(|i| i.title.clone()).collect();
        sqlx::query(
            "INSERT INTO listing_images (listing_id, position, image, title) \
             SELECT $1, ord::int - 1, image, title \
             FROM UNNEST($2::text[], $3::text[]) WITH ORDINALITY AS t(image, title, ord)",
        )
        .bind(listing_id)
        .bind(&images)
        .bind(&titles)
        .execute(&mut **tx)
        .await?;
    }

    if !listing.reviews.is_empty() {
        let titles: Vec<String> = listing.reviews.iter().map(|r| r.title.clone()).collect();
        let contents: Vec<String> = listing.reviews.iter().map(|r| r.content.clone()).collect();
        let avatars: Vec<String> = listing.reviews.iter().map(|r| r.avatar.clone()).collect();
        let stars: Vec<i32> = listing.reviews.iter().map(|r| r.stars).collect();
        let dates: Vec<DateTime<Utc>> = listing.reviews.iter().map(|r| r.date).collect();
        sqlx::query(
            "INSERT INTO listing_reviews (listing_id, title, content, avatar, stars, review_date) \
             SELECT $1, * FROM UNNEST($2::text[], $3::text[], $4::text[], $5::int4[], \
                                      $6::timestamptz[])",
        )
        .bind(listing_id)
        .bind(&titles)
        .bind(&contents)
        .bind(&avatars)
        .bind(&stars)
        .bind(&dates)
        .execute(&mut **tx)
        .await?;
    }

    if !listing.opening_hours.is_empty() {
        let days: Vec<i16> = listing
            .opening_hours
            .iter()
            .map(|h| i16::try_from(h.day_of_week).unwrap_or(-1))
            .collect();
        let hours: Vec<String> = listing
            .opening_hours
            .iter()
            .map(|h| h.hours.clone())
            .collect();
        // Out-of-range days become -1 and are rejected by the CHECK constraint.
        sqlx::query(
            "INSERT INTO listing_opening_hours (listing_id, day_of_week, hours) \
             SELECT $1, * FROM UNNEST($2::int2[], $3::text[])",
        )
        .bind(listing_id)
        .bind(&days)
        .bind(&hours)
        .execute(&mut **tx)
        .await?;
    }

    if !listing.contacts.is_empty() {
        let icons: Vec<String> = listing.contacts.iter().map(|c| c.icon.clone()).collect();
        let contents: Vec<String> = listing.contacts.iter().map(|c| c.content.clone()).collect();
        let links: Vec<String> = listing.contacts.iter().map(|c| c.link.clone()).collect();
        sqlx::query(
            "INSERT INTO listing_contacts (listing_id, position, icon, content, link) \
             SELECT $1, ord::int - 1, icon, content, link \
             FROM UNNEST($2::text[], $3::text[], $4::text[]) \
                  WITH ORDINALITY AS t(icon, content, link, ord)",
        )
        .bind(listing_id)
        .bind(&icons)
        .bind(&contents)
        .bind(&links)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Delete a listing by public id; owned collections go with it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no listing has that id, or
/// [`DbError::Sqlx`] if the statement fails.
pub async fn delete_listing(pool: &PgPool, external_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM listings WHERE external_id = $1")
        .bind(external_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
