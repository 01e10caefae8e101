//! Row types for the `listings` table.

use sqlx::types::Json;
use toaqui_core::{
    ContactRecord, ImageRecord, ListingFacets, ListingRecord, OpeningHoursEntry, ReviewRecord,
};
use uuid::Uuid;

/// Input record for inserting a listing together with its owned collections.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub external_id: Option<Uuid>,
    pub index: i32,
    pub logo: String,
    pub image: String,
    pub link: String,
    pub name: String,
    pub category: String,
    pub person: String,
    pub email: String,
    pub stars: i32,
    pub phone: String,
    pub address: String,
    pub about: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub services: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<ImageRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub opening_hours: Vec<OpeningHoursEntry>,
    pub contacts: Vec<ContactRecord>,
}

/// A listing row with coordinates unpacked from the `geography` column and
/// child collections aggregated to JSON arrays.
///
/// `distance_in_meters` is `NULL` for lookups that have no search center.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub external_id: Uuid,
    pub sort_index: i32,
    pub logo: String,
    pub image: String,
    pub link: String,
    pub name: String,
    pub category: String,
    pub person: String,
    pub email: String,
    pub stars: i32,
    pub phone: String,
    pub address: String,
    pub about: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub services: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_in_meters: Option<f64>,
    pub images: Json<Vec<ImageRecord>>,
    pub reviews: Json<Vec<ReviewRecord>>,
    pub opening_hours: Json<Vec<OpeningHoursEntry>>,
    pub contacts: Json<Vec<ContactRecord>>,
}

impl From<ListingRow> for ListingRecord {
    fn from(row: ListingRow) -> Self {
        Self {
            external_id: row.external_id,
            index: row.sort_index,
            logo: row.logo,
            image: row.image,
            link: row.link,
            name: row.name,
            category: row.category,
            person: row.person,
            email: row.email,
            stars: row.stars,
            phone: row.phone,
            address: row.address,
            about: row.about,
            summary: row.summary,
            tags: row.tags,
            services: row.services,
            latitude: row.latitude,
            longitude: row.longitude,
            distance_in_meters: row.distance_in_meters,
            images: row.images.0,
            reviews: row.reviews.0,
            opening_hours: row.opening_hours.0,
            contacts: row.contacts.0,
        }
    }
}

/// Category and tags of one listing inside a search radius.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FacetRow {
    pub category: String,
    pub tags: Vec<String>,
}

impl From<FacetRow> for ListingFacets {
    fn from(row: FacetRow) -> Self {
        Self {
            category: row.category,
            tags: row.tags,
        }
    }
}
