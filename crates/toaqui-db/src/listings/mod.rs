//! Database operations for the `listings` table and its owned collections
//! (`listing_images`, `listing_reviews`, `listing_opening_hours`,
//! `listing_contacts`).

mod read;
mod types;
mod write;

pub use read::{
    get_listing_by_external_id, list_listing_facets_within_radius, query_listings_within_radius,
};
pub use types::{FacetRow, ListingRow, NewListing};
pub use write::{delete_listing, insert_listing};
