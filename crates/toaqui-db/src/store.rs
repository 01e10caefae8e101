use sqlx::PgPool;
use toaqui_core::{ListingFacets, ListingRecord, ListingStore, RadiusQuery};
use uuid::Uuid;

use crate::listings::{
    get_listing_by_external_id, list_listing_facets_within_radius, query_listings_within_radius,
};

/// [`ListingStore`] backed by Postgres + PostGIS.
#[derive(Debug, Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ListingStore for PgListingStore {
    type Error = sqlx::Error;

    async fn query_within_radius(
        &self,
        query: &RadiusQuery,
    ) -> Result<Vec<ListingRecord>, sqlx::Error> {
        let rows = query_listings_within_radius(
            &self.pool,
            query.center_latitude,
            query.center_longitude,
            query.radius_in_meters,
            query.category.as_deref(),
            query.keyword.as_deref(),
        )
        .await?;
        Ok(rows.into_iter().map(ListingRecord::from).collect())
    }

    async fn get_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<ListingRecord>, sqlx::Error> {
        let row = get_listing_by_external_id(&self.pool, external_id).await?;
        Ok(row.map(ListingRecord::from))
    }

    async fn facets_within_radius(
        &self,
        center_latitude: f64,
        center_longitude: f64,
        radius_in_meters: f64,
    ) -> Result<Vec<ListingFacets>, sqlx::Error> {
        let rows = list_listing_facets_within_radius(
            &self.pool,
            center_latitude,
            center_longitude,
            radius_in_meters,
        )
        .await?;
        Ok(rows.into_iter().map(ListingFacets::from).collect())
    }
}
