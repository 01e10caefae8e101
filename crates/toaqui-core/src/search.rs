//! Radius search over listings.
//!
//! Storage does the spatial work (distance, category, keyword) in a single
//! round trip; the tag filter and opening status are applied here.

use std::future::Future;

use chrono::{NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::listing::{
    ListingFacets, ListingRecord, ListingView, SearchCriteria, SearchMetadata, SearchResult,
};
use crate::opening_hours::{overall_status, OpeningStatus};
use crate::radius::{convert_radius_to_meters, validate_coordinates};
use crate::CoreError;

/// Filters handed to storage for one radius search.
///
/// Blank `category`/`keyword` values are normalized to `None` before the
/// query is built.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusQuery {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_in_meters: f64,
    pub category: Option<String>,
    pub keyword: Option<String>,
}

/// Read access to listings, implemented by the database layer.
///
/// Implementations must return radius results ordered by ascending distance
/// with a stable tie-break, and populate every owned collection.
pub trait ListingStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn query_within_radius(
        &self,
        query: &RadiusQuery,
    ) -> impl Future<Output = Result<Vec<ListingRecord>, Self::Error>> + Send;

    fn get_by_external_id(
        &self,
        external_id: Uuid,
    ) -> impl Future<Output = Result<Option<ListingRecord>, Self::Error>> + Send;

    fn facets_within_radius(
        &self,
        center_latitude: f64,
        center_longitude: f64,
        radius_in_meters: f64,
    ) -> impl Future<Output = Result<Vec<ListingFacets>, Self::Error>> + Send;
}

/// Source of the wall-clock time used for opening status.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Host local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Error)]
pub enum SearchError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("listing store failed: {0}")]
    Store(#[source] E),
}

/// Opening status of a listing at `now`.
#[must_use]
pub fn opening_status_for(listing: &ListingRecord, now: NaiveDateTime) -> OpeningStatus {
    overall_status(&listing.opening_hours, now)
}

pub struct ListingSearch<S, C = LocalClock> {
    store: S,
    clock: C,
}

impl<S: ListingStore> ListingSearch<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: LocalClock,
        }
    }
}

impl<S: ListingStore, C: Clock> ListingSearch<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a radius search.
    ///
    /// Items keep the order storage returned them in.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Invalid`] for bad coordinates, radius or unit
    /// (before storage is touched) and [`SearchError::Store`] when the
    /// storage query fails.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchResult, SearchError<S::Error>> {
        validate_coordinates(criteria.center_latitude, criteria.center_longitude)?;
        let radius_in_meters = convert_radius_to_meters(criteria.radius, &criteria.unit)?;

        let query = RadiusQuery {
            center_latitude: criteria.center_latitude,
            center_longitude: criteria.center_longitude,
            radius_in_meters,
            category: non_blank(criteria.category.as_deref()),
            keyword: non_blank(criteria.keyword.as_deref()),
        };

        let records = self
            .store
            .query_within_radius(&query)
            .await
            .map_err(SearchError::Store)?;
        let fetched = records.len();

        let wanted = normalize_tags(&criteria.tags);
        let now = self.clock.now();
        let items: Vec<ListingView> = records
            .into_iter()
            .filter(|listing| listing.has_all_tags(&wanted))
            .map(|listing| {
                let status = opening_status_for(&listing, now);
                ListingView { listing, status }
            })
            .collect();

        tracing::debug!(
            fetched,
            matched = items.len(),
            radius_in_meters,
            "listing search completed"
        );

        let total_count = items.len();
        Ok(SearchResult {
            items,
            total_count,
            search: SearchMetadata {
                center_latitude: criteria.center_latitude,
                center_longitude: criteria.center_longitude,
                radius_in_meters,
                unit: criteria.unit.clone(),
                search_time: Utc::now(),
                result_count: total_count,
            },
        })
    }

    /// Fetch one listing with every owned collection, regardless of distance.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Store`] when the storage lookup fails.
    pub async fn get_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<ListingView>, SearchError<S::Error>> {
        let record = self
            .store
            .get_by_external_id(external_id)
            .await
            .map_err(SearchError::Store)?;

        Ok(record.map(|listing| {
            let status = opening_status_for(&listing, self.clock.now());
            ListingView { listing, status }
        }))
    }
}

/// Trim and lowercase requested tags, dropping blanks.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
