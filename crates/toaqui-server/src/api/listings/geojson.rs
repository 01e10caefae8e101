//! RFC 7946 `FeatureCollection` rendering of search results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use toaqui_core::{ListingView, SearchResult};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub(in crate::api) struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
    pub metadata: CollectionMetadata,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: PointGeometry,
    pub properties: ListingProperties,
}

/// GeoJSON point; coordinates are `[longitude, latitude]`.
#[derive(Debug, Serialize)]
pub(in crate::api) struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ListingProperties {
    pub id: Uuid,
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
    pub tags: Vec<String>,
    pub distance_in_meters: Option<f64>,
    pub is_open: bool,
    pub opening_status: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CollectionMetadata {
    pub count: usize,
    pub generated_at: DateTime<Utc>,
    pub search: SearchInfo,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SearchInfo {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_in_meters: f64,
    pub unit: String,
}

impl From<ListingView> for Feature {
    fn from(view: ListingView) -> Self {
        let ListingView { listing, status } = view;
        Self {
            kind: "Feature",
            geometry: PointGeometry {
                kind: "Point",
                coordinates: [listing.longitude, listing.latitude],
            },
            properties: ListingProperties {
                id: listing.external_id,
                index: listing.index,
                logo: listing.logo,
                image: listing.image,
                link: listing.link,
                name: listing.name,
                category: listing.category,
                person: listing.person,
                email: listing.email,
                stars: listing.stars,
                phone: listing.phone,
                address: listing.address,
                about: listing.about,
                tags: listing.tags,
                distance_in_meters: listing.distance_in_meters,
                is_open: status.is_open,
                opening_status: status.status,
            },
        }
    }
}

impl From<SearchResult> for FeatureCollection {
    fn from(result: SearchResult) -> Self {
        let features: Vec<Feature> = result.items.into_iter().map(Feature::from).collect();
        Self {
            kind: "FeatureCollection",
            metadata: CollectionMetadata {
                count: features.len(),
                generated_at: Utc::now(),
                search: SearchInfo {
                    center_latitude: result.search.center_latitude,
                    center_longitude: result.search.center_longitude,
                    radius_in_meters: result.search.radius_in_meters,
                    unit: result.search.unit,
                },
            },
            features,
        }
    }
}
