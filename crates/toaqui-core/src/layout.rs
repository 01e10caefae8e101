//! Front-end layout metadata: filter menus built from what is nearby.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::listing::ListingFacets;
use crate::radius::{convert_radius_to_meters, validate_coordinates, RadiusUnit};
use crate::search::{ListingStore, SearchError};

pub const DEFAULT_LAYOUT_TITLE: &str = "Places near you";

const SORT_BY: [(&str, &str); 5] = [
    ("popular", "Most popular"),
    ("recommended", "Recommended"),
    ("newest", "Newest"),
    ("oldest", "Oldest"),
    ("closest", "Closest"),
];

const DEFAULT_TAGS: [(&str, &str); 6] = [
    ("type_0", "Hipster"),
    ("type_1", "Music club"),
    ("type_2", "Bar"),
    ("type_3", "Pub"),
    ("type_4", "Deli"),
    ("type_5", "Bistro"),
];

const CUISINES: [(&str, &str); 6] = [
    ("cuisine_0", "Fusion"),
    ("cuisine_1", "Indian"),
    ("cuisine_2", "French"),
    ("cuisine_3", "American"),
    ("cuisine_4", "Mexican"),
    ("cuisine_5", "Other"),
];

const MILE_RADII: [u32; 4] = [1, 3, 5, 10];
const KILOMETER_RADII: [u32; 4] = [2, 5, 10, 15];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOption {
    pub value: String,
    pub label: String,
}

impl LayoutOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub title: String,
    pub items: Vec<LayoutOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    pub title: String,
    pub sort_by: Vec<LayoutOption>,
    pub radius: Vec<LayoutOption>,
    pub categories: Vec<LayoutOption>,
    pub tags: OptionGroup,
    pub cuisine: OptionGroup,
}

/// Build layout metadata for listings within `radius` of a point.
///
/// # Errors
///
/// Returns [`SearchError::Invalid`] for bad coordinates, radius or unit and
/// [`SearchError::Store`] when the facet query fails.
pub async fn location_layout<S: ListingStore>(
    store: &S,
    center_latitude: f64,
    center_longitude: f64,
    radius: f64,
    unit: &str,
    title: &str,
) -> Result<LayoutMetadata, SearchError<S::Error>> {
    validate_coordinates(center_latitude, center_longitude)?;
    let radius_in_meters = convert_radius_to_meters(radius, unit)?;

    let facets = store
        .facets_within_radius(center_latitude, center_longitude, radius_in_meters)
        .await
        .map_err(SearchError::Store)?;

    let (categories, tags) = distinct_facets(&facets);
    tracing::debug!(
        listings = facets.len(),
        categories = categories.len(),
        tags = tags.len(),
        "layout facets collected"
    );

    let tag_items = if tags.is_empty() {
        options(&DEFAULT_TAGS)
    } else {
        tags.into_iter()
            .map(|tag| LayoutOption::new(tag.clone(), tag))
            .collect()
    };

    let radius_unit = unit.parse::<RadiusUnit>()?;

    Ok(LayoutMetadata {
        title: title.to_string(),
        sort_by: options(&SORT_BY),
        radius: radius_options(radius_unit),
        categories: categories
            .into_iter()
            .map(|c| LayoutOption::new(c.clone(), c))
            .collect(),
        tags: OptionGroup {
            title: "Tag".to_string(),
            items: tag_items,
        },
        cuisine: OptionGroup {
            title: "Cuisine".to_string(),
            items: options(&CUISINES),
        },
    })
}

/// Radius choices offered for a unit.
#[must_use]
pub fn radius_options(unit: RadiusUnit) -> Vec<LayoutOption> {
    let (steps, suffix) = match unit {
        RadiusUnit::Miles => (MILE_RADII, "MI"),
        RadiusUnit::Kilometers => (KILOMETER_RADII, "KM"),
    };
    steps
        .iter()
        .map(|n| LayoutOption::new(n.to_string(), format!("{n} {suffix}")))
        .collect()
}

/// Distinct categories and non-blank tags, in first-seen order.
fn distinct_facets(facets: &[ListingFacets]) -> (Vec<String>, Vec<String>) {
    let mut seen_categories = HashSet::new();
    let mut seen_tags = HashSet::new();
    let mut categories = Vec::new();
    let mut tags = Vec::new();

    for facet in facets {
        if seen_categories.insert(facet.category.as_str()) {
            categories.push(facet.category.clone());
        }
        for tag in &facet.tags {
            if !tag.trim().is_empty() && seen_tags.insert(tag.as_str()) {
                tags.push(tag.clone());
            }
        }
    }

    (categories, tags)
}

fn options(pairs: &[(&str, &str)]) -> Vec<LayoutOption> {
    pairs
        .iter()
        .map(|(value, label)| LayoutOption::new(*value, *label))
        .collect()
}
