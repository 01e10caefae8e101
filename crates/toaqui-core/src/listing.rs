use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::opening_hours::OpeningStatus;

/// Hours text for one weekday (Sunday = 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHoursEntry {
    pub day_of_week: i32,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub title: String,
    pub content: String,
    pub avatar: String,
    pub stars: i32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub icon: String,
    pub content: String,
    pub link: String,
}

/// A listing as projected by storage, including its owned collections.
///
/// `distance_in_meters` is only populated by radius queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub external_id: Uuid,
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
    pub distance_in_meters: Option<f64>,
    pub images: Vec<ImageRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub opening_hours: Vec<OpeningHoursEntry>,
    pub contacts: Vec<ContactRecord>,
}

impl ListingRecord {
    /// Returns `true` if every entry of `wanted` is among this listing's tags.
    ///
    /// `wanted` must already be trimmed and lowercased; listing tags are
    /// compared case-insensitively.
    #[must_use]
    pub fn has_all_tags(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|tag| {
            self.tags
                .iter()
                .any(|own| own.trim().to_lowercase() == *tag)
        })
    }
}

/// A listing paired with its opening status at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub listing: ListingRecord,
    pub status: OpeningStatus,
}

/// Category and tags of one listing, used to build facet menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFacets {
    pub category: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius: f64,
    pub unit: String,
    pub category: Option<String>,
    pub keyword: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMetadata {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_in_meters: f64,
    pub unit: String,
    pub search_time: DateTime<Utc>,
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub items: Vec<ListingView>,
    pub total_count: usize,
    pub search: SearchMetadata,
}

/// Format a review date as month and year, e.g. `"Dec 2018"`.
#[must_use]
pub fn format_review_date(date: DateTime<Utc>) -> String {
    date.format("%b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record_with_tags(tags: &[&str]) -> ListingRecord {
        ListingRecord {
            external_id: Uuid::nil(),
            index: 0,
            logo: String::new(),
            image: String::new(),
            link: String::new(),
            name: "Cafe".to_string(),
            category: "food".to_string(),
            person: String::new(),
            email: String::new(),
            stars: 4,
            phone: String::new(),
            address: String::new(),
            about: String::new(),
            summary: String::new(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            services: vec![],
            latitude: 0.0,
            longitude: 0.0,
            distance_in_meters: None,
            images: vec![],
            reviews: vec![],
            opening_hours: vec![],
            contacts: vec![],
        }
    }

    #[test]
    fn has_all_tags_requires_every_tag() {
        let record = record_with_tags(&["Vegan", " pet-friendly "]);
        assert!(record.has_all_tags(&["vegan".to_string()]));
        assert!(record.has_all_tags(&["vegan".to_string(), "pet-friendly".to_string()]));
        assert!(!record.has_all_tags(&["vegan".to_string(), "wifi".to_string()]));
    }

    #[test]
    fn has_all_tags_with_no_filter_matches() {
        assert!(record_with_tags(&[]).has_all_tags(&[]));
    }

    #[test]
    fn review_date_is_month_and_year() {
        let date = Utc.with_ymd_and_hms(2018, 12, 3, 15, 0, 0).unwrap();
        assert_eq!(format_review_date(date), "Dec 2018");
    }

    #[test]
    fn opening_hours_entry_deserializes_from_json() {
        let entry: OpeningHoursEntry =
            serde_json::from_str(r#"{"day_of_week": 2, "hours": "09:00-17:00"}"#).unwrap();
        assert_eq!(entry.day_of_week, 2);
        assert_eq!(entry.hours, "09:00-17:00");
    }
}
