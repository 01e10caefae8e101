pub mod app_config;
pub mod config;
pub mod layout;
pub mod listing;
pub mod opening_hours;
pub mod radius;
pub mod search;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use layout::{
    location_layout, radius_options, LayoutMetadata, LayoutOption, OptionGroup,
    DEFAULT_LAYOUT_TITLE,
};
pub use listing::{
    format_review_date, ContactRecord, ImageRecord, ListingFacets, ListingRecord, ListingView,
    OpeningHoursEntry, ReviewRecord, SearchCriteria, SearchMetadata, SearchResult,
};
pub use opening_hours::{day_name, evaluate, overall_status, OpeningStatus};
pub use radius::{convert_radius_to_meters, validate_coordinates, RadiusUnit};
pub use search::{
    normalize_tags, opening_status_for, Clock, ListingSearch, ListingStore, LocalClock,
    RadiusQuery, SearchError,
};

use thiserror::Error;

/// Caller-supplied input that the core refuses to act on.
///
/// Every variant maps to a client error at the HTTP boundary.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid radius unit: {0} (expected \"km\" or \"mi\")")]
    InvalidRadiusUnit(String),

    #[error("invalid radius: {0} (must be a positive, finite number)")]
    InvalidRadius(f64),

    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
