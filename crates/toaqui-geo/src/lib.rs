//! Clients for the third-party geography services behind the `/geo` routes:
//! Nominatim (forward/reverse geocoding and suggestions), BigDataCloud (IP
//! geolocation) and CountriesNow (city names per country).

pub mod countries_now;
pub mod error;
mod http;
pub mod ip_location;
pub mod locate;
pub mod nominatim;
pub mod types;

pub use countries_now::CountriesNowClient;
pub use error::GeoError;
pub use ip_location::{normalize_country_name, IpLocationClient};
pub use locate::locate_ip;
pub use nominatim::NominatimClient;
pub use types::{IpLocation, Location, LocationSuggestion};
