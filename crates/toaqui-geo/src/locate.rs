use crate::error::GeoError;
use crate::ip_location::IpLocationClient;
use crate::nominatim::NominatimClient;
use crate::types::IpLocation;

/// Locate an IP and sharpen its coordinates by geocoding "City, Country".
///
/// IP providers tend to report coarse coordinates; the geocoded city centre
/// is preferred when one is found. When geocoding finds nothing the IP
/// coordinates are kept.
///
/// # Errors
///
/// Propagates Nominatim transport, status, and decode failures.
pub async fn locate_ip(
    ip_client: &IpLocationClient,
    nominatim: &NominatimClient,
    ip: Option<&str>,
) -> Result<IpLocation, GeoError> {
    let mut location = ip_client.lookup(ip).await;

    let query = format!("{}, {}", location.city, location.country);
    match nominatim.coordinates_by_city(&query).await {
        Ok(refined) => {
            location.latitude = refined.latitude;
            location.longitude = refined.longitude;
        }
        Err(GeoError::NotFound(_) | GeoError::InvalidInput(_)) => {
            tracing::debug!(query = %query, "keeping IP coordinates");
        }
        Err(e) => return Err(e),
    }
    Ok(location)
}
