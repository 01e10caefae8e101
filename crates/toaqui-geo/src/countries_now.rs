use reqwest::{Client, Url};

use crate::error::GeoError;
use crate::http::{build_client, build_url, normalise_base_url};
use crate::types::CountriesNowCities;

const DEFAULT_BASE_URL: &str = "https://countriesnow.space/api/v0.1/";

/// Client for the CountriesNow city directory.
#[derive(Debug, Clone)]
pub struct CountriesNowClient {
    client: Client,
    base_url: Url,
}

impl CountriesNowClient {
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, GeoError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// # Errors
    ///
    /// Returns [`GeoError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GeoError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: normalise_base_url(base_url)?,
        })
    }

    /// Cities of `country` whose name contains `city` (case-insensitive).
    /// An empty `city` returns every city of the country.
    ///
    /// A non-success status or an `error: true` body yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`GeoError::InvalidInput`] if `country` is blank
    /// - [`GeoError::Http`] on transport failure
    /// - [`GeoError::Deserialize`] if a success body is not the expected shape
    pub async fn search_cities(&self, city: &str, country: &str) -> Result<Vec<String>, GeoError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(GeoError::InvalidInput("country is required".to_string()));
        }

        let url = build_url(&self.base_url, "countries/cities", &[])?;
        let response = self
            .client
            .post(url.clone())
            .json(&serde_json::json!({ "country": country }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), country = %country, "city directory request failed");
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        let cities: CountriesNowCities =
            serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
                context: format!("cities of {country}"),
                source: e,
            })?;
        if cities.error {
            tracing::warn!(country = %country, msg = %cities.msg, "city directory reported an error");
            return Ok(Vec::new());
        }

        Ok(filter_cities(cities.data, city))
    }
}

fn filter_cities(cities: Vec<String>, needle: &str) -> Vec<String> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return cities;
    }
    cities
        .into_iter()
        .filter(|c| c.to_lowercase().contains(&needle))
        .collect()
}
