//! IP geolocation through BigDataCloud with public-IP detection for local callers.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, Url};

use crate::error::GeoError;
use crate::http::{build_client, build_url, get_json, normalise_base_url};
use crate::types::{IpGeolocationResponse, IpLocation};

const DEFAULT_BASE_URL: &str = "https://api-bdc.net/";

/// Public services that echo the caller's IP address as plain text.
const IP_ECHO_SERVICES: [&str; 3] = [
    "https://api.ipify.org",
    "https://icanhazip.com",
    "https://ifconfig.me/ip",
];

const FALLBACK_COUNTRY: &str = "Brazil";
const FALLBACK_CITY: &str = "São Paulo";
const FALLBACK_LATITUDE: f64 = -23.5505;
const FALLBACK_LONGITUDE: f64 = -46.6333;

static PARENTHETICAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\([^)]*\)\s*$").expect("valid parenthetical suffix regex")
});

const COUNTRY_PREFIXES: [&str; 16] = [
    "Kingdom of ",
    "Republic of ",
    "Democratic Republic of ",
    "People's Republic of ",
    "Federal Republic of ",
    "Islamic Republic of ",
    "United Kingdom of ",
    "Commonwealth of ",
    "Federation of ",
    "Union of ",
    "State of ",
    "Principality of ",
    "Sultanate of ",
    "Emirate of ",
    "Grand Duchy of ",
    "Duchy of ",
];

const COUNTRY_ALIASES: [(&str, &str); 15] = [
    ("United States of America", "United States"),
    ("USA", "United States"),
    ("US", "United States"),
    ("UK", "United Kingdom"),
    ("Great Britain", "United Kingdom"),
    ("Russian Federation", "Russia"),
    ("South Korea", "Korea"),
    ("North Korea", "Korea"),
    ("Czech Republic", "Czechia"),
    ("Bosnia and Herzegovina", "Bosnia"),
    ("Trinidad and Tobago", "Trinidad"),
    ("Saint Vincent and the Grenadines", "Saint Vincent"),
    ("Antigua and Barbuda", "Antigua"),
    ("São Tomé and Príncipe", "São Tomé"),
    ("Saint Kitts and Nevis", "Saint Kitts"),
];

/// Shorten official country names to their common form.
///
/// Strips a trailing parenthetical ("Netherlands (Kingdom of the)"), then the
/// first matching governmental prefix, then applies well-known aliases.
#[must_use]
pub fn normalize_country_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }

    let stripped = PARENTHETICAL_SUFFIX.replace(trimmed, "");
    let mut normalized: &str = &stripped;
    for prefix in COUNTRY_PREFIXES {
        if normalized.len() >= prefix.len()
            && normalized.is_char_boundary(prefix.len())
            && normalized[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            normalized = &normalized[prefix.len()..];
            break;
        }
    }

    let aliased = COUNTRY_ALIASES
        .iter()
        .find(|(from, _)| from.to_lowercase() == normalized.to_lowercase())
        .map_or(normalized, |(_, to)| *to);
    aliased.trim().to_string()
}

fn is_local(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok_and(|addr| addr.is_loopback())
}

fn fallback_location(ip: Option<String>) -> IpLocation {
    IpLocation {
        ip,
        country: FALLBACK_COUNTRY.to_string(),
        city: FALLBACK_CITY.to_string(),
        latitude: FALLBACK_LATITUDE,
        longitude: FALLBACK_LONGITUDE,
    }
}

/// BigDataCloud IP geolocation client.
#[derive(Clone)]
pub struct IpLocationClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    echo_services: Vec<String>,
}

impl std::fmt::Debug for IpLocationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpLocationClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("echo_services", &self.echo_services)
            .finish_non_exhaustive()
    }
}

impl IpLocationClient {
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GeoError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, timeout_secs, user_agent)
    }

    /// # Errors
    ///
    /// Returns [`GeoError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GeoError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: normalise_base_url(base_url)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            echo_services: IP_ECHO_SERVICES.iter().map(ToString::to_string).collect(),
        })
    }

    /// Replace the public-IP echo services (used by tests to point at a mock).
    #[must_use]
    pub fn with_echo_services(mut self, services: Vec<String>) -> Self {
        self.echo_services = services;
        self
    }

    /// Locate `ip`. Blank or loopback addresses are first replaced by this
    /// host's public IP.
    ///
    /// Never fails: when no IP can be determined or the provider call fails,
    /// São Paulo, Brazil is returned.
    pub async fn lookup(&self, ip: Option<&str>) -> IpLocation {
        let candidate = ip.map(str::trim).filter(|s| !s.is_empty() && !is_local(s));
        let resolved = match candidate {
            Some(ip) => Some(ip.to_string()),
            None => self.detect_public_ip().await,
        };

        let Some(ip) = resolved else {
            tracing::warn!("all IP detection methods failed, using default location");
            return fallback_location(None);
        };

        tracing::info!(ip = %ip, "looking up IP location");
        match self.fetch(&ip).await {
            Ok(body) => IpLocation {
                country: normalize_country_name(&body.country.name),
                city: body.location.city,
                latitude: body.location.latitude,
                longitude: body.location.longitude,
                ip: Some(ip),
            },
            Err(e) => {
                tracing::error!(ip = %ip, error = %e, "IP geolocation failed, using default location");
                fallback_location(Some(ip))
            }
        }
    }

    async fn fetch(&self, ip: &str) -> Result<IpGeolocationResponse, GeoError> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let url = build_url(
            &self.base_url,
            "data/ip-geolocation",
            &[("ip", ip), ("key", key)],
        )?;
        get_json(&self.client, &url, "ip geolocation").await
    }

    async fn detect_public_ip(&self) -> Option<String> {
        for service in &self.echo_services {
            match self.echo(service).await {
                Ok(Some(ip)) => {
                    tracing::info!(service = %service, ip = %ip, "detected public IP");
                    return Some(ip);
                }
                Ok(None) => {
                    tracing::warn!(service = %service, "IP echo service returned no valid address");
                }
                Err(e) => {
                    tracing::warn!(service = %service, error = %e, "IP echo service failed");
                }
            }
        }
        None
    }

    async fn echo(&self, service: &str) -> Result<Option<String>, GeoError> {
        let body = self
            .client
            .get(service)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let ip = body.trim();
        Ok(ip.parse::<IpAddr>().is_ok().then(|| ip.to_string()))
    }
}
