use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::GeoError;

/// Build the shared `reqwest` client used by every provider.
pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, GeoError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Parse `base_url`, ensuring it ends with exactly one slash so relative
/// joins append to its path instead of replacing the last segment.
pub(crate) fn normalise_base_url(base_url: &str) -> Result<Url, GeoError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| GeoError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

/// Join `path` onto `base` and append query parameters.
pub(crate) fn build_url(base: &Url, path: &str, params: &[(&str, &str)]) -> Result<Url, GeoError> {
    let mut url = base.join(path).map_err(|e| GeoError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// `url` with its query string removed. Provider queries can carry API keys,
/// so only this form goes into errors and logs.
pub(crate) fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

/// Send a GET request, require a 2xx status and decode the JSON body.
///
/// Errors never contain the request's query string.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &Url,
    context: &str,
) -> Result<T, GeoError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(reqwest::Error::without_url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(GeoError::UnexpectedStatus {
            status: status.as_u16(),
            url: display_url(url),
        });
    }
    let body = response.text().await.map_err(reqwest::Error::without_url)?;
    serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}
