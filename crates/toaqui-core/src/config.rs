use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from variables already in the process
/// environment, without reading `.env`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(raw)
        } else {
            Err(invalid(var, format!("expected an http(s) URL, got {raw:?}")))
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("TOAQUI_ENV", "development"))?;

    let bind_addr = or_default("TOAQUI_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TOAQUI_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("TOAQUI_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("TOAQUI_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TOAQUI_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TOAQUI_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "TOAQUI_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds TOAQUI_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let http_timeout_secs = parse_u64("TOAQUI_HTTP_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("TOAQUI_USER_AGENT", "ToAquiBrasil/1.0");

    let nominatim_base_url = parse_url(
        "TOAQUI_NOMINATIM_BASE_URL",
        "https://nominatim.openstreetmap.org/",
    )?;
    let countries_now_base_url = parse_url(
        "TOAQUI_COUNTRIES_NOW_BASE_URL",
        "https://countriesnow.space/api/v0.1/",
    )?;
    let big_data_cloud_base_url =
        parse_url("TOAQUI_BIG_DATA_CLOUD_BASE_URL", "https://api-bdc.net/")?;
    let big_data_cloud_api_key = lookup("BIG_DATA_CLOUD_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());

    let rate_limit_max_requests = parse_u32("TOAQUI_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs = parse_u64("TOAQUI_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_window_secs == 0 {
        return Err(invalid(
            "TOAQUI_RATE_LIMIT_WINDOW_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        user_agent,
        nominatim_base_url,
        countries_now_base_url,
        big_data_cloud_base_url,
        big_data_cloud_api_key,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TOAQUI_ENV".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
