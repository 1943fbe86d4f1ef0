use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct TurfConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    pub venue: VenueConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 shared secret used by the issuing auth service.
    pub secret: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Offset of venue wall-clock time from UTC. Operating hours and slot
    /// start times are interpreted in this offset.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl TurfConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix
        let common = core_config::Config::load()?;
        let is_prod = common.is_production();

        let utc_offset_minutes = get_env("VENUE_UTC_OFFSET_MINUTES", Some("330"), false)?
            .parse::<i32>()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid VENUE_UTC_OFFSET_MINUTES: {}", e))
            })?;

        let request_timeout_secs = get_env("RAZORPAY_TIMEOUT_SECS", Some("10"), false)?
            .parse::<u64>()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid RAZORPAY_TIMEOUT_SECS: {}", e))
            })?;

        Ok(TurfConfig {
            common,
            service_name: "turf-service".to_string(),
            log_level: get_env("LOG_LEVEL", Some("info,turf_service=debug"), false)?,
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("turf_db"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", Some("dev-jwt-secret"), is_prod)?),
            },
            razorpay: RazorpayConfig {
                key_id: env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
                key_secret: Secret::new(env::var("RAZORPAY_KEY_SECRET").unwrap_or_default()),
                api_base_url: get_env(
                    "RAZORPAY_API_BASE_URL",
                    Some("https://api.razorpay.com/v1"),
                    false,
                )?,
                request_timeout_secs,
            },
            venue: VenueConfig { utc_offset_minutes },
            cors: CorsConfig {
                allowed_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
            },
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
