//! Environment-provided configuration.
//!
//! Everything except the database URL is optional: missing pixel URLs turn
//! the pixel off and a missing CRM webhook only fails lead completion.

use std::time::Duration;

use url::Url;

use crate::common::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_OFFER: &str = "eaton_fire";
pub const DEFAULT_CLICK_ID_PARAM: &str = "clickid";
pub const MIN_STATE_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub crm: Option<CrmConfig>,
    pub pixels: PixelConfig,
    pub funnel: FunnelSettings,
    pub rate_limit: RateLimitConfig,
    /// Key for sealing the funnel state held by the page. A random key is
    /// used when absent.
    pub state_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    pub webhook_url: Url,
    pub auth_token: String,
    pub offer: String,
    pub dry_run: bool,
    pub timeout: Duration,
    /// Hold the completion response until the forward resolves.
    pub await_forward: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelConfig {
    pub on_load: Vec<Url>,
    pub on_partial: Vec<Url>,
    pub on_complete: Vec<Url>,
    pub click_id_param: String,
}

impl PixelConfig {
    pub fn is_empty(&self) -> bool {
        self.on_load.is_empty()
            && self.on_partial.is_empty()
            && self.on_complete.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelSettings {
    /// Minimum time a generated summary stays on screen before the
    /// proceed control appears.
    pub summary_min_display: Duration,
    /// Delay between words when the summary is streamed.
    pub summary_word_interval: Duration,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self {
            summary_min_display: Duration::from_millis(4000),
            summary_word_interval: Duration::from_millis(119),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url =
            get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr =
            get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let crm = match (get("CRM_WEBHOOK_URL"), get("CRM_AUTH_TOKEN")) {
            (Some(url), Some(auth_token)) => {
                let webhook_url =
                    Url::parse(&url).map_err(|_| ConfigError::Invalid {
                        key: "CRM_WEBHOOK_URL",
                        value: url.clone(),
                    })?;

                Some(CrmConfig {
                    webhook_url,
                    auth_token,
                    offer: get("CRM_OFFER")
                        .unwrap_or_else(|| DEFAULT_OFFER.to_string()),
                    dry_run: parse_bool("CRM_DRY_RUN", get("CRM_DRY_RUN"))?,
                    timeout: Duration::from_secs(parse_num(
                        "CRM_TIMEOUT_SECS",
                        get("CRM_TIMEOUT_SECS"),
                        10,
                    )?),
                    await_forward: parse_bool(
                        "CRM_AWAIT_FORWARD",
                        get("CRM_AWAIT_FORWARD"),
                    )?,
                })
            }
            _ => {
                log::warn!(
                    "CRM_WEBHOOK_URL or CRM_AUTH_TOKEN is not set; lead completion will fail"
                );
                None
            }
        };

        let pixels = PixelConfig {
            on_load: parse_urls("PIXEL_LOAD_URLS", get("PIXEL_LOAD_URLS")),
            on_partial: parse_urls(
                "PIXEL_PARTIAL_URLS",
                get("PIXEL_PARTIAL_URLS"),
            ),
            on_complete: parse_urls(
                "PIXEL_COMPLETE_URLS",
                get("PIXEL_COMPLETE_URLS"),
            ),
            click_id_param: get("PIXEL_CLICK_ID_PARAM")
                .unwrap_or_else(|| DEFAULT_CLICK_ID_PARAM.to_string()),
        };

        let funnel = FunnelSettings {
            summary_min_display: Duration::from_millis(parse_num(
                "SUMMARY_MIN_DISPLAY_MS",
                get("SUMMARY_MIN_DISPLAY_MS"),
                4000,
            )?),
            summary_word_interval: Duration::from_millis(parse_num(
                "SUMMARY_WORD_INTERVAL_MS",
                get("SUMMARY_WORD_INTERVAL_MS"),
                119,
            )?),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_num(
                "RATE_LIMIT_MAX",
                get("RATE_LIMIT_MAX"),
                30,
            )?,
            window: Duration::from_secs(parse_num(
                "RATE_LIMIT_WINDOW_SECS",
                get("RATE_LIMIT_WINDOW_SECS"),
                60,
            )?),
        };

        let state_secret = get("FUNNEL_STATE_SECRET");
        if state_secret
            .as_ref()
            .is_some_and(|s| s.len() < MIN_STATE_SECRET_LEN)
        {
            return Err(ConfigError::TooShort {
                key: "FUNNEL_STATE_SECRET",
                min: MIN_STATE_SECRET_LEN,
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            crm,
            pixels,
            funnel,
            rate_limit,
            state_secret,
        })
    }
}

fn parse_bool(
    key: &'static str,
    value: Option<String>,
) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: value.clone().unwrap_or_default(),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_urls(key: &str, value: Option<String>) -> Vec<Url> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Url::parse(s) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Ignoring {} entry '{}': {}", key, s, e);
                None
            }
        })
        .collect()
}
