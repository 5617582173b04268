use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sonarr: Option<SonarrConfig>,
    #[serde(default)]
    pub notion: Option<NotionConfig>,
    #[serde(default)]
    pub youtube: Option<YouTubeConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8000
}

/// Webhook authentication configuration.
///
/// With method `none` the webhook secret check is disabled entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    /// Shared secret (required when method = "api_key").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    ApiKey,
}

/// Sonarr (episode manager) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SonarrConfig {
    /// Sonarr server URL (e.g., "http://localhost:8989")
    pub base_url: String,
    /// Sonarr API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Hours between full catalog refreshes (default: 12)
    #[serde(default = "default_cache_refresh_hours")]
    pub cache_refresh_hours: u64,
}

fn default_timeout() -> u32 {
    30
}

fn default_cache_refresh_hours() -> u64 {
    12
}

/// Notion (tabular store) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotionConfig {
    /// Notion integration token
    pub token: String,
    /// Base URL override (default: https://api.notion.com)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Max simultaneous in-flight requests (default: 4)
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Minimum spacing between requests in milliseconds (default: 334,
    /// roughly Notion's 3 requests per second)
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    /// Retry ceiling for rate-limited requests (default: 5)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_in_flight() -> usize {
    4
}

fn default_min_request_interval_ms() -> u64 {
    334
}

fn default_max_retries() -> u32 {
    5
}

/// YouTube (channel metrics) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeConfig {
    /// YouTube Data API v3 key
    pub api_key: String,
    /// Channel to track: a UC… id, @handle, URL or username
    pub channel: String,
    /// Base URL override (default: https://www.googleapis.com)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Periodic sync driver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Enable/disable the periodic sync driver.
    #[serde(default)]
    pub enabled: bool,
    /// Notion page whose child tables hold the dashboards.
    #[serde(default)]
    pub parent_page_id: String,
    /// Name of the upcoming-episodes table under the parent page.
    #[serde(default = "default_calendar_table")]
    pub calendar_table: String,
    /// Name of the single-row channel-stats table under the parent page.
    #[serde(default = "default_stats_table")]
    pub stats_table: String,
    /// Calendar window: days to look back (default: 7)
    #[serde(default = "default_past_days")]
    pub calendar_past_days: i64,
    /// Calendar window: days to look ahead (default: 14)
    #[serde(default = "default_future_days")]
    pub calendar_future_days: i64,
    /// Hours between catalog sync passes (default: 24)
    #[serde(default = "default_catalog_interval_hours")]
    pub catalog_interval_hours: u64,
    /// Minutes between channel-stats sync passes (default: 60)
    #[serde(default = "default_stats_interval_mins")]
    pub stats_interval_mins: u64,
    /// Run both sync passes once at startup (default: true)
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

fn default_calendar_table() -> String {
    "Upcoming Episodes".to_string()
}

fn default_stats_table() -> String {
    "Channel Stats".to_string()
}

fn default_past_days() -> i64 {
    7
}

fn default_future_days() -> i64 {
    14
}

fn default_catalog_interval_hours() -> u64 {
    24
}

fn default_stats_interval_mins() -> u64 {
    60
}

fn default_run_on_startup() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            parent_page_id: String::new(),
            calendar_table: default_calendar_table(),
            stats_table: default_stats_table(),
            calendar_past_days: default_past_days(),
            calendar_future_days: default_future_days(),
            catalog_interval_hours: default_catalog_interval_hours(),
            stats_interval_mins: default_stats_interval_mins(),
            run_on_startup: default_run_on_startup(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sonarr: Option<SanitizedSonarrConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion: Option<SanitizedNotionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<SanitizedYouTubeConfig>,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSonarrConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub cache_refresh_hours: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotionConfig {
    pub token_configured: bool,
    pub max_in_flight: usize,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYouTubeConfig {
    pub api_key_configured: bool,
    pub channel: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            sonarr: config.sonarr.as_ref().map(|s| SanitizedSonarrConfig {
                base_url: s.base_url.clone(),
                api_key_configured: !s.api_key.is_empty(),
                timeout_secs: s.timeout_secs,
                cache_refresh_hours: s.cache_refresh_hours,
            }),
            notion: config.notion.as_ref().map(|n| SanitizedNotionConfig {
                token_configured: !n.token.is_empty(),
                max_in_flight: n.max_in_flight,
                min_request_interval_ms: n.min_request_interval_ms,
                max_retries: n.max_retries,
            }),
            youtube: config.youtube.as_ref().map(|y| SanitizedYouTubeConfig {
                api_key_configured: !y.api_key.is_empty(),
                channel: y.channel.clone(),
            }),
            sync: config.sync.clone(),
        }
    }
}
