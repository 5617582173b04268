pub mod auth;
pub mod config;
pub mod metrics;
pub mod notion;
pub mod orchestrator;
pub mod sonarr;
pub mod testing;
pub mod youtube;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, NotionConfig, SanitizedConfig, ServerConfig, SonarrConfig, SyncConfig,
    YouTubeConfig,
};
pub use notion::{
    format_property, ChildTable, NotionClient, NotionError, Page, PropertyFilter, PropertyKind,
    QueryResponse, RequestGate, TableDirectory, TableSync, TabularStore,
};
pub use orchestrator::{
    CatalogSyncOutcome, StatsSyncOutcome, SyncError, SyncOrchestrator, SyncStatus,
};
pub use sonarr::{
    CalendarEntry, CatalogCache, Episode, Season, Series, SeriesCatalog, SeriesImage,
    SonarrClient, SonarrError, WebhookPayload, WebhookReconciler,
};
pub use youtube::{ChannelMetrics, ChannelStats, VideoStats, YouTubeClient, YouTubeError};
