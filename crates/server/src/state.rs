use std::sync::Arc;

use tellysync_core::{
    Authenticator, CatalogCache, Config, SanitizedConfig, SeriesCatalog, SyncOrchestrator,
    WebhookReconciler,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    cache: Arc<CatalogCache>,
    reconciler: Arc<WebhookReconciler>,
    catalog: Option<Arc<dyn SeriesCatalog>>,
    orchestrator: Option<Arc<SyncOrchestrator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        cache: Arc<CatalogCache>,
        reconciler: Arc<WebhookReconciler>,
        catalog: Option<Arc<dyn SeriesCatalog>>,
        orchestrator: Option<Arc<SyncOrchestrator>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            cache,
            reconciler,
            catalog,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn reconciler(&self) -> &Arc<WebhookReconciler> {
        &self.reconciler
    }

    pub fn catalog(&self) -> Option<&Arc<dyn SeriesCatalog>> {
        self.catalog.as_ref()
    }

    pub fn orchestrator(&self) -> Option<&Arc<SyncOrchestrator>> {
        self.orchestrator.as_ref()
    }
}
