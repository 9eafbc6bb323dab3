use curriculum::catalog::JsonCatalogRepository;
use curriculum::config::AppConfig;
use curriculum::resources::{LocalFileStorage, ResourceService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type PortalService = ResourceService<JsonCatalogRepository, LocalFileStorage>;

pub(crate) fn catalog_repository(config: &AppConfig) -> JsonCatalogRepository {
    JsonCatalogRepository::new(config.storage.data_path.clone())
}

pub(crate) fn file_storage(config: &AppConfig) -> LocalFileStorage {
    LocalFileStorage::new(
        config.storage.media_root.clone(),
        config.storage.media_url.clone(),
    )
}

pub(crate) fn portal_service(config: &AppConfig) -> PortalService {
    ResourceService::new(
        Arc::new(catalog_repository(config)),
        Arc::new(file_storage(config)),
    )
}
