use admissions::config::LifecycleKind;
use admissions::workflows::admissions::{
    admissions_router, AdmissionsService, ApplicationStatus, InMemoryAdmissionsStore,
    InscriptionStatus,
};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApplicationService =
    AdmissionsService<ApplicationStatus, InMemoryAdmissionsStore<ApplicationStatus>>;
pub(crate) type InscriptionService =
    AdmissionsService<InscriptionStatus, InMemoryAdmissionsStore<InscriptionStatus>>;

pub(crate) fn application_service() -> Arc<ApplicationService> {
    Arc::new(AdmissionsService::standard(Arc::new(
        InMemoryAdmissionsStore::default(),
    )))
}

pub(crate) fn inscription_service() -> Arc<InscriptionService> {
    Arc::new(AdmissionsService::standard(Arc::new(
        InMemoryAdmissionsStore::default(),
    )))
}

/// One router per configured lifecycle, each over its own store.
pub(crate) fn lifecycle_routes(kinds: &[LifecycleKind]) -> Router {
    kinds.iter().fold(Router::new(), |router, kind| {
        let mounted = match kind {
            LifecycleKind::Application => {
                admissions_router(application_service(), kind.base_path())
            }
            LifecycleKind::Inscription => {
                admissions_router(inscription_service(), kind.base_path())
            }
        };
        router.merge(mounted)
    })
}
