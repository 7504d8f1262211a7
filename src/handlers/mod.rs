pub mod attendance;
pub mod catalog;
pub mod common;
pub mod reports;
pub mod unloading;

use crate::{config::AppConfig, db::DbPool};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub unloading: Arc<crate::services::unloading::UnloadingService>,
    pub ledgers: Arc<crate::services::day_ledger::DayLedgerService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub attendance: Arc<crate::services::attendance::AttendanceService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: Arc<AppConfig>) -> Self {
        let catalog = Arc::new(crate::services::catalog::CatalogService::new(
            db_pool.clone(),
            config.clone(),
        ));
        let unloading = Arc::new(crate::services::unloading::UnloadingService::new(
            db_pool.clone(),
            config,
        ));
        let ledgers = Arc::new(crate::services::day_ledger::DayLedgerService::new(
            db_pool.clone(),
        ));
        let reports = Arc::new(crate::services::reports::ReportService::new(
            db_pool.clone(),
        ));
        let attendance = Arc::new(crate::services::attendance::AttendanceService::new(
            db_pool,
        ));

        Self {
            catalog,
            unloading,
            ledgers,
            reports,
            attendance,
        }
    }
}
