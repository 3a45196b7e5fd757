use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::services::AttendanceService;
use crate::store::SqliteStore;
use crate::teams::TeamsClient;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub attendance: Arc<AttendanceService>,
    pub teams: Arc<dyn TeamsClient>,
}

impl AppState {
    /// Wires the attendance service to the same database the CRUD handlers use.
    pub fn new(db: SqlitePool, reconcile_timeout: Duration, teams: Arc<dyn TeamsClient>) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        let attendance = AttendanceService::new(store.clone(), store, reconcile_timeout);
        Self {
            db,
            attendance: Arc::new(attendance),
            teams,
        }
    }
}
