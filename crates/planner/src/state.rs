use std::sync::Arc;

use sp_domain::config::Config;

use crate::runtime::{EventSynchronizer, JsonStore, MaintenanceRunner};

/// Shared services, cheap to clone into background tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<JsonStore>,
    pub sync: Arc<EventSynchronizer>,
    pub maintenance: Arc<MaintenanceRunner>,
}
