use std::sync::Arc;

use crate::config::AppConfig;
use crate::email::analyzer::{EmailAnalyzer, Mailbox};
use crate::scoring::LeadScorer;
use crate::shared::utils::DbPool;

/// Explicitly constructed application services, built once during startup
/// and shared with every handler through `Arc<AppState>`. No module-level
/// singletons.
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub lead_scorer: Arc<dyn LeadScorer>,
    pub email_analyzer: Arc<dyn EmailAnalyzer>,
    pub mailbox: Arc<dyn Mailbox>,
}
