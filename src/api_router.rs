use std::sync::Arc;

use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shared::state::AppState;
use crate::{assistant, auth, email, leads, opportunities, tasks};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::configure_auth_routes())
        .merge(leads::configure_lead_routes())
        .merge(opportunities::configure_opportunity_routes())
        .merge(tasks::configure_task_routes())
        .merge(email::configure_email_routes())
        .merge(assistant::configure_assistant_routes())
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
