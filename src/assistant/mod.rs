//! Assistant facade: sentiment-annotated messages, notification delivery,
//! and generated insights, surfaced through a small state endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::shared::schema::{ai_insights, messages, notifications};
use crate::shared::state::AppState;
use crate::shared::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub priority: String,
    pub sentiment: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = ai_insights)]
pub struct AiInsight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub confidence_score: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DeliverMessageRequest {
    pub content: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightContext {
    pub user_data: Option<serde_json::Value>,
    pub business_context: Option<serde_json::Value>,
    pub historical_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AssistantStateResponse {
    pub pending_messages: i64,
    pub pending_notifications: i64,
    pub recent_insights: Vec<AiInsight>,
}

/// 3D avatar asset for a given assistant action.
pub fn character_model(action_type: &str) -> &'static str {
    match action_type {
        "message" => "postman.glb",
        "notification" => "boss.glb",
        "insight" => "advisor.glb",
        _ => "advisor.glb",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightDraft {
    pub content: String,
    pub confidence: f64,
    pub category: String,
}

/// Deterministic insight generation from whichever context sections the
/// caller supplied. Confidence grows with the amount of context.
pub fn generate_insight(ctx: &InsightContext) -> InsightDraft {
    let mut sections = Vec::new();
    if ctx.user_data.is_some() {
        sections.push("user activity");
    }
    if ctx.business_context.is_some() {
        sections.push("business context");
    }
    if ctx.historical_data.is_some() {
        sections.push("historical data");
    }

    let category = if ctx.business_context.is_some() {
        "business"
    } else if ctx.historical_data.is_some() {
        "trend"
    } else {
        "general"
    };

    let content = if sections.is_empty() {
        "Not enough context to draw a conclusion; gather more activity data.".to_string()
    } else {
        format!("Insight derived from {}.", sections.join(", "))
    };

    InsightDraft {
        content,
        confidence: (0.4 + 0.2 * sections.len() as f64).min(1.0),
        category: category.to_string(),
    }
}

pub async fn deliver_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<DeliverMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Some(content) = req.content.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    };

    let mut conn = state.conn.get()?;
    let sentiment = state.email_analyzer.analyze(&content).sentiment;

    let message = Message {
        id: Uuid::new_v4(),
        user_id: user.id,
        content,
        priority: req.priority.unwrap_or_else(|| "normal".to_string()),
        sentiment,
        status: "pending".to_string(),
        created_at: Utc::now(),
    };

    diesel::insert_into(messages::table)
        .values(&message)
        .execute(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": message,
            "character_model": character_model("message"),
        })),
    ))
}

/// Marks a batch as delivered, mirroring the status the sweep just wrote.
fn mark_delivered(mut notifications: Vec<Notification>) -> Vec<Notification> {
    for notification in &mut notifications {
        notification.status = "delivered".to_string();
    }
    notifications
}

/// Sweeps the caller's pending notifications to delivered and returns them
/// in their delivered state.
pub async fn flush_notifications(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let pending: Vec<Notification> = notifications::table
        .filter(notifications::user_id.eq(user.id))
        .filter(notifications::status.eq("pending"))
        .order(notifications::created_at.asc())
        .load(&mut conn)?;

    diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user.id))
            .filter(notifications::status.eq("pending")),
    )
    .set(notifications::status.eq("delivered"))
    .execute(&mut conn)?;

    Ok(Json(json!({
        "notifications": mark_delivered(pending),
        "character_model": character_model("notification"),
    })))
}

pub async fn provide_insight(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(ctx): Json<InsightContext>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut conn = state.conn.get()?;

    let draft = generate_insight(&ctx);
    let insight = AiInsight {
        id: Uuid::new_v4(),
        user_id: user.id,
        content: draft.content,
        confidence_score: draft.confidence,
        category: draft.category,
        created_at: Utc::now(),
    };

    diesel::insert_into(ai_insights::table)
        .values(&insight)
        .execute(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "insight": insight,
            "character_model": character_model("insight"),
        })),
    ))
}

pub async fn assistant_state(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<AssistantStateResponse>, ApiError> {
    let mut conn = state.conn.get()?;

    let pending_messages: i64 = messages::table
        .filter(messages::user_id.eq(user.id))
        .filter(messages::status.eq("pending"))
        .count()
        .get_result(&mut conn)?;

    let pending_notifications: i64 = notifications::table
        .filter(notifications::user_id.eq(user.id))
        .filter(notifications::status.eq("pending"))
        .count()
        .get_result(&mut conn)?;

    let recent_insights: Vec<AiInsight> = ai_insights::table
        .filter(ai_insights::user_id.eq(user.id))
        .order(ai_insights::created_at.desc())
        .limit(5)
        .load(&mut conn)?;

    Ok(Json(AssistantStateResponse {
        pending_messages,
        pending_notifications,
        recent_insights,
    }))
}

pub fn configure_assistant_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/assistant/state", get(assistant_state))
        .route("/api/assistant/messages", post(deliver_message))
        .route("/api/assistant/notifications", post(flush_notifications))
        .route("/api/assistant/insights", post(provide_insight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_models_cover_all_actions() {
        assert_eq!(character_model("message"), "postman.glb");
        assert_eq!(character_model("notification"), "boss.glb");
        assert_eq!(character_model("insight"), "advisor.glb");
        assert_eq!(character_model("anything-else"), "advisor.glb");
    }

    #[test]
    fn flushed_notifications_come_back_delivered() {
        let swept = mark_delivered(vec![Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "Quota reached".to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        }]);
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].status, "delivered");
    }

    #[test]
    fn insight_confidence_grows_with_context() {
        let empty = generate_insight(&InsightContext::default());
        let full = generate_insight(&InsightContext {
            user_data: Some(json!({"logins": 4})),
            business_context: Some(json!({"segment": "smb"})),
            historical_data: Some(json!([1, 2, 3])),
        });
        assert!(full.confidence > empty.confidence);
        assert!(full.confidence <= 1.0);
    }

    #[test]
    fn business_context_wins_the_category() {
        let draft = generate_insight(&InsightContext {
            user_data: None,
            business_context: Some(json!({})),
            historical_data: Some(json!({})),
        });
        assert_eq!(draft.category, "business");

        let trend = generate_insight(&InsightContext {
            user_data: None,
            business_context: None,
            historical_data: Some(json!({})),
        });
        assert_eq!(trend.category, "trend");
    }

    #[test]
    fn insight_generation_is_deterministic() {
        let ctx = InsightContext {
            user_data: Some(json!({"a": 1})),
            business_context: None,
            historical_data: None,
        };
        assert_eq!(generate_insight(&ctx), generate_insight(&ctx));
    }
}
