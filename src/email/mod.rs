//! Email records: listing, analysis, lead linking, mailbox sync.

pub mod analyzer;

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::shared::ownership::ensure_owner;
use crate::shared::pagination::{offset_for, page_count, page_window};
use crate::shared::schema::{emails, leads};
use crate::shared::state::AppState;
use crate::shared::ApiError;

const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = emails)]
pub struct Email {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub sender: String,
    pub subject: String,
    pub content: String,
    pub received_date: DateTime<Utc>,
    pub analysis_result: Option<serde_json::Value>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListEmailsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EmailListResponse {
    pub emails: Vec<Email>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

fn find_owned_email(
    conn: &mut PgConnection,
    email_id: Uuid,
    user_id: Uuid,
) -> Result<Email, ApiError> {
    let email: Option<Email> = emails::table.find(email_id).first(conn).optional()?;
    let Some(email) = email else {
        return Err(ApiError::NotFound("Email not found".to_string()));
    };
    ensure_owner(email.user_id, user_id)?;
    Ok(email)
}

pub async fn list_emails(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListEmailsQuery>,
) -> Result<Json<EmailListResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let (page, per_page) = page_window(query.page, query.per_page, DEFAULT_PER_PAGE);

    let total: i64 = emails::table
        .filter(emails::user_id.eq(user.id))
        .count()
        .get_result(&mut conn)?;

    let items: Vec<Email> = emails::table
        .filter(emails::user_id.eq(user.id))
        .order(emails::received_date.desc())
        .limit(per_page)
        .offset(offset_for(page, per_page))
        .load(&mut conn)?;

    Ok(Json(EmailListResponse {
        emails: items,
        total,
        pages: page_count(total, per_page),
        current_page: page,
    }))
}

pub async fn analyze_email(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(email_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    let email = find_owned_email(&mut conn, email_id, user.id)?;

    let analysis = state.email_analyzer.analyze(&email.content);
    let analysis_value = serde_json::to_value(&analysis)
        .map_err(|e| ApiError::Internal(format!("analysis serialization failed: {e}")))?;

    diesel::update(emails::table.find(email_id))
        .set((
            emails::analysis_result.eq(Some(analysis_value.clone())),
            emails::analyzed_at.eq(Some(Utc::now())),
        ))
        .execute(&mut conn)?;

    Ok(Json(json!({
        "email_id": email.id,
        "analysis_result": analysis_value,
    })))
}

pub async fn link_email_to_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((email_id, lead_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let email = find_owned_email(&mut conn, email_id, user.id)?;

    let lead_owner: Option<Uuid> = leads::table
        .find(lead_id)
        .select(leads::user_id)
        .first(&mut conn)
        .optional()?;
    let Some(lead_owner) = lead_owner else {
        return Err(ApiError::NotFound("Lead not found".to_string()));
    };
    ensure_owner(lead_owner, user.id)?;

    diesel::update(emails::table.find(email_id))
        .set(emails::lead_id.eq(Some(lead_id)))
        .execute(&mut conn)?;

    Ok(Json(json!({
        "email_id": email.id,
        "lead_id": lead_id,
        "message": "Email successfully linked to lead",
    })))
}

/// Pulls new messages from the mailbox into the store. Mailbox failures are
/// the one place an external error message is passed through to the client.
pub async fn sync_emails(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let fetched = state
        .mailbox
        .fetch_new(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut conn = state.conn.get()?;

    let new_emails: Vec<Email> = fetched
        .into_iter()
        .map(|incoming| Email {
            id: Uuid::new_v4(),
            user_id: user.id,
            lead_id: None,
            sender: incoming.sender,
            subject: incoming.subject,
            content: incoming.content,
            received_date: incoming.received_date,
            analysis_result: None,
            analyzed_at: None,
        })
        .collect();

    if !new_emails.is_empty() {
        diesel::insert_into(emails::table)
            .values(&new_emails)
            .execute(&mut conn)?;
    }

    Ok(Json(json!({
        "message": "Email sync completed",
        "new_emails_count": new_emails.len(),
        "new_emails": new_emails,
    })))
}

pub fn configure_email_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/emails", get(list_emails))
        .route("/api/emails/sync", post(sync_emails))
        .route("/api/emails/:id/analyze", post(analyze_email))
        .route("/api/emails/:id/link-lead/:lead_id", post(link_email_to_lead))
}
