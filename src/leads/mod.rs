//! Lead records and the scoring trigger.
//!
//! The score is owned by the scoring service: it is computed on create and
//! recomputed on any update that touches name, email, or company. Updates
//! that touch none of those three leave the stored score untouched.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::scoring::{LeadProfile, LeadScorer};
use crate::shared::ownership::ensure_owner;
use crate::shared::pagination::{offset_for, page_count, page_window};
use crate::shared::schema::leads;
use crate::shared::state::AppState;
use crate::shared::ApiError;

const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
}

/// Partial merge; absent fields stay as they are, unrecognized fields are
/// dropped by serde before the handler ever sees them.
#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<Lead>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

/// Enumerated sort allowlist. Anything else is a validation error, there is
/// no reflective field lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadSortField {
    Name,
    Email,
    Company,
    Phone,
    Source,
    Status,
    Score,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for LeadSortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "company" => Ok(Self::Company),
            "phone" => Ok(Self::Phone),
            "source" => Ok(Self::Source),
            "status" => Ok(Self::Status),
            "score" => Ok(Self::Score),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            _ => Err(()),
        }
    }
}

fn score_profile(scorer: &dyn LeadScorer, lead: &Lead) -> f64 {
    scorer.calculate_score(&LeadProfile {
        name: &lead.name,
        email: &lead.email,
        company: &lead.company,
        source: lead.source.as_deref(),
        status: &lead.status,
    })
}

fn find_lead(conn: &mut PgConnection, lead_id: Uuid) -> Result<Lead, ApiError> {
    let lead: Option<Lead> = leads::table.find(lead_id).first(conn).optional()?;
    lead.ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))
}

fn find_owned_lead(
    conn: &mut PgConnection,
    lead_id: Uuid,
    user_id: Uuid,
) -> Result<Lead, ApiError> {
    let lead = find_lead(conn, lead_id)?;
    ensure_owner(lead.user_id, user_id)?;
    Ok(lead)
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<LeadListResponse>, ApiError> {
    let mut conn = state.conn.get()?;

    let (page, per_page) = page_window(query.page, query.per_page, DEFAULT_PER_PAGE);
    let sort_by = query.sort_by.as_deref().unwrap_or("created_at");
    let sort = LeadSortField::from_str(sort_by)
        .map_err(|_| ApiError::BadRequest(format!("Invalid sort field: {sort_by}")))?;
    let desc = query.order.as_deref().unwrap_or("desc") != "asc";

    let scoped = state.config.lead_listing_scoped;

    let total: i64 = if scoped {
        leads::table
            .filter(leads::user_id.eq(user.id))
            .count()
            .get_result(&mut conn)?
    } else {
        leads::table.count().get_result(&mut conn)?
    };

    let mut items_query = leads::table.into_boxed();
    if scoped {
        items_query = items_query.filter(leads::user_id.eq(user.id));
    }

    items_query = match (sort, desc) {
        (LeadSortField::Name, true) => items_query.order(leads::name.desc()),
        (LeadSortField::Name, false) => items_query.order(leads::name.asc()),
        (LeadSortField::Email, true) => items_query.order(leads::email.desc()),
        (LeadSortField::Email, false) => items_query.order(leads::email.asc()),
        (LeadSortField::Company, true) => items_query.order(leads::company.desc()),
        (LeadSortField::Company, false) => items_query.order(leads::company.asc()),
        (LeadSortField::Phone, true) => items_query.order(leads::phone.desc()),
        (LeadSortField::Phone, false) => items_query.order(leads::phone.asc()),
        (LeadSortField::Source, true) => items_query.order(leads::source.desc()),
        (LeadSortField::Source, false) => items_query.order(leads::source.asc()),
        (LeadSortField::Status, true) => items_query.order(leads::status.desc()),
        (LeadSortField::Status, false) => items_query.order(leads::status.asc()),
        (LeadSortField::Score, true) => items_query.order(leads::score.desc()),
        (LeadSortField::Score, false) => items_query.order(leads::score.asc()),
        (LeadSortField::CreatedAt, true) => items_query.order(leads::created_at.desc()),
        (LeadSortField::CreatedAt, false) => items_query.order(leads::created_at.asc()),
        (LeadSortField::UpdatedAt, true) => items_query.order(leads::updated_at.desc()),
        (LeadSortField::UpdatedAt, false) => items_query.order(leads::updated_at.asc()),
    };

    let items: Vec<Lead> = items_query
        .limit(per_page)
        .offset(offset_for(page, per_page))
        .load(&mut conn)?;

    Ok(Json(LeadListResponse {
        leads: items,
        total,
        pages: page_count(total, per_page),
        current_page: page,
    }))
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let (Some(name), Some(email), Some(company)) = (req.name, req.email, req.company) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let mut conn = state.conn.get()?;
    let now = Utc::now();

    let mut lead = Lead {
        id: Uuid::new_v4(),
        user_id: user.id,
        name,
        email,
        company,
        phone: req.phone,
        source: req.source,
        status: req.status.unwrap_or_else(|| "new".to_string()),
        score: 0.0,
        created_at: now,
        updated_at: now,
    };
    lead.score = score_profile(state.lead_scorer.as_ref(), &lead);

    diesel::insert_into(leads::table)
        .values(&lead)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    let lead = find_owned_lead(&mut conn, lead_id, user.id)?;
    Ok(Json(lead))
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(lead_id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let mut conn = state.conn.get()?;
    let mut lead = find_owned_lead(&mut conn, lead_id, user.id)?;

    let rescore =
        req.name.is_some() || req.email.is_some() || req.company.is_some();

    if let Some(name) = req.name {
        lead.name = name;
    }
    if let Some(email) = req.email {
        lead.email = email;
    }
    if let Some(company) = req.company {
        lead.company = company;
    }
    if let Some(phone) = req.phone {
        lead.phone = Some(phone);
    }
    if let Some(source) = req.source {
        lead.source = Some(source);
    }
    if let Some(status) = req.status {
        lead.status = status;
    }

    // Partial updates that touch none of the scored fields skip the scorer.
    if rescore {
        lead.score = score_profile(state.lead_scorer.as_ref(), &lead);
    }
    lead.updated_at = Utc::now();

    diesel::update(leads::table.find(lead_id))
        .set(&lead)
        .execute(&mut conn)?;

    Ok(Json(lead))
}

pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(lead_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get()?;
    find_owned_lead(&mut conn, lead_id, user.id)?;

    diesel::delete(leads::table.find(lead_id)).execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", get(list_leads).post(create_lead))
        .route(
            "/api/leads/:id",
            get(get_lead).put(update_lead).delete(delete_lead),
        )
}
