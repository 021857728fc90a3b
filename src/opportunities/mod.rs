//! Opportunity records and the lifecycle events that drive task generation.
//!
//! Task generation runs exactly once per creation and once per stage write,
//! after the row is committed and before the response is serialized. A stage
//! PUT that repeats the current value still counts as a transition.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::shared::ownership::ensure_owner;
use crate::shared::pagination::{offset_for, page_count, page_window};
use crate::shared::schema::{leads, opportunities};
use crate::shared::state::AppState;
use crate::shared::utils::bd;
use crate::shared::ApiError;
use crate::tasks::generator::TaskGenerator;

const DEFAULT_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = opportunities)]
pub struct Opportunity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Uuid,
    pub title: String,
    pub amount: BigDecimal,
    pub stage: String,
    pub description: String,
    pub expected_close_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOpportunityRequest {
    pub lead_id: Option<Uuid>,
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub stage: Option<String>,
    pub description: Option<String>,
    pub expected_close_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    pub stage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOpportunitiesQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OpportunityListResponse {
    pub opportunities: Vec<Opportunity>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

fn find_owned_opportunity(
    conn: &mut PgConnection,
    opp_id: Uuid,
    user_id: Uuid,
) -> Result<Opportunity, ApiError> {
    let opp: Option<Opportunity> = opportunities::table.find(opp_id).first(conn).optional()?;
    let Some(opp) = opp else {
        return Err(ApiError::NotFound("Opportunity not found".to_string()));
    };
    ensure_owner(opp.user_id, user_id)?;
    Ok(opp)
}

pub async fn list_opportunities(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListOpportunitiesQuery>,
) -> Result<Json<OpportunityListResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let (page, per_page) = page_window(query.page, query.per_page, DEFAULT_PER_PAGE);

    let total: i64 = opportunities::table
        .filter(opportunities::user_id.eq(user.id))
        .count()
        .get_result(&mut conn)?;

    let items: Vec<Opportunity> = opportunities::table
        .filter(opportunities::user_id.eq(user.id))
        .order(opportunities::created_at.desc())
        .limit(per_page)
        .offset(offset_for(page, per_page))
        .load(&mut conn)?;

    Ok(Json(OpportunityListResponse {
        opportunities: items,
        total,
        pages: page_count(total, per_page),
        current_page: page,
    }))
}

pub async fn create_opportunity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateOpportunityRequest>,
) -> Result<(StatusCode, Json<Opportunity>), ApiError> {
    let (Some(lead_id), Some(title), Some(amount), Some(stage)) =
        (req.lead_id, req.title, req.amount, req.stage)
    else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let mut conn = state.conn.get()?;

    let lead_exists: Option<Uuid> = leads::table
        .find(lead_id)
        .select(leads::id)
        .first(&mut conn)
        .optional()?;
    if lead_exists.is_none() {
        return Err(ApiError::NotFound("Lead not found".to_string()));
    }

    let expected_close_date = match req.expected_close_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::BadRequest("Invalid expected_close_date".to_string())
        })?),
        None => None,
    };

    let now = Utc::now();
    let opportunity = Opportunity {
        id: Uuid::new_v4(),
        user_id: user.id,
        lead_id,
        title,
        amount: bd(amount),
        stage,
        description: req.description.unwrap_or_default(),
        expected_close_date,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(opportunities::table)
        .values(&opportunity)
        .execute(&mut conn)?;

    // The opportunity is durable at this point; a generator failure below
    // leaves it committed with no follow-up tasks.
    TaskGenerator::default().generate_opportunity_tasks(&mut conn, &opportunity)?;

    Ok((StatusCode::CREATED, Json(opportunity)))
}

pub async fn update_opportunity_stage(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(opp_id): Path<Uuid>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Json<Opportunity>, ApiError> {
    let mut conn = state.conn.get()?;
    let mut opportunity = find_owned_opportunity(&mut conn, opp_id, user.id)?;

    let Some(stage) = req.stage else {
        return Err(ApiError::BadRequest("Stage is required".to_string()));
    };

    // The generator only ever sees the destination stage; the previous value
    // is gone once this write lands.
    opportunity.stage = stage;
    opportunity.updated_at = Utc::now();

    diesel::update(opportunities::table.find(opp_id))
        .set((
            opportunities::stage.eq(&opportunity.stage),
            opportunities::updated_at.eq(opportunity.updated_at),
        ))
        .execute(&mut conn)?;

    TaskGenerator::default().generate_stage_change_tasks(&mut conn, &opportunity)?;

    Ok(Json(opportunity))
}

pub async fn get_opportunity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(opp_id): Path<Uuid>,
) -> Result<Json<Opportunity>, ApiError> {
    let mut conn = state.conn.get()?;
    let opportunity = find_owned_opportunity(&mut conn, opp_id, user.id)?;
    Ok(Json(opportunity))
}

pub fn configure_opportunity_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/opportunities",
            get(list_opportunities).post(create_opportunity),
        )
        .route("/api/opportunities/:id", get(get_opportunity))
        .route("/api/opportunities/:id/stage", put(update_opportunity_stage))
}
