//! Follow-up tasks emitted by the opportunity workflow.

pub mod generator;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::shared::pagination::{offset_for, page_count, page_window};
use crate::shared::schema::tasks;
use crate::shared::state::AppState;
use crate::shared::ApiError;

const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub opportunity_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub opportunity_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let (page, per_page) = page_window(query.page, query.per_page, DEFAULT_PER_PAGE);

    let total: i64 = match query.opportunity_id {
        Some(opp_id) => tasks::table
            .filter(tasks::user_id.eq(user.id))
            .filter(tasks::opportunity_id.eq(opp_id))
            .count()
            .get_result(&mut conn)?,
        None => tasks::table
            .filter(tasks::user_id.eq(user.id))
            .count()
            .get_result(&mut conn)?,
    };

    let mut items_query = tasks::table.filter(tasks::user_id.eq(user.id)).into_boxed();
    if let Some(opp_id) = query.opportunity_id {
        items_query = items_query.filter(tasks::opportunity_id.eq(opp_id));
    }

    let items: Vec<Task> = items_query
        .order(tasks::created_at.desc())
        .limit(per_page)
        .offset(offset_for(page, per_page))
        .load(&mut conn)?;

    Ok(Json(TaskListResponse {
        tasks: items,
        total,
        pages: page_count(total, per_page),
        current_page: page,
    }))
}

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/tasks", get(list_tasks))
}
