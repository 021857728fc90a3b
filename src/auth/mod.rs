//! Authentication: registration, login/logout, cookie sessions, API keys.

pub mod api_keys;
pub mod password;
pub mod session;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::shared::schema::users;
use crate::shared::state::AppState;
use crate::shared::ApiError;

use password::{hash_password, verify_password};
use session::{create_session, destroy_session, CurrentUser, SESSION_COOKIE};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let existing: Option<Uuid> = users::table
        .filter(users::email.eq(&req.email))
        .select(users::id)
        .first(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        password_hash: hash_password(&req.password)?,
        created_at: Utc::now(),
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)?;

    Ok(Json(json!({
        "message": "Registration successful",
        "user_id": user.id,
    })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let user: Option<User> = users::table
        .filter(users::email.eq(&req.email))
        .first(&mut conn)
        .optional()?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let session = create_session(&mut conn, user.id, state.config.security.session_ttl_days)?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);

    tracing::info!(user_id = %user.id, "login");

    Ok(Json(json!({
        "message": "Login successful",
        "user_id": user.id,
    })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        destroy_session(&mut conn, cookie.value())?;
    }
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Ok(Json(json!({ "message": "Logout successful" })))
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/api-keys/:id", delete(api_keys::revoke_api_key))
}
