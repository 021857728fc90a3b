//! Cookie-backed sessions and the `CurrentUser` extractor.
//!
//! Login stores a random token in `user_sessions` and mirrors it into an
//! http-only cookie. Handlers that take a `CurrentUser` argument get a 401
//! before the body runs when the cookie is missing, unknown, or expired.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::RequestPartsExt;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::shared::schema::{user_sessions, users};
use crate::shared::state::AppState;
use crate::shared::ApiError;

pub const SESSION_COOKIE: &str = "crm_session";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = user_sessions)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn create_session(
    conn: &mut PgConnection,
    user_id: Uuid,
    ttl_days: i64,
) -> Result<Session, diesel::result::Error> {
    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4(),
        user_id,
        token: Uuid::new_v4().to_string(),
        created_at: now,
        expires_at: now + Duration::days(ttl_days),
    };

    diesel::insert_into(user_sessions::table)
        .values(&session)
        .execute(conn)?;

    Ok(session)
}

pub fn destroy_session(
    conn: &mut PgConnection,
    session_token: &str,
) -> Result<(), diesel::result::Error> {
    diesel::delete(user_sessions::table.filter(user_sessions::token.eq(session_token)))
        .execute(conn)?;
    Ok(())
}

/// The authenticated principal for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);

        let cookies = parts
            .extract::<Cookies>()
            .await
            .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))?;
        let token = cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let mut conn = state.conn.get()?;

        let session: Option<Session> = user_sessions::table
            .filter(user_sessions::token.eq(&token))
            .first(&mut conn)
            .optional()?;
        let Some(session) = session else {
            return Err(ApiError::Unauthorized("Authentication required".to_string()));
        };

        if session.expires_at < Utc::now() {
            destroy_session(&mut conn, &token)?;
            return Err(ApiError::Unauthorized("Session expired".to_string()));
        }

        let email: String = users::table
            .filter(users::id.eq(session.user_id))
            .select(users::email)
            .first(&mut conn)
            .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(CurrentUser {
            id: session.user_id,
            email,
        })
    }
}
