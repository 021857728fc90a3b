//! API key management: create, list, soft-revoke.
//!
//! Only a SHA-256 digest of the key is stored; the cleartext value is
//! returned once from the create call and never again.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::shared::schema::api_keys;
use crate::shared::state::AppState;
use crate::shared::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = api_keys)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

pub fn digest_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let key = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::days(state.config.security.api_key_ttl_days);

    let api_key = ApiKey {
        id: Uuid::new_v4(),
        user_id: user.id,
        key_hash: digest_key(&key),
        created_at: now,
        expires_at,
        is_active: true,
    };

    diesel::insert_into(api_keys::table)
        .values(&api_key)
        .execute(&mut conn)?;

    Ok(Json(json!({
        "api_key": key,
        "expires_at": expires_at,
    })))
}

pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<ApiKeyInfo>>, ApiError> {
    let mut conn = state.conn.get()?;

    let keys: Vec<ApiKey> = api_keys::table
        .filter(api_keys::user_id.eq(user.id))
        .order(api_keys::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(
        keys.into_iter()
            .map(|k| ApiKeyInfo {
                id: k.id,
                created_at: k.created_at,
                expires_at: k.expires_at,
                is_active: k.is_active,
            })
            .collect(),
    ))
}

/// Soft revoke. Revoking an already revoked key succeeds again; the 404 is
/// only for keys that don't exist or belong to someone else.
pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(key_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;

    let key: Option<ApiKey> = api_keys::table
        .filter(api_keys::id.eq(key_id))
        .filter(api_keys::user_id.eq(user.id))
        .first(&mut conn)
        .optional()?;
    if key.is_none() {
        return Err(ApiError::NotFound("API key not found".to_string()));
    }

    diesel::update(api_keys::table.filter(api_keys::id.eq(key_id)))
        .set(api_keys::is_active.eq(false))
        .execute(&mut conn)?;

    Ok(Json(json!({ "message": "API key revoked successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_not_cleartext() {
        let key = "0b5a2c1c-3f44-4e93-b2de-1f3a3e1c2d4b";
        assert_eq!(digest_key(key), digest_key(key));
        assert_ne!(digest_key(key), key);
        assert_eq!(digest_key(key).len(), 64);
    }
}
