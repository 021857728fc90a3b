//! Per-record ownership guard.

use uuid::Uuid;

use crate::shared::ApiError;

/// A record fetched by id must belong to the requester. Anyone else gets a
/// 403 and never sees the data.
pub fn ensure_owner(record_owner: Uuid, requester: Uuid) -> Result<(), ApiError> {
    if record_owner == requester {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Unauthorized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn the_owner_passes() {
        let user = Uuid::new_v4();
        assert!(ensure_owner(user, user).is_ok());
    }

    #[test]
    fn a_foreign_requester_gets_403_not_data() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let err = ensure_owner(owner, intruder).expect_err("must be rejected");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Unauthorized");
    }
}
