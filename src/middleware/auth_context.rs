use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use crate::auth::hash_access_token;
use crate::error::ApiError;
use crate::models::{AppState, CallerIdentity, ROLE_ADMIN, ROLE_PATIENT};

/// Identity resolved from the request's bearer session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: i16,
    pub username: String,
    pub full_name: String,
    pub session_token_id: Uuid,
}

impl AuthContext {
    pub fn caller(&self) -> CallerIdentity {
        CallerIdentity {
            user_id: self.user_id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
        }
    }

    pub fn require_patient(&self) -> Result<CallerIdentity, ApiError> {
        if self.role == ROLE_PATIENT {
            Ok(self.caller())
        } else {
            Err(ApiError::Forbidden(
                "FORBIDDEN",
                "Only patients can book or list their appointments".into(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == ROLE_ADMIN {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "FORBIDDEN",
                "Only administrators can manage appointments".into(),
            ))
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionLookupRow {
    session_token_id: Uuid,
    user_id: i64,
    roles: i16,
    username: String,
    full_name: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let token_hash = hash_access_token(authz.token());

            let row: SessionLookupRow = sqlx::query_as::<_, SessionLookupRow>(
                r#"
                SELECT st.session_token_id, st.user_id, u.roles, u.username, u.full_name
                FROM session_token st
                JOIN app_user u ON u.user_id = st.user_id
                WHERE st.session_token_hash = $1
                  AND st.revoked_at IS NULL
                  AND st.expires_at > now()
                  AND u.is_active = true
                "#,
            )
            .bind(&token_hash)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(ApiError::session_expired)?;

            // best-effort
            let _ = sqlx::query(
                r#"
                UPDATE session_token
                SET last_seen_at = now()
                WHERE session_token_id = $1
                "#,
            )
            .bind(row.session_token_id)
            .execute(&state.db)
            .await;

            Ok(AuthContext {
                user_id: row.user_id,
                role: row.roles,
                username: row.username,
                full_name: row.full_name,
                session_token_id: row.session_token_id,
            })
        }
    }
}
