use axum::{
    Json, Router,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    auth::{hash_password, issue_session_token, verify_password},
    booking::error::BookingError,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::*,
};

const MAX_USERNAME_LEN: usize = 64;
const MIN_PASSWORD_LEN: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.full_name.trim().is_empty() {
        return Err(ApiError::validation("username and fullName are required"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "username is too long (max {MAX_USERNAME_LEN})"
        )));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates a PATIENT account.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    validate_registration(&req)?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::Internal("password hashing failed".into())
    })?;

    sqlx::query(
        r#"
        INSERT INTO app_user (username, full_name, password_hash, roles)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(req.username.trim())
    .bind(req.full_name.trim())
    .bind(&password_hash)
    .bind(ROLE_PATIENT)
    .execute(&state.db)
    .await
    .map_err(|e| match BookingError::from(e) {
        BookingError::Conflict(_) => {
            ApiError::Conflict("USERNAME_TAKEN", "Username already exists".into())
        }
        other => other.into(),
    })?;

    tracing::info!(username = req.username.trim(), "patient registered");

    Ok(Json(MessageResponse {
        message: "User registered successfully".into(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let user: UserRow = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, username, full_name, password_hash, roles, is_active
        FROM app_user
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::from)?
    .ok_or_else(ApiError::invalid_credentials)?;

    if !user.is_active {
        return Err(ApiError::Forbidden("FORBIDDEN", "Account is disabled".into()));
    }

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let issued = issue_session_token();
    let expires_at = Utc::now() + Duration::hours(state.session_ttl_hours);

    let session: SessionTokenRow = sqlx::query_as::<_, SessionTokenRow>(
        r#"
        INSERT INTO session_token
            (session_token_id, user_id, session_token_hash, device_name, expires_at)
        VALUES
            ($1, $2, $3, $4, $5)
        RETURNING session_token_id, expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(&issued.token_hash)
    .bind(req.device_name.as_deref())
    .bind(expires_at)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::from)?;

    tracing::info!(
        user_id = user.user_id,
        session_token_id = %session.session_token_id,
        "login"
    );

    Ok(Json(LoginResponse {
        token: issued.token,
        role: role_to_string(user.roles),
        username: user.username,
        expires_at: session.expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    sqlx::query(
        r#"
        UPDATE session_token
        SET revoked_at = now()
        WHERE session_token_id = $1
          AND revoked_at IS NULL
        "#,
    )
    .bind(auth.session_token_id)
    .execute(&state.db)
    .await
    .map_err(ApiError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(auth: AuthContext) -> Json<UserProfile> {
    Json(UserProfile {
        id: auth.user_id,
        username: auth.username,
        full_name: auth.full_name,
        role: role_to_string(auth.role),
    })
}
