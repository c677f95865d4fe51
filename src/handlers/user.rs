use bcrypt::{hash, verify, DEFAULT_COST};
use crate::dtos::user::{RegisterUserRequest, UpdateProfileRequest, UserResponse, LoginRequest, LoginResponse};
use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::config::jwt_secret;
use crate::error::AppError;
use crate::models::user::User;
use axum::{extract::State, Json};
use crate::state::AppState;
use crate::middleware::auth::AuthContext;
use axum::extract::Extension;

const MIN_PASSWORD_LEN: usize = 6;

fn unique_username(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return AppError::conflict("Username already exists");
        }
    }
    AppError::db(e)
}

/// Checks a profile update and returns the trimmed username plus the new
/// password, if any. Usernames may not contain whitespace.
fn validate_profile(req: &UpdateProfileRequest) -> Result<(&str, Option<&str>), AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::validation("Username must not contain spaces"));
    }
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    if password.is_some_and(|p| p.len() < MIN_PASSWORD_LEN) {
        return Err(AppError::validation("Password too short"));
    }
    Ok((username, password))
}

pub async fn register_user(
    State(AppState { db_pool }): State<AppState>,
    Json(payload): Json<RegisterUserRequest>
) -> Result<(axum::http::StatusCode, Json<UserResponse>), AppError> {
    // Basic validation
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let rec = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, password_hash, is_active, created_at"#,
    )
    .bind(payload.username.trim())
    .bind(password_hash)
    .fetch_one(&db_pool)
    .await
    .map_err(unique_username)?;

    tracing::info!(user_id = rec.id, username = %rec.username, "Registered staff user");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponse {
            id: rec.id,
            username: rec.username,
            is_active: rec.is_active,
            created_at: rec.created_at,
        }),
    ))
}

pub async fn login_user(
    State(AppState { db_pool }): State<AppState>,
    Json(payload): Json<LoginRequest>
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, username, password_hash, is_active, created_at FROM users WHERE username = $1"#,
    )
    .bind(payload.username.trim())
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Invalid credentials"))?;

    if !user.is_active {
        return Err(AppError::conflict("User inactive"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::validation("Invalid credentials"));
    }

    let secret = jwt_secret()?;
    let token = sign_token(user.id, &user.username, &secret)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: (TOKEN_TTL_HOURS * 60 * 60) as usize,
    }))
}

// Authenticated endpoint: returns full user profile from DB using the id in AuthContext
pub async fn get_me(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>
) -> Result<Json<UserResponse>, AppError> {
    let rec = sqlx::query_as::<_, User>(
        r#"SELECT id, username, password_hash, is_active, created_at FROM users WHERE id = $1"#,
    )
    .bind(auth.user_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse {
        id: rec.id,
        username: rec.username,
        is_active: rec.is_active,
        created_at: rec.created_at,
    }))
}

pub async fn update_me(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let (username, password) = validate_profile(&payload)?;

    let password_hash = match password {
        Some(p) => Some(
            hash(p, DEFAULT_COST).map_err(|e| AppError::internal(format!("Hash error: {e}")))?,
        ),
        None => None,
    };

    let rec = sqlx::query_as::<_, User>(
        r#"UPDATE users
        SET username = $2, password_hash = COALESCE($3, password_hash)
        WHERE id = $1
        RETURNING id, username, password_hash, is_active, created_at"#,
    )
    .bind(auth.user_id)
    .bind(username)
    .bind(password_hash)
    .fetch_optional(&db_pool)
    .await
    .map_err(unique_username)?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = rec.id, username = %rec.username, password_changed = password.is_some(), "Profile updated");

    Ok(Json(UserResponse {
        id: rec.id,
        username: rec.username,
        is_active: rec.is_active,
        created_at: rec.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(username: &str, password: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: username.to_string(),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn profile_username_rejects_whitespace() {
        assert!(matches!(validate_profile(&update("kasir satu", None)), Err(AppError::ValidationError(_))));
        assert!(matches!(validate_profile(&update("kasir\tdua", None)), Err(AppError::ValidationError(_))));
        assert!(matches!(validate_profile(&update("   ", None)), Err(AppError::ValidationError(_))));
        assert_eq!(validate_profile(&update("  kasir1 ", None)).unwrap(), ("kasir1", None));
    }

    #[test]
    fn profile_password_is_optional_but_checked() {
        let req = update("kasir1", Some(""));
        assert_eq!(validate_profile(&req).unwrap(), ("kasir1", None));

        let req = update("kasir1", Some("rahasia"));
        assert_eq!(validate_profile(&req).unwrap(), ("kasir1", Some("rahasia")));

        assert!(matches!(validate_profile(&update("kasir1", Some("abc"))), Err(AppError::ValidationError(_))));
    }
}
