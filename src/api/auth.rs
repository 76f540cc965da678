//! Identity lifecycle: registration, email verification, login, sessions.
//!
//! Sessions are bearer tokens; only a SHA-256 hash of the token is stored.
//! Verification codes are 6-digit numeric, expire after 10 minutes and are
//! deleted after successful use.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::db::{
    roles, LoginRequest, LoginResponse, RegisterRequest, ResendCodeRequest, Session, User,
    UserResponse, VerificationCode, VerifyRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_name, validate_password};

/// Verification codes expire after this many minutes.
const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a 6-digit numeric verification code
fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000u32))
}

/// Persist a fresh verification code for a user, replacing any outstanding one.
async fn issue_verification_code(
    db: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<String, sqlx::Error> {
    sqlx::query("DELETE FROM verification_codes WHERE user_id = ?")
        .bind(user_id)
        .execute(db)
        .await?;

    let code = generate_verification_code();
    let expires_at = (chrono::Utc::now()
        + chrono::Duration::minutes(VERIFICATION_CODE_TTL_MINUTES))
    .to_rfc3339();

    sqlx::query(
        "INSERT INTO verification_codes (id, user_id, code, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&code)
    .bind(&expires_at)
    .execute(db)
    .await?;

    Ok(code)
}

/// Create a session for a user and return the plain token.
async fn create_session(
    db: &sqlx::SqlitePool,
    user_id: &str,
    session_days: i64,
) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(session_days)).to_rfc3339();

    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(db)
        .await?;

    Ok(token)
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    errors.finish()
}

/// Register a new (unverified) user and send the verification code.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_register_request(&req)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, student_id, role, is_verified, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.name)
    .bind(&req.student_id)
    .bind(roles::STUDENT)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let code = issue_verification_code(&state.db, &id).await?;
    if let Err(e) = state
        .mail
        .send_verification_code(&req.email, &req.name, &code, VERIFICATION_CODE_TTL_MINUTES)
        .await
    {
        // The account exists and the code can be resent; do not fail the request
        tracing::error!("Failed to send verification email to {}: {}", req.email, e);
    }

    tracing::info!("Registered new user {}", req.email);

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Confirm an email address with a verification code.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("No account with this email"))?;

    if user.is_verified {
        return Err(ApiError::bad_request("Account is already verified"));
    }

    let code: Option<VerificationCode> = sqlx::query_as(
        "SELECT * FROM verification_codes WHERE user_id = ? AND expires_at > ?",
    )
    .bind(&user.id)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_optional(&state.db)
    .await?;

    let code = code.ok_or_else(|| ApiError::bad_request("Invalid or expired verification code"))?;

    // Constant-time comparison to prevent timing attacks
    let submitted = req.code.trim().as_bytes();
    let stored = code.code.as_bytes();
    if submitted.len() != stored.len() || !bool::from(submitted.ct_eq(stored)) {
        return Err(ApiError::bad_request("Invalid or expired verification code"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query("UPDATE users SET is_verified = 1, updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    // Single-use: delete after success
    sqlx::query("DELETE FROM verification_codes WHERE id = ?")
        .bind(&code.id)
        .execute(&state.db)
        .await?;

    tracing::info!("Verified account {}", user.email);

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&user.id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Replace any outstanding verification code and resend it.
pub async fn resend_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResendCodeRequest>,
) -> Result<StatusCode, ApiError> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("No account with this email"))?;

    if user.is_verified {
        return Err(ApiError::bad_request("Account is already verified"));
    }

    let code = issue_verification_code(&state.db, &user.id).await?;
    state
        .mail
        .send_verification_code(&user.email, &user.name, &code, VERIFICATION_CODE_TTL_MINUTES)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send verification email to {}: {}", user.email, e);
            ApiError::internal("Failed to send verification email")
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if !user.is_verified {
        return Err(ApiError::forbidden("Email address is not verified"));
    }

    let token = create_session(&state.db, &user.id, state.config.auth.session_days).await?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Validate token endpoint
pub async fn validate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<StatusCode, ApiError> {
    let token = match extract_token(request.headers()) {
        Some(t) => t,
        None => return Ok(StatusCode::UNAUTHORIZED),
    };

    let token_hash = hash_token(&token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?",
    )
    .bind(&token_hash)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_optional(&state.db)
    .await?;

    Ok(match session {
        Some(_) => StatusCode::OK,
        None => StatusCode::UNAUTHORIZED,
    })
}

/// Auth middleware that validates bearer tokens on the protected nest
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let token_hash = hash_token(&token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?",
    )
    .bind(&token_hash)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_optional(&state.db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match session {
        Some(_) => Ok(next.run(request).await),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Extract the bearer token from request headers
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok())?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
        .or_else(|| Some(auth_header.to_string()))
}

/// Resolve the user behind a session token
pub async fn get_current_user(
    pool: &sqlx::SqlitePool,
    token: &str,
) -> Result<User, StatusCode> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?",
    )
    .bind(&token_hash)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_optional(pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let session = session.ok_or(StatusCode::UNAUTHORIZED)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    user.ok_or(StatusCode::UNAUTHORIZED)
}

/// Extractor for getting the current authenticated user from a request
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;
        get_current_user(&state.db, &token).await
    }
}

/// Require the admin role on an already-authenticated user.
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin role required"))
    }
}

/// Ensure the configured admin account exists (runs at startup).
pub async fn ensure_admin_user(
    db: &sqlx::SqlitePool,
    admin_email: &str,
    admin_password: &str,
) -> anyhow::Result<()> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(roles::ADMIN)
            .fetch_optional(db)
            .await?;

    if existing.map(|c| c.0).unwrap_or(0) > 0 {
        return Ok(());
    }

    let password_hash = hash_password(admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, student_id, role, is_verified, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, ?, 1, ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(admin_email)
    .bind(&password_hash)
    .bind("Administrator")
    .bind(roles::ADMIN)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!("Created admin user {}", admin_email);
    Ok(())
}
