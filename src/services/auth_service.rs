use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    dto::auth::{
        AdminLoginRequest, AdminLoginResponse, AuthResponse, Claims, LoginRequest,
        RegisterRequest, UserSummary,
    },
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const USER_TOKEN_HOURS: i64 = 24;
const ADMIN_TOKEN_HOURS: i64 = 8;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        full_name,
        phone,
        email,
        password,
    } = payload;

    if full_name.trim().is_empty()
        || phone.trim().is_empty()
        || email.trim().is_empty()
        || password.is_empty()
    {
        return Err(AppError::BadRequest("Please fill all fields.".into()));
    }

    // Friendly pre-checks; the unique constraints below stay authoritative
    // when two registrations race.
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered.".into()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Phone number already registered.".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, full_name, phone, email, password_hash)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(full_name.trim())
    .bind(phone.trim())
    .bind(email.trim())
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email or phone already registered.".into())
        }
        _ => AppError::Db(err),
    })?;

    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_user_token(state, &user)?;
    let resp = AuthResponse {
        token,
        user: summary(&user),
    };
    Ok(ApiResponse::success("User registered", resp, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest {
        email_or_phone,
        password,
    } = payload;

    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE email = $1 OR phone = $1")
            .bind(email_or_phone.trim())
            .fetch_optional(&state.pool)
            .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    tracing::info!(user_id = %user.id, "user logged in");

    let token = issue_user_token(state, &user)?;
    let resp = AuthResponse {
        token,
        user: summary(&user),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn admin_login(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<AdminLoginResponse>> {
    if payload.username != state.config.admin_username
        || payload.password != state.config.admin_password
    {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let claims = Claims {
        sub: "admin".to_string(),
        name: None,
        email: None,
        role: "admin".to_string(),
        exp: expiry(ADMIN_TOKEN_HOURS)?,
    };
    let token = sign(&state.config.jwt_secret, &claims)?;

    tracing::info!("admin logged in");

    Ok(ApiResponse::success(
        "Login successful",
        AdminLoginResponse { token },
        Some(Meta::empty()),
    ))
}

fn issue_user_token(state: &AppState, user: &User) -> AppResult<String> {
    let claims = Claims {
        sub: user.id.to_string(),
        name: Some(user.full_name.clone()),
        email: Some(user.email.clone()),
        role: "customer".to_string(),
        exp: expiry(USER_TOKEN_HOURS)?,
    };
    sign(&state.config.jwt_secret, &claims)
}

fn expiry(hours: i64) -> AppResult<usize> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    Ok(expiration.timestamp() as usize)
}

fn sign(secret: &str, claims: &Claims) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.full_name.clone(),
        email: user.email.clone(),
    }
}
