use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use storefront_db::Database;
use storefront_db::models::NewUser;
use storefront_types::api::{Claims, LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse};
use storefront_types::models::UserRole;
use storefront_types::validation::ValidationErrors;

use crate::blob::BlobStore;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::views;

const TOKEN_LIFETIME_DAYS: i64 = 30;
const INVALID_CREDENTIALS: &str = "Invalid username or password";
const USERNAME_TAKEN: &str = "Username is already taken";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub blobs: Arc<dyn BlobStore>,
}

fn check_registration(req: &RegisterRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        errors.push("Username must be between 3 and 32 characters");
    }
    if req.password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters");
    }
    if !req.email.contains('@') {
        errors.push("A valid email address is required");
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str, role: UserRole) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Creates the account (role CUSTOMER) and returns its id.
pub fn register_user(db: &Database, req: &RegisterRequest) -> Result<Uuid, ApiError> {
    check_registration(req)?;

    if db
        .get_user_by_username(&req.username)
        .map_err(ApiError::database("Failed to create account"))?
        .is_some()
    {
        return Err(ApiError::Conflict(USERNAME_TAKEN));
    }

    let password_hash = hash_password(&req.password).map_err(ApiError::database("Failed to create account"))?;
    let user_id = Uuid::new_v4();
    let id = user_id.to_string();
    let display_name = req.display_name.as_deref().unwrap_or(&req.username);

    db.create_user(&NewUser {
        id: &id,
        username: &req.username,
        password_hash: &password_hash,
        email: &req.email,
        first_name: req.first_name.as_deref().unwrap_or_default(),
        last_name: req.last_name.as_deref().unwrap_or_default(),
        display_name,
        postcode: req.postcode.as_deref().unwrap_or_default(),
        country: req.country.as_deref().unwrap_or_default(),
        role: UserRole::Customer.as_str(),
    })
    .map_err(create_account_error)?;

    info!("Registered user {} ({})", req.username, user_id);
    Ok(user_id)
}

/// A concurrent registration can still take the name between the lookup and
/// the insert; the UNIQUE constraint then decides.
fn create_account_error(err: anyhow::Error) -> ApiError {
    if storefront_db::is_unique_violation(&err) {
        ApiError::Conflict(USERNAME_TAKEN)
    } else {
        ApiError::database("Failed to create account")(err)
    }
}

/// Checks credentials and returns the account's id and role.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<(Uuid, UserRole), ApiError> {
    let user = db
        .get_user_by_username(username)
        .map_err(ApiError::database("Failed to log in"))?
        .ok_or(ApiError::Auth(INVALID_CREDENTIALS))?;

    if !verify_password(password, &user.password) {
        return Err(ApiError::Auth(INVALID_CREDENTIALS));
    }

    let user_id = user.id.parse().map_err(|e| ApiError::Database {
        message: "Failed to log in",
        cause: anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e),
    })?;
    let role = views::role(&user.role).map_err(ApiError::database("Failed to log in"))?;
    Ok((user_id, role))
}

/// Makes sure a SUPERADMIN account with these credentials exists. An existing
/// account of that name is promoted and its password reset.
pub fn ensure_superadmin(db: &Database, username: &str, password: &str, email: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    if let Some(existing) = db.get_user_by_username(username)? {
        db.set_user_role(&existing.id, UserRole::Superadmin.as_str())?;
        db.set_user_password(&existing.id, &password_hash)?;
        info!("Promoted existing user {} to SUPERADMIN", username);
        return Ok(existing.id.parse()?);
    }

    let user_id = Uuid::new_v4();
    let id = user_id.to_string();
    db.create_user(&NewUser {
        id: &id,
        username,
        password_hash: &password_hash,
        email,
        first_name: "",
        last_name: "",
        display_name: username,
        postcode: "",
        country: "",
        role: UserRole::Superadmin.as_str(),
    })?;
    info!("Created SUPERADMIN account {}", username);
    Ok(user_id)
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user_id = blocking(move || register_user(&db.db, &req)).await?;

    let token = create_token(&state.jwt_secret, user_id, &username, UserRole::Customer)
        .map_err(|cause| ApiError::Database { message: "Failed to create account", cause })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let (user_id, role) = blocking(move || authenticate(&db.db, &req.username, &req.password)).await?;

    let token = create_token(&state.jwt_secret, user_id, &username, role)
        .map_err(|cause| ApiError::Database { message: "Failed to log in", cause })?;

    Ok(Json(LoginResponse {
        success: true,
        user_id,
        username,
        role,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user.id.to_string();
    let row = blocking(move || db.db.get_user_by_id(&id).map_err(ApiError::database("Failed to load profile")))
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let user = views::session_user(row).map_err(ApiError::database("Failed to load profile"))?;
    Ok(Json(MeResponse { success: true, user }))
}
