use crate::{
    auth::{
        password::{hash_password_blocking, verify_password_blocking},
        AuthResponse, AuthenticatedUser, LoginRequest, SignupRequest,
    },
    error::AppError,
    models::{user::normalize_email, User},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

fn invalid_credentials() -> AppError {
    AppError::BadRequest("Invalid credentials".into())
}

/// Register a new user
///
/// Creates a new account and returns a bearer token with the user record.
///
/// ## Responses:
/// - `201 Created`: `{token, user}`.
/// - `400 Bad Request`: invalid fields, or "User already exists".
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let request = signup_data.into_inner().normalized();
    request.validate()?;

    if state.store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password_blocking(request.password, state.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(User::new(request.email, password_hash))
        .await?;
    log::info!("registered user {}", user.id);

    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login user
///
/// Unknown email and wrong password produce the same 400 "Invalid credentials".
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();

    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

/// The authenticated caller's user record. Mounted behind `AuthMiddleware`.
pub async fn me(user: AuthenticatedUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(user.0))
}
