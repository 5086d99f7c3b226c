use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    middleware::auth::{AdminUser, AuthUser, TOKEN_COOKIE},
    models::UserProfile,
    response::{ApiResponse, Empty},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
}

fn session_cookie(token: &str, max_age_secs: i64) -> AppResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .map_err(AppError::internal)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user; also sets the session cookie", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = auth_service::login_user(&state, payload).await?;
    let max_age = state.tokens.ttl().num_seconds();
    let cookie = match &resp.data {
        Some(auth) => session_cookie(&auth.token, max_age)?,
        None => return Err(AppError::internal("login produced no token")),
    };
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Clears the session cookie", body = ApiResponse<Empty>)
    ),
    tag = "Auth"
)]
pub async fn logout() -> AppResult<impl IntoResponse> {
    let cookie = session_cookie("none", 0)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::success("User logged out successfully", Empty {})),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::get_me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserProfile>),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::change_password(&state, user.user_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserProfile>>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<UserProfile>>>> {
    let resp = auth_service::list_users(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/auth/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Cannot delete your own account"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::delete_user(&state, &admin, id).await?;
    Ok(Json(resp))
}
