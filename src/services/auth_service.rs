use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    },
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PublicUser, Role, UserProfile},
    response::{ApiResponse, Empty},
    state::AppState,
    token::TokenError,
    validation,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials. Please check your email and password.";
const EMAIL_TAKEN: &str = "Email already in use. Please choose another email address.";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AppError::internal)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::internal("Invalid password hash"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn conflict_on_duplicate(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(EMAIL_TAKEN.into()),
        _ => AppError::Db(err),
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let missing = "Please provide all required fields (name, email, password)";
    let name = validation::required(payload.name, missing)?;
    let email = normalize_email(&validation::required(payload.email, missing)?);
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(missing.into()))?;
    validation::password(&password, "Password must be at least 6 characters")?;
    validation::email(&email)?;

    let exist = Users::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        tracing::debug!(%email, "registration rejected: email already exists");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password(&password)?;

    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(Role::User),
        phone: Set(payload.phone.unwrap_or_default().trim().to_string()),
        address: Set(payload.address.unwrap_or_default().trim().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(conflict_on_duplicate)?;

    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let token = state.tokens.issue(user.id)?;
    Ok(ApiResponse::success(
        "User registered",
        AuthResponse {
            token,
            user: public_user(&user),
        },
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let missing = "Please provide both email and password";
    let email = normalize_email(&validation::required(payload.email, missing)?);
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(missing.into()))?;

    let user = Users::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            tracing::debug!(%email, "login rejected: unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = %user.id, "user logged in");
    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: public_user(&user),
        },
    ))
}

/// Resolves a session token to the user it was issued for. Expired,
/// invalid and orphaned tokens fail with distinct messages.
pub async fn verify_token(state: &AppState, token: &str) -> AppResult<UserModel> {
    let user_id = state.tokens.verify(token).map_err(|err| {
        tracing::debug!(reason = ?err, "token verification failed");
        match err {
            TokenError::Expired => AppError::Unauthorized("Token expired. Please login again.".into()),
            TokenError::Invalid => AppError::Unauthorized("Invalid token. Please login again.".into()),
        }
    })?;

    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            tracing::debug!(%user_id, "token refers to a missing user");
            AppError::Unauthorized("User not found. Please login again.".into())
        })
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let found = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(ApiResponse::success("OK", user_profile(found)))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let non_blank = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = non_blank(payload.name) {
        active.name = Set(name);
    }
    if let Some(phone) = non_blank(payload.phone) {
        active.phone = Set(phone);
    }
    if let Some(address) = non_blank(payload.address) {
        active.address = Set(address);
    }

    if let Some(email) = non_blank(payload.email) {
        if user.is_admin() {
            let email = normalize_email(&email);
            validation::email(&email)?;
            let taken = Users::find()
                .filter(Column::Email.eq(email.as_str()))
                .filter(Column::Id.ne(user.user_id))
                .one(&state.orm)
                .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
            active.email = Set(email);
        } else {
            tracing::debug!(user_id = %user.user_id, "ignoring email change from non-admin");
        }
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(conflict_on_duplicate)?;

    tracing::info!(user_id = %updated.id, "profile updated");
    Ok(ApiResponse::success("Profile updated", user_profile(updated)))
}

pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<Empty>> {
    let missing = "Please provide current password and new password";
    let current = payload
        .current_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(missing.into()))?;
    let new_password = payload
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(missing.into()))?;
    validation::password(&new_password, "New password must be at least 6 characters")?;

    let existing = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(&current, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let mut active: ActiveModel = existing.into();
    active.password_hash = Set(hash_password(&new_password)?);
    active.update(&state.orm).await?;

    tracing::info!(%user_id, "password changed");
    audit::record(
        &state.orm,
        Some(user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::success("Password updated successfully", Empty {}))
}

pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let users = Users::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_profile)
        .collect();
    Ok(ApiResponse::list("Users", users))
}

pub async fn delete_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    let target = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if target.id == admin.user_id {
        return Err(AppError::Validation("Cannot delete your own account".into()));
    }

    Users::delete_by_id(target.id).exec(&state.orm).await?;

    tracing::info!(user_id = %target.id, by = %admin.user_id, "user deleted");
    audit::record(
        &state.orm,
        Some(admin.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": target.id }),
    )
    .await;

    Ok(ApiResponse::success("User deleted", Empty {}))
}

fn public_user(user: &UserModel) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}

fn user_profile(user: UserModel) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        phone: user.phone,
        address: user.address,
        created_at: user.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
        assert!(verify_password("secret1", &first).unwrap());
        assert!(!verify_password("secret2", &first).unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Potter@ArtHeaven.COM "), "potter@artheaven.com");
    }
}
