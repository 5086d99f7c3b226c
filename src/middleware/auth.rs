use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use sea_orm::ActiveEnum;
use uuid::Uuid;

use crate::{
    entity::users,
    error::AppError,
    models::Role,
    services::auth_service,
    state::AppState,
};

pub const TOKEN_COOKIE: &str = "token";
const MISSING_TOKEN: &str = "Not authorized to access this route. Please login.";

/// Identity resolved from a verified session token, re-read from the user
/// store on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn authorize(&self, allowed: &[Role]) -> Result<(), AppError> {
        if !allowed.contains(&self.role) {
            let role = self.role.to_value();
            return Err(AppError::Forbidden(format!(
                "User role {role} is not authorized to access this route"
            )));
        }
        Ok(())
    }

    /// Owners may act on their own records; admins on anyone's.
    pub fn ensure_owner_or_admin(&self, owner_id: Uuid, message: &str) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            return Ok(());
        }
        Err(AppError::Forbidden(message.to_string()))
    }
}

impl From<users::Model> for AuthUser {
    fn from(user: users::Model) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
        }
    }
}

/// Token from `Authorization: Bearer ...`, falling back to the `token`
/// cookie. The header wins when both are present.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or_else(|| {
            tracing::debug!("no authentication token provided");
            AppError::Unauthorized(MISSING_TOKEN.into())
        })?;

        let state = AppState::from_ref(state);
        let user = auth_service::verify_token(&state, &token).await?;
        Ok(AuthUser::from(user))
    }
}

/// An authenticated user holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.authorize(&[Role::Admin])?;
        Ok(AdminUser(user))
    }
}
