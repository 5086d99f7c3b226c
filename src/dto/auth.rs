use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PublicUser;

/// Any `role` sent by the client is ignored; new accounts are always `user`.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    /// Honoured only for admins.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
