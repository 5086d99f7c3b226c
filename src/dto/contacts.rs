use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::ContactStatus;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    pub status: Option<ContactStatus>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}
