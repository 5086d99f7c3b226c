use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::contacts::{CreateContactRequest, UpdateContactRequest},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AdminUser,
    models::Contact,
    response::{ApiResponse, Empty},
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Message received", body = ApiResponse<Contact>),
        (status = 400, description = "Missing or invalid fields")
    ),
    tag = "Contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contact>>)> {
    let resp = contact_service::create_contact(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/contacts",
    responses(
        (status = 200, description = "All contact messages", body = ApiResponse<Vec<Contact>>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<Contact>>>> {
    let resp = contact_service::list_contacts(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Get contact", body = ApiResponse<Contact>),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn get_contact(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::get_contact(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact id")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ApiResponse<Contact>),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::update_contact(&state, &admin, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Contact deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = contact_service::delete_contact(&state, id).await?;
    Ok(Json(resp))
}
