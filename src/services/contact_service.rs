use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::contacts::{CreateContactRequest, UpdateContactRequest},
    entity::contacts::{ActiveModel, Column, Entity as Contacts, Model as ContactModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, ContactStatus},
    response::{ApiResponse, Empty},
    state::AppState,
    validation,
};

const NAME_MAX: usize = 50;
const SUBJECT_MAX: usize = 100;
const MESSAGE_MAX: usize = 1000;

pub async fn create_contact(
    state: &AppState,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let name = validation::required(payload.name, "Please add your name")?;
    validation::max_chars(&name, NAME_MAX, "Name")?;
    let email = validation::required(payload.email, "Please add your email")?;
    validation::email(&email)?;
    let subject = validation::required(payload.subject, "Please add a subject")?;
    validation::max_chars(&subject, SUBJECT_MAX, "Subject")?;
    let message = validation::required(payload.message, "Please add your message")?;
    validation::max_chars(&message, MESSAGE_MAX, "Message")?;

    let contact = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        subject: Set(subject),
        message: Set(message),
        status: Set(ContactStatus::New),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(contact_id = %contact.id, "contact message received");
    Ok(ApiResponse::success(
        "Message received",
        contact_from_entity(contact),
    ))
}

pub async fn list_contacts(state: &AppState) -> AppResult<ApiResponse<Vec<Contact>>> {
    let contacts = Contacts::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_from_entity)
        .collect();
    Ok(ApiResponse::list("Contacts", contacts))
}

pub async fn get_contact(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Contact>> {
    let contact = find_contact(state, id).await?;
    Ok(ApiResponse::success("OK", contact_from_entity(contact)))
}

/// A status change is applied on its own; otherwise the message fields are
/// edited in place.
pub async fn update_contact(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let existing = find_contact(state, id).await?;
    let mut active: ActiveModel = existing.into();

    if let Some(status) = payload.status {
        active.status = Set(status);
    } else {
        if let Some(name) = payload.name {
            let name = validation::required(Some(name), "Please add your name")?;
            validation::max_chars(&name, NAME_MAX, "Name")?;
            active.name = Set(name);
        }
        if let Some(email) = payload.email {
            let email = validation::required(Some(email), "Please add your email")?;
            validation::email(&email)?;
            active.email = Set(email);
        }
        if let Some(subject) = payload.subject {
            let subject = validation::required(Some(subject), "Please add a subject")?;
            validation::max_chars(&subject, SUBJECT_MAX, "Subject")?;
            active.subject = Set(subject);
        }
        if let Some(message) = payload.message {
            let message = validation::required(Some(message), "Please add your message")?;
            validation::max_chars(&message, MESSAGE_MAX, "Message")?;
            active.message = Set(message);
        }
    }

    let contact = active.update(&state.orm).await?;
    tracing::info!(contact_id = %contact.id, status = ?contact.status, by = %admin.user_id, "contact updated");
    Ok(ApiResponse::success("Contact updated", contact_from_entity(contact)))
}

pub async fn delete_contact(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Empty>> {
    let result = Contacts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Contact not found".into()));
    }
    tracing::info!(contact_id = %id, "contact deleted");
    Ok(ApiResponse::success("Contact deleted", Empty {}))
}

async fn find_contact(state: &AppState, id: Uuid) -> AppResult<ContactModel> {
    Contacts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".into()))
}

fn contact_from_entity(model: ContactModel) -> Contact {
    Contact {
        id: model.id,
        name: model.name,
        email: model.email,
        subject: model.subject,
        message: model.message,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
