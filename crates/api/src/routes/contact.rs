//! Contact route handlers.
//!
//! Submission is public; everything else is admin-only. Responding to a
//! message with `status=responded` triggers the outbound email, and an
//! email failure is logged and swallowed; it never fails the update that
//! triggered it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cedarmarket_core::{ContactId, ContactStatus, Email};

use crate::db::ContactRepository;
use crate::db::contacts::NewContact;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Contact, ContactPage};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Contact-form submission payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitContactRequest {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub message: String,
}

/// Submission acknowledgement, echoing a summary of the stored message.
#[derive(Debug, Serialize)]
pub struct SubmitContactResponse {
    pub message: String,
    pub contact: ContactSummary,
}

/// The subset of a contact message echoed back to the submitter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: ContactId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// Admin list-query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ContactListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

/// Admin update payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest {
    pub status: Option<ContactStatus>,
    pub response: Option<String>,
    pub send_email_to_user: Option<bool>,
}

/// Admin update response.
#[derive(Debug, Serialize)]
pub struct UpdateContactResponse {
    pub message: String,
    pub contact: Contact,
}

/// Submit a contact-form message (public).
#[instrument(skip(state, body))]
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitContactRequest>,
) -> Result<(StatusCode, Json<SubmitContactResponse>)> {
    if body.name.trim().is_empty() || body.message.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name, email, and message are required".to_owned(),
        ));
    }

    let email = Email::parse(&body.email)
        .map_err(|_| AppError::BadRequest("Name, email, and message are required".to_owned()))?;

    let contact = ContactRepository::new(state.pool())
        .insert(NewContact {
            name: body.name.trim().to_owned(),
            email,
            phone_number: body.phone_number.filter(|p| !p.trim().is_empty()),
            message: body.message.trim().to_owned(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitContactResponse {
            message: "Thank you for contacting us! We'll get back to you soon.".to_owned(),
            contact: ContactSummary {
                id: contact.id,
                name: contact.name,
                email: contact.email,
                created_at: contact.created_at,
            },
        }),
    ))
}

/// List contact messages with status filter and pagination (admin).
#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ContactListParams>,
) -> Result<Json<ContactPage>> {
    let status = match params.status.as_deref() {
        None | Some("all") | Some("") => None,
        Some(raw) => Some(
            raw.parse::<ContactStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
    };

    let page = ContactRepository::new(state.pool())
        .list(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(10),
            status,
        )
        .await?;

    Ok(Json(page))
}

/// One contact message (admin). Reading a `new` message advances it to
/// `read`.
#[instrument(skip(state))]
pub async fn get_by_id(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Json<Contact>> {
    let repo = ContactRepository::new(state.pool());

    let mut contact = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_owned()))?;

    if contact.mark_read() {
        repo.update(&contact).await?;
    }

    Ok(Json(contact))
}

/// Update a contact message (admin); a `responded` status with a response
/// body stamps the responder and sends the reply email.
#[instrument(skip(state, body))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
    Json(body): Json<UpdateContactRequest>,
) -> Result<Json<UpdateContactResponse>> {
    let repo = ContactRepository::new(state.pool());

    let mut contact = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_owned()))?;

    if let Some(status) = body.status {
        contact.status = status;
    }

    if let Some(response) = body.response {
        if !response.is_empty() && body.status == Some(ContactStatus::Responded) {
            contact.record_response(response, admin.id);

            if body.send_email_to_user.unwrap_or(true) {
                send_response_email(&state, &contact).await;
            }
        } else {
            contact.response = response;
        }
    }

    repo.update(&contact).await?;

    Ok(Json(UpdateContactResponse {
        message: "Contact updated successfully".to_owned(),
        contact,
    }))
}

/// Delete a contact message (admin).
#[instrument(skip(state))]
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Json<MessageResponse>> {
    let deleted = ContactRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Contact not found".to_owned()));
    }

    Ok(Json(MessageResponse::new("Contact deleted successfully")))
}

/// Fire the response email, swallowing failures.
async fn send_response_email(state: &AppState, contact: &Contact) {
    let Some(mailer) = state.email() else {
        tracing::debug!("no mailer configured; skipping contact response email");
        return;
    };

    if let Err(e) = mailer
        .send_contact_response(
            &contact.email,
            &contact.name,
            &contact.message,
            &contact.response,
        )
        .await
    {
        tracing::warn!(error = %e, contact = %contact.id, "failed to send contact response email");
    }
}
