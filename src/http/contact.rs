use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{parse_id, AppState};
use crate::domain::aggregates::{ContactMessage, MessageStatus};
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "subject is required"))]
    subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    status: Option<MessageStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "reply is required"))]
    reply: String,
}

pub async fn submit(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<ContactRequest>) -> Result<impl IntoResponse> {
    let message = ContactMessage::new(req.name, req.email, req.subject, req.message);
    s.db.contacts().insert(&message).await?;
    info!(message_id = %message.id, "Contact message received");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Message sent successfully!" }))))
}

pub async fn list(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let messages = s.db.contacts().list_all().await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub async fn list_by_email(State(s): State<AppState>, Path(email): Path<String>) -> Result<impl IntoResponse> {
    let messages = s.db.contacts().list_by_email(&email).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub async fn unread_count(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let count = s.db.contacts().unread_count().await?;
    Ok(Json(json!({ "success": true, "count": count })))
}

pub async fn set_status(
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "message")?;
    let status = req.status.ok_or_else(|| StoreError::validation("status is required"))?;
    let contact = s.db.contacts().set_status(id, status).await?.ok_or_else(|| StoreError::not_found("Message"))?;
    Ok(Json(json!({ "success": true, "message": "Status updated", "contact": contact })))
}

pub async fn reply(
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ReplyRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "message")?;
    let mut contact = s.db.contacts().get(id).await?.ok_or_else(|| StoreError::not_found("Message"))?;
    contact.reply(req.reply);
    if !s.db.contacts().save(&contact).await? {
        return Err(StoreError::not_found("Message"));
    }
    Ok(Json(json!({ "success": true, "message": "Reply sent", "contact": contact })))
}

pub async fn remove(State(s): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "message")?;
    if !s.db.contacts().delete(id).await? {
        return Err(StoreError::not_found("Message"));
    }
    Ok(Json(json!({ "success": true, "message": "Message deleted" })))
}
