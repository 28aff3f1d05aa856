use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::CONTACT_MESSAGES;
use crate::errors::{AppError, Result};
use crate::handlers::{bson_now, parse_id, stats::monthly_stats};
use crate::models::contact_message::{
    ContactMessage, ContactMessageResponse, CreateContactMessage, UpdateResponded,
};
use crate::models::stats::MonthlyStats;
use crate::state::AppState;

fn messages(state: &AppState) -> Collection<ContactMessage> {
    state.db.collection(CONTACT_MESSAGES)
}

// POST /api/contact-messages
pub async fn create_contact_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactMessage>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let message = ContactMessage {
        _id: None,
        name: payload.name,
        email: payload.email,
        phone: payload.phone.filter(|p| !p.is_empty()),
        company: payload.company,
        subject: payload.subject,
        service_interest: payload.service_interest,
        message: payload.message,
        responded: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    messages(&state).insert_one(&message).await?;

    tracing::info!(subject = %message.subject, "Contact message received");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully." })),
    ))
}

// GET /api/contact-messages (admin)
pub async fn get_contact_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessageResponse>>> {
    let items: Vec<ContactMessage> = messages(&state)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

// PATCH /api/contact-messages/:id
pub async fn update_contact_message_responded(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateResponded>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = messages(&state)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "responded": payload.responded, "updated_at": bson_now() } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("Message"));
    }

    Ok(Json(json!({ "message": "Message updated.", "responded": payload.responded })))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = messages(&state).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Message"));
    }

    Ok(Json(json!({ "message": "message deleted successfully" })))
}

pub async fn get_contact_message_stats(
    State(state): State<AppState>,
) -> Result<Json<MonthlyStats>> {
    let stats = monthly_stats(
        state.db.collection::<Document>(CONTACT_MESSAGES),
        Some(doc! { "responded": true }),
    )
    .await?;
    Ok(Json(stats))
}
