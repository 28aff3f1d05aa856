use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::{options::ReturnDocument, Collection};
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::PUBLICATIONS;
use crate::errors::{AppError, Result};
use crate::handlers::{bson_now, parse_id};
use crate::models::publication::{
    date_to_utc, CreatePublication, Publication, PublicationResponse, UpdatePublication,
};
use crate::state::AppState;

fn publications(state: &AppState) -> Collection<Publication> {
    state.db.collection(PUBLICATIONS)
}

pub async fn create_publication(
    State(state): State<AppState>,
    Json(payload): Json<CreatePublication>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let (title, description, kind, date) =
        match (payload.title, payload.description, payload.kind, payload.date) {
            (Some(title), Some(description), Some(kind), Some(date)) => {
                (title, description, kind, date)
            }
            _ => {
                return Err(AppError::bad_request(
                    "Please provide title, description, type, and date.",
                ))
            }
        };

    let mut publication = Publication {
        _id: None,
        title,
        description,
        kind,
        file_url: payload.file_url.filter(|url| !url.is_empty()),
        file_type: payload.file_type.filter(|t| !t.is_empty()),
        date: date_to_utc(date),
        is_active: payload.is_active.unwrap_or(true),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let collection = publications(&state);
    let inserted = collection.insert_one(&publication).await?;
    publication._id = inserted.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Publication created successfully",
            "data": PublicationResponse::from(publication),
        })),
    ))
}

pub async fn get_publications(State(state): State<AppState>) -> Result<Json<Value>> {
    let items: Vec<Publication> = publications(&state)
        .find(doc! {})
        .sort(doc! { "date": -1 })
        .await?
        .try_collect()
        .await?;

    let data: Vec<PublicationResponse> = items.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "success": true, "data": data })))
}

pub async fn get_publication_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    let publication = publications(&state)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Publication"))?;

    Ok(Json(json!({
        "success": true,
        "data": PublicationResponse::from(publication),
    })))
}

pub async fn update_publication(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePublication>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let mut set = doc! { "updated_at": bson_now() };
    for (field, value) in [
        ("title", payload.title),
        ("description", payload.description),
        ("type", payload.kind),
        ("file_url", payload.file_url),
        ("file_type", payload.file_type),
    ] {
        if let Some(value) = value {
            set.insert(field, value);
        }
    }
    if let Some(date) = payload.date {
        set.insert("date", DateTime::from_chrono(date_to_utc(date)));
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }

    let publication = publications(&state)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Publication"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Publication updated successfully",
        "data": PublicationResponse::from(publication),
    })))
}

pub async fn delete_publication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = publications(&state).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Publication"));
    }

    Ok(Json(json!({ "success": true, "message": "Publication deleted successfully" })))
}
