use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{options::ReturnDocument, Collection};
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::OFFICES;
use crate::errors::{AppError, Result};
use crate::handlers::{bson_now, parse_id};
use crate::models::office::{CreateOffice, Office, OfficeResponse, UpdateOffice};
use crate::state::AppState;

fn offices(state: &AppState) -> Collection<Office> {
    state.db.collection(OFFICES)
}

pub async fn create_office(
    State(state): State<AppState>,
    Json(payload): Json<CreateOffice>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;
    let collection = offices(&state);

    if collection.find_one(doc! { "email": &payload.email }).await?.is_some() {
        return Err(AppError::conflict("Office with this email already exists"));
    }

    let mut office = Office {
        _id: None,
        country: payload.country,
        city: payload.city,
        address: payload.address,
        phone: payload.phone,
        email: payload.email,
        is_headquarters: payload.is_headquarters.unwrap_or(false),
        is_active: payload.is_active.unwrap_or(true),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let inserted = collection.insert_one(&office).await?;
    office._id = inserted.inserted_id.as_object_id();

    tracing::info!(city = %office.city, "Office created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Office created successfully",
            "data": OfficeResponse::from(office),
        })),
    ))
}

pub async fn get_all_offices(State(state): State<AppState>) -> Result<Json<Value>> {
    let items: Vec<Office> = offices(&state)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    let data: Vec<OfficeResponse> = items.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

pub async fn get_office_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    let office = offices(&state)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Office"))?;

    Ok(Json(json!({
        "success": true,
        "data": OfficeResponse::from(office),
    })))
}

pub async fn update_office(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOffice>,
) -> Result<Json<Value>> {
    payload.validate()?;
    let id = parse_id(&id)?;
    let collection = offices(&state);

    if let Some(email) = &payload.email {
        let clash = collection
            .find_one(doc! { "email": email, "_id": { "$ne": id } })
            .await?;
        if clash.is_some() {
            return Err(AppError::conflict("Office with this email already exists"));
        }
    }

    let mut set = doc! { "updated_at": bson_now() };
    for (field, value) in [
        ("country", payload.country),
        ("city", payload.city),
        ("address", payload.address),
        ("phone", payload.phone),
        ("email", payload.email),
    ] {
        if let Some(value) = value {
            set.insert(field, value);
        }
    }
    if let Some(is_headquarters) = payload.is_headquarters {
        set.insert("is_headquarters", is_headquarters);
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }

    let office = collection
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Office"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Office updated successfully",
        "data": OfficeResponse::from(office),
    })))
}

pub async fn delete_office(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = offices(&state).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Office"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Office deleted successfully",
    })))
}
