use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::SUBSCRIBERS;
use crate::errors::{is_duplicate_key, AppError, Result};
use crate::handlers::{bson_now, parse_id, stats::monthly_stats};
use crate::models::stats::MonthlyStats;
use crate::models::subscriber::{
    Subscriber, SubscriberQuery, SubscriberResponse, SubscriptionRequest,
};
use crate::state::AppState;

fn subscribers(state: &AppState) -> Collection<Subscriber> {
    state.db.collection(SUBSCRIBERS)
}

pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscriptionRequest>,
) -> Result<Response> {
    payload.validate()?;
    let collection = subscribers(&state);

    if let Some(existing) = collection.find_one(doc! { "email": &payload.email }).await? {
        if !existing.is_active {
            collection
                .update_one(
                    doc! { "_id": existing._id },
                    doc! { "$set": { "is_active": true, "updated_at": bson_now() } },
                )
                .await?;
            tracing::info!(email = %payload.email, "Subscriber reactivated");
        }
        return Ok(Json(json!({ "message": "Already subscribed" })).into_response());
    }

    let mut subscriber = Subscriber {
        _id: None,
        email: payload.email,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let inserted = match collection.insert_one(&subscriber).await {
        Ok(inserted) => inserted,
        // lost a race with another subscribe for the same address
        Err(e) if is_duplicate_key(&e) => {
            return Ok(Json(json!({ "message": "Already subscribed" })).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    subscriber._id = inserted.inserted_id.as_object_id();

    let id = subscriber._id.map(|id| id.to_hex()).unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "email": subscriber.email })),
    )
        .into_response())
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscriptionRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    let result = subscribers(&state)
        .update_one(
            doc! { "email": &payload.email },
            doc! { "$set": { "is_active": false, "updated_at": bson_now() } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("Subscriber"));
    }

    Ok(Json(json!({ "message": "Unsubscribed" })))
}

pub async fn get_subscribers(
    State(state): State<AppState>,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<Vec<SubscriberResponse>>> {
    let filter = if query.active == Some(true) {
        doc! { "is_active": true }
    } else {
        doc! {}
    };

    let items: Vec<Subscriber> = subscribers(&state)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn unsubscribe_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    let collection = subscribers(&state);

    let existing = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Subscriber"))?;

    collection
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "is_active": false, "updated_at": bson_now() } },
        )
        .await?;

    Ok(Json(json!({ "message": format!("Unsubscribed {}", existing.email) })))
}

pub async fn get_subscriber_stats(State(state): State<AppState>) -> Result<Json<MonthlyStats>> {
    let stats = monthly_stats(
        state.db.collection::<Document>(SUBSCRIBERS),
        Some(doc! { "is_active": true }),
    )
    .await?;
    Ok(Json(stats))
}
