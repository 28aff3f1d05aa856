use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::Utc;
use mongodb::bson::{doc, DateTime};
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::user::{
    AuthResponse, ChangePassword, Claims, CreateUser, LoginUser, UpdateProfile, User, UserResponse,
    DEFAULT_ROLE,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::user_store::USERS_COLLECTION;
use crate::state::AppState;

fn users(state: &AppState) -> Collection<User> {
    state.db.collection(USERS_COLLECTION)
}

async fn current_user(state: &AppState, claims: &Claims) -> Result<User> {
    let user_id = claims.user_id()?;
    users(state)
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let collection = users(&state);
    if collection.find_one(doc! { "email": &payload.email }).await?.is_some() {
        return Err(AppError::conflict("Email already in use"));
    }

    let user = User {
        _id: None,
        email: payload.email,
        password: hash_password(&payload.password).await?,
        name: payload.name,
        role: DEFAULT_ROLE.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    // a concurrent registration can still trip the unique index
    collection
        .insert_one(&user)
        .await
        .map_err(|e| AppError::duplicate_as_conflict(e, "Email already in use"))?;

    tracing::info!(email = %user.email, "User registered");
    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered" }))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginUser>,
) -> Result<Json<AuthResponse>> {
    let user = users(&state)
        .find_one(doc! { "email": &payload.email })
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password).await? {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.auth.issue(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfile>,
) -> Result<Json<Value>> {
    payload.validate()?;
    let user = current_user(&state, &claims).await?;

    let now = DateTime::from_millis(Utc::now().timestamp_millis());
    users(&state)
        .update_one(
            doc! { "_id": user._id },
            doc! { "$set": { "name": &payload.name, "updated_at": now } },
        )
        .await?;

    Ok(Json(json!({ "message": "Profile updated", "name": payload.name })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePassword>,
) -> Result<Json<Value>> {
    payload.validate()?;
    let user = current_user(&state, &claims).await?;

    if !verify_password(&payload.current_password, &user.password).await? {
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password).await?;
    let now = DateTime::from_millis(Utc::now().timestamp_millis());
    users(&state)
        .update_one(
            doc! { "_id": user._id },
            doc! { "$set": { "password": password_hash, "updated_at": now } },
        )
        .await?;

    tracing::info!(email = %user.email, "Password changed");
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
