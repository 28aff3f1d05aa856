use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use futures_util::{future::try_join_all, TryStreamExt};
use mongodb::bson::doc;
use mongodb::{options::ReturnDocument, Collection};
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::TEAM_MEMBERS;
use crate::errors::{AppError, Result};
use crate::handlers::{bson_now, parse_id};
use crate::models::team::{
    positions, CreateTeamMember, ReorderTeamMembers, SwapTeamMembers, TeamMember,
    TeamMemberResponse, UpdateTeamMember,
};
use crate::state::AppState;

fn team(state: &AppState) -> Collection<TeamMember> {
    state.db.collection(TEAM_MEMBERS)
}

pub async fn get_all_team_members(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMemberResponse>>> {
    let members: Vec<TeamMember> = team(&state)
        .find(doc! {})
        .sort(doc! { "order": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(members.into_iter().map(Into::into).collect()))
}

pub async fn get_team_member_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TeamMemberResponse>> {
    let id = parse_id(&id)?;
    let member = team(&state)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Team member"))?;

    Ok(Json(member.into()))
}

pub async fn create_team_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamMember>,
) -> Result<(StatusCode, Json<TeamMemberResponse>)> {
    payload.validate()?;
    let collection = team(&state);

    // new members go to the end of the list
    let max_order = collection
        .find_one(doc! {})
        .sort(doc! { "order": -1 })
        .await?
        .map(|last| last.order)
        .unwrap_or(0);

    let mut member = TeamMember {
        _id: None,
        name: payload.name,
        position: payload.position,
        image: payload.image.unwrap_or_default(),
        linkedin: payload.linkedin,
        order: max_order + 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let inserted = collection.insert_one(&member).await?;
    member._id = inserted.inserted_id.as_object_id();

    Ok((StatusCode::CREATED, Json(member.into())))
}

pub async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeamMember>,
) -> Result<Json<TeamMemberResponse>> {
    let id = parse_id(&id)?;

    // empty strings leave the field untouched
    let mut set = doc! { "updated_at": bson_now() };
    for (field, value) in [
        ("name", payload.name),
        ("position", payload.position),
        ("linkedin", payload.linkedin),
        ("image", payload.image),
    ] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            set.insert(field, value);
        }
    }

    let member = team(&state)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Team member"))?;

    Ok(Json(member.into()))
}

pub async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = team(&state).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Team member"));
    }

    Ok(Json(json!({ "message": "Team member deleted" })))
}

pub async fn swap_team_member_order(
    State(state): State<AppState>,
    Json(payload): Json<SwapTeamMembers>,
) -> Result<Json<Value>> {
    let (first, second) = match (payload.member_id1, payload.member_id2) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return Err(AppError::bad_request("Both member IDs are required")),
    };
    if first == second {
        return Err(AppError::bad_request("Member IDs must be different"));
    }

    let (first, second) = (parse_id(&first)?, parse_id(&second)?);
    let collection = team(&state);

    let member1 = collection.find_one(doc! { "_id": first }).await?;
    let member2 = collection.find_one(doc! { "_id": second }).await?;
    let (member1, member2) = match (member1, member2) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(AppError::NotFound("One or both team members")),
    };

    let now = bson_now();
    collection
        .update_one(
            doc! { "_id": first },
            doc! { "$set": { "order": member2.order, "updated_at": now } },
        )
        .await?;
    collection
        .update_one(
            doc! { "_id": second },
            doc! { "$set": { "order": member1.order, "updated_at": now } },
        )
        .await?;

    Ok(Json(json!({ "message": "Team member order swapped successfully" })))
}

pub async fn reorder_team_members(
    State(state): State<AppState>,
    Json(payload): Json<ReorderTeamMembers>,
) -> Result<Json<Value>> {
    if payload.member_ids.is_empty() {
        return Err(AppError::bad_request("Member IDs array is required"));
    }

    let updates = positions(&payload.member_ids)
        .map(|(id, order)| Ok((parse_id(id)?, order)))
        .collect::<Result<Vec<_>>>()?;

    let collection = team(&state);
    try_join_all(updates.into_iter().map(|(id, order)| {
        let collection = collection.clone();
        async move {
            collection
                .update_one(
                    doc! { "_id": id },
                    doc! { "$set": { "order": order, "updated_at": bson_now() } },
                )
                .await
        }
    }))
    .await?;

    Ok(Json(json!({ "message": "Team members reordered successfully" })))
}
