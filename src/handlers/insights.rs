use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use futures_util::{future::try_join_all, TryStreamExt};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{options::ReturnDocument, Collection, Database};
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::{INSIGHTS, SUBSCRIBERS};
use crate::errors::{AppError, Result};
use crate::handlers::{bson_now, parse_id, stats::monthly_stats};
use crate::models::insight::{
    AuthorSummary, CreateInsight, Insight, InsightNotice, InsightPage, InsightQuery,
    InsightResponse, LimitQuery, Pagination, UpdateInsight, UpdateInsightOrder,
};
use crate::models::stats::MonthlyStats;
use crate::models::subscriber::Subscriber;
use crate::models::user::User;
use crate::services::email_service::Notifier;
use crate::services::user_store::USERS_COLLECTION;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_SHORT_LIST: i64 = 10;

fn insights(state: &AppState) -> Collection<Insight> {
    state.db.collection(INSIGHTS)
}

/// Maps an API sort field onto its stored name. Unknown fields sort by creation.
fn sort_field(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("title") => "title",
        Some("viewCount") => "view_count",
        Some("displayOrder") => "display_order",
        _ => "created_at",
    }
}

/// Descending unless the caller names another order.
fn sort_direction(sort_order: Option<&str>) -> i32 {
    match sort_order {
        None => -1,
        Some(order) if order.eq_ignore_ascii_case("desc") => -1,
        Some(_) => 1,
    }
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Documents to skip for a 1-based page.
fn page_offset(page: u64, limit: i64) -> Result<u64> {
    page.saturating_sub(1)
        .checked_mul(limit as u64)
        .ok_or_else(|| AppError::bad_request("Page number is out of range"))
}

fn list_filter(query: &InsightQuery) -> Result<Document> {
    let mut filter = doc! {};

    if let Some(author_id) = &query.author_id {
        filter.insert("author_id", parse_id(author_id)?);
    }

    if let Some(is_active) = query.is_active {
        filter.insert("is_active", is_active);
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": &pattern, "$options": "i" } },
                doc! { "content": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    Ok(filter)
}

async fn load_authors(db: &Database, items: &[Insight]) -> Result<HashMap<ObjectId, AuthorSummary>> {
    let mut ids: Vec<ObjectId> = items.iter().filter_map(|i| i.author_id).collect();
    ids.sort();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users: Vec<User> = db
        .collection::<User>(USERS_COLLECTION)
        .find(doc! { "_id": { "$in": ids } })
        .await?
        .try_collect()
        .await?;

    Ok(users
        .into_iter()
        .filter_map(|user| {
            let id = user._id?;
            Some((
                id,
                AuthorSummary {
                    id: id.to_hex(),
                    name: user.name,
                    email: user.email,
                },
            ))
        })
        .collect())
}

async fn with_authors(db: &Database, items: Vec<Insight>) -> Result<Vec<InsightResponse>> {
    let authors = load_authors(db, &items).await?;
    Ok(items
        .into_iter()
        .map(|insight| {
            let author = insight.author_id.and_then(|id| authors.get(&id).cloned());
            InsightResponse::new(insight, author)
        })
        .collect())
}

async fn require_author(db: &Database, author_id: &str) -> Result<ObjectId> {
    let id = parse_id(author_id)?;
    db.collection::<User>(USERS_COLLECTION)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Author"))?;
    Ok(id)
}

/// Mails every active subscriber in the background.
fn notify_subscribers(db: Database, notifier: Arc<dyn Notifier>, notice: InsightNotice) {
    tokio::spawn(async move {
        let subscribers: Vec<Subscriber> = match db
            .collection::<Subscriber>(SUBSCRIBERS)
            .find(doc! { "is_active": true })
            .await
        {
            Ok(cursor) => match cursor.try_collect().await {
                Ok(subscribers) => subscribers,
                Err(e) => {
                    tracing::error!("Failed to read subscribers: {}", e);
                    return;
                }
            },
            Err(e) => {
                tracing::error!("Failed to query subscribers: {}", e);
                return;
            }
        };

        let mut failed = 0usize;
        for subscriber in &subscribers {
            if let Err(e) = notifier.send_insight_notification(&subscriber.email, &notice).await {
                failed += 1;
                tracing::warn!(email = %subscriber.email, "Insight notification failed: {}", e);
            }
        }

        tracing::info!(
            sent = subscribers.len() - failed,
            failed,
            "Insight notifications dispatched: {}",
            notice.title
        );
    });
}

// Get all insights with optional filtering and pagination
pub async fn get_insights(
    State(state): State<AppState>,
    Query(query): Query<InsightQuery>,
) -> Result<Json<InsightPage>> {
    let filter = list_filter(&query)?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE);
    let mut sort = Document::new();
    sort.insert(
        sort_field(query.sort_by.as_deref()),
        sort_direction(query.sort_order.as_deref()),
    );

    let offset = page_offset(page, limit)?;

    let collection = insights(&state);
    let total = collection.count_documents(filter.clone()).await?;
    let items: Vec<Insight> = collection
        .find(filter)
        .sort(sort)
        .skip(offset)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    Ok(Json(InsightPage {
        insights: with_authors(&state.db, items).await?,
        pagination: Pagination::new(page, limit, total),
    }))
}

// Get a single insight by ID, counting the view
pub async fn get_insight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InsightResponse>> {
    let id = parse_id(&id)?;

    let insight = insights(&state)
        .find_one_and_update(doc! { "_id": id }, doc! { "$inc": { "view_count": 1 } })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Insight"))?;

    let mut responses = with_authors(&state.db, vec![insight]).await?;
    responses.pop().map(Json).ok_or(AppError::NotFound("Insight"))
}

pub async fn create_insight(
    State(state): State<AppState>,
    Json(payload): Json<CreateInsight>,
) -> Result<(StatusCode, Json<InsightResponse>)> {
    payload.validate()?;

    let author_id = match &payload.author_id {
        Some(author_id) => Some(require_author(&state.db, author_id).await?),
        None => None,
    };

    let collection = insights(&state);
    let max_order = collection
        .find_one(doc! {})
        .sort(doc! { "display_order": -1 })
        .await?
        .map(|last| last.display_order)
        .unwrap_or(0);

    let mut insight = Insight {
        _id: None,
        title: payload.title,
        content: payload.content,
        image: payload.image.unwrap_or_default(),
        view_count: 0,
        is_active: payload.is_active.unwrap_or(true),
        display_order: max_order + 1,
        author_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let inserted = collection.insert_one(&insight).await?;
    insight._id = inserted.inserted_id.as_object_id();

    tracing::info!(title = %insight.title, "Insight created");

    notify_subscribers(
        state.db.clone(),
        state.notifier.clone(),
        InsightNotice::new(&insight, &state.config.frontend_url),
    );

    let mut responses = with_authors(&state.db, vec![insight]).await?;
    let response = responses.pop().ok_or(AppError::service("Insight vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_insight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInsight>,
) -> Result<Json<InsightResponse>> {
    let id = parse_id(&id)?;

    let mut set = doc! { "updated_at": bson_now() };
    if let Some(title) = payload.title {
        set.insert("title", title);
    }
    if let Some(content) = payload.content {
        set.insert("content", content);
    }
    if let Some(image) = payload.image {
        set.insert("image", image);
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }
    if let Some(display_order) = payload.display_order {
        set.insert("display_order", display_order);
    }
    if let Some(author_id) = &payload.author_id {
        set.insert("author_id", require_author(&state.db, author_id).await?);
    }

    let insight = insights(&state)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Insight"))?;

    let mut responses = with_authors(&state.db, vec![insight]).await?;
    responses.pop().map(Json).ok_or(AppError::NotFound("Insight"))
}

pub async fn delete_insight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let result = insights(&state).delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Insight"));
    }

    Ok(Json(json!({ "message": "Insight deleted successfully" })))
}

pub async fn get_insights_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
) -> Result<Json<Vec<InsightResponse>>> {
    let author_id = require_author(&state.db, &author_id).await?;

    let items: Vec<Insight> = insights(&state)
        .find(doc! { "author_id": author_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(with_authors(&state.db, items).await?))
}

// Get popular insights (by view count)
pub async fn get_popular_insights(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<InsightResponse>>> {
    let items: Vec<Insight> = insights(&state)
        .find(doc! { "is_active": true })
        .sort(doc! { "view_count": -1, "created_at": -1 })
        .limit(clamp_limit(query.limit, DEFAULT_SHORT_LIST))
        .await?
        .try_collect()
        .await?;

    Ok(Json(with_authors(&state.db, items).await?))
}

pub async fn get_recent_insights(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<InsightResponse>>> {
    let items: Vec<Insight> = insights(&state)
        .find(doc! { "is_active": true })
        .sort(doc! { "created_at": -1 })
        .limit(clamp_limit(query.limit, DEFAULT_SHORT_LIST))
        .await?
        .try_collect()
        .await?;

    Ok(Json(with_authors(&state.db, items).await?))
}

pub async fn update_insight_order(
    State(state): State<AppState>,
    Json(payload): Json<UpdateInsightOrder>,
) -> Result<Json<Value>> {
    let collection = insights(&state);

    let updates = payload
        .insights
        .iter()
        .map(|item| Ok((parse_id(&item.id)?, item.display_order)))
        .collect::<Result<Vec<_>>>()?;

    try_join_all(updates.into_iter().map(|(id, display_order)| {
        let collection = collection.clone();
        async move {
            collection
                .update_one(
                    doc! { "_id": id },
                    doc! { "$set": { "display_order": display_order, "updated_at": bson_now() } },
                )
                .await
        }
    }))
    .await?;

    Ok(Json(json!({ "message": "Display order updated successfully" })))
}

pub async fn toggle_insight_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    let collection = insights(&state);

    let insight = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Insight"))?;

    let is_active = !insight.is_active;
    collection
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "is_active": is_active, "updated_at": bson_now() } },
        )
        .await?;

    let verb = if is_active { "activated" } else { "deactivated" };
    Ok(Json(json!({
        "message": format!("Insight {} successfully", verb),
        "isActive": is_active,
    })))
}

pub async fn get_insight_stats(State(state): State<AppState>) -> Result<Json<MonthlyStats>> {
    let stats = monthly_stats(
        state.db.collection::<Document>(INSIGHTS),
        Some(doc! { "is_active": true }),
    )
    .await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> InsightQuery {
        InsightQuery {
            author_id: None,
            is_active: None,
            page: None,
            limit: None,
            sort_by: None,
            sort_order: None,
            search: None,
        }
    }

    #[test]
    fn unknown_sort_fields_fall_back_to_creation_date() {
        assert_eq!(sort_field(Some("viewCount")), "view_count");
        assert_eq!(sort_field(Some("password")), "created_at");
        assert_eq!(sort_field(None), "created_at");
    }

    #[test]
    fn sort_is_descending_only_when_asked_or_unset() {
        assert_eq!(sort_direction(None), -1);
        assert_eq!(sort_direction(Some("DESC")), -1);
        assert_eq!(sort_direction(Some("asc")), 1);
        assert_eq!(sort_direction(Some("sideways")), 1);
    }

    #[test]
    fn search_terms_are_matched_literally() {
        assert_eq!(escape_regex("a.b*(c)"), r"a\.b\*\(c\)");
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None, DEFAULT_PAGE_SIZE), 20);
        assert_eq!(clamp_limit(Some(0), DEFAULT_PAGE_SIZE), 1);
        assert_eq!(clamp_limit(Some(10_000), DEFAULT_PAGE_SIZE), MAX_PAGE_SIZE);
    }

    #[test]
    fn page_offsets_skip_whole_pages() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
    }

    #[test]
    fn huge_page_numbers_are_rejected_instead_of_overflowing() {
        let uri: axum::http::Uri = "/api/insights?page=18446744073709551615&limit=100"
            .parse()
            .unwrap();
        let Query(query) = Query::<InsightQuery>::try_from_uri(&uri).unwrap();
        let page = query.page.unwrap_or(1).max(1);
        let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE);

        assert!(matches!(page_offset(page, limit), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn filter_combines_active_and_search() {
        let filter = list_filter(&InsightQuery {
            is_active: Some(true),
            search: Some("  tax  ".to_string()),
            ..query()
        })
        .unwrap();

        assert_eq!(filter.get_bool("is_active").unwrap(), true);
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), "tax");
    }

    #[test]
    fn filter_rejects_malformed_author_ids() {
        let result = list_filter(&InsightQuery {
            author_id: Some("not-an-id".to_string()),
            ..query()
        });
        assert!(matches!(result, Err(AppError::InvalidObjectId(_))));
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = list_filter(&InsightQuery {
            search: Some("   ".to_string()),
            ..query()
        })
        .unwrap();
        assert!(filter.is_empty());
    }
}
