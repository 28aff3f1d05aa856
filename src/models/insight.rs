use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<ObjectId>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInsight {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub image: Option<String>,
    pub author_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInsight {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub author_id: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightQuery {
    pub author_id: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightOrder {
    pub id: String,
    pub display_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInsightOrder {
    pub insights: Vec<InsightOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image: String,
    pub view_count: i64,
    pub is_active: bool,
    pub display_order: i64,
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InsightResponse {
    pub fn new(insight: Insight, author: Option<AuthorSummary>) -> Self {
        Self {
            id: insight._id.map(|id| id.to_hex()).unwrap_or_default(),
            title: insight.title,
            content: insight.content,
            image: insight.image,
            view_count: insight.view_count,
            is_active: insight.is_active,
            display_order: insight.display_order,
            author,
            created_at: insight.created_at,
            updated_at: insight.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: i64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: i64, total: u64) -> Self {
        let pages = if limit > 0 {
            total.div_ceil(limit as u64)
        } else {
            0
        };
        Self { page, limit, total, pages }
    }
}

#[derive(Debug, Serialize)]
pub struct InsightPage {
    pub insights: Vec<InsightResponse>,
    pub pagination: Pagination,
}

/// Payload for the subscriber notification sent when an insight is published.
#[derive(Debug, Clone)]
pub struct InsightNotice {
    pub title: String,
    pub preview: String,
    pub link: String,
}

pub const PREVIEW_CHARS: usize = 180;

impl InsightNotice {
    pub fn new(insight: &Insight, frontend_url: &str) -> Self {
        let id = insight._id.map(|id| id.to_hex()).unwrap_or_default();
        Self {
            title: insight.title.clone(),
            preview: insight.content.chars().take(PREVIEW_CHARS).collect(),
            link: format!("{}/insights/{}", frontend_url.trim_end_matches('/'), id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(content: &str) -> Insight {
        Insight {
            _id: Some(ObjectId::new()),
            title: "Market outlook".to_string(),
            content: content.to_string(),
            image: String::new(),
            view_count: 0,
            is_active: true,
            display_order: 1,
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 20, 41).pages, 3);
        assert_eq!(Pagination::new(1, 20, 40).pages, 2);
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
    }

    #[test]
    fn notice_preview_is_truncated_on_char_boundaries() {
        let insight = sample(&"é".repeat(500));
        let notice = InsightNotice::new(&insight, "https://oncg.com/");

        assert_eq!(notice.preview.chars().count(), PREVIEW_CHARS);
        assert!(notice.link.starts_with("https://oncg.com/insights/"));
        assert!(!notice.link.contains("//insights"));
    }
}
