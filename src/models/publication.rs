use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePublication {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "Type is required"))]
    pub kind: Option<String>,
    pub date: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePublication {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Publication> for PublicationResponse {
    fn from(publication: Publication) -> Self {
        Self {
            id: publication._id.map(|id| id.to_hex()).unwrap_or_default(),
            title: publication.title,
            description: publication.description,
            kind: publication.kind,
            file_url: publication.file_url,
            file_type: publication.file_type,
            date: publication.date.date_naive(),
            is_active: publication.is_active,
            created_at: publication.created_at,
            updated_at: publication.updated_at,
        }
    }
}

/// Publication dates are calendar days, stored as UTC midnight.
pub fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_dates_round_trip_through_storage() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date_to_utc(date).date_naive(), date);
    }

    #[test]
    fn request_reads_type_and_iso_date() {
        let body = r#"{"title":"Annual report","description":"2024","type":"report","date":"2024-06-30"}"#;
        let payload: CreatePublication = serde_json::from_str(body).unwrap();

        assert_eq!(payload.kind.as_deref(), Some("report"));
        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert!(payload.validate().is_ok());
    }
}
