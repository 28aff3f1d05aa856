use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub company: String,
    pub subject: String,
    pub service_interest: String,
    pub message: String,
    #[serde(default)]
    pub responded: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactMessage {
    #[validate(length(min = 1, message = "Missing required fields."))]
    pub name: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Missing required fields."))]
    pub company: String,
    #[validate(length(min = 1, message = "Missing required fields."))]
    pub subject: String,
    #[validate(length(min = 1, message = "Missing required fields."))]
    pub service_interest: String,
    #[validate(length(min = 1, message = "Missing required fields."))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResponded {
    #[serde(default)]
    pub responded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessageResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub subject: String,
    pub service_interest: String,
    pub message: String,
    pub responded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactMessage> for ContactMessageResponse {
    fn from(message: ContactMessage) -> Self {
        Self {
            id: message._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: message.name,
            email: message.email,
            phone: message.phone,
            company: message.company,
            subject: message.subject,
            service_interest: message.service_interest,
            message: message.message,
            responded: message.responded,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_company_is_rejected() {
        let body = r#"{
            "name": "Jane",
            "email": "jane@example.com",
            "company": "",
            "subject": "Audit",
            "serviceInterest": "Tax",
            "message": "Please call me"
        }"#;
        let payload: CreateContactMessage = serde_json::from_str(body).unwrap();

        assert!(payload.phone.is_none());
        assert!(payload.validate().unwrap_err().field_errors().contains_key("company"));
    }
}
