use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub country: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub is_headquarters: bool,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOffice {
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 50, message = "Phone number is required"))]
    pub phone: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    pub is_headquarters: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOffice {
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Phone number is required"))]
    pub phone: Option<String>,
    #[validate(email(message = "Valid email is required"))]
    pub email: Option<String>,
    pub is_headquarters: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeResponse {
    pub id: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub is_headquarters: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Office> for OfficeResponse {
    fn from(office: Office) -> Self {
        Self {
            id: office._id.map(|id| id.to_hex()).unwrap_or_default(),
            country: office.country,
            city: office.city,
            address: office.address,
            phone: office.phone,
            email: office.email,
            is_headquarters: office.is_headquarters,
            is_active: office.is_active,
            created_at: office.created_at,
            updated_at: office.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateOffice {
        CreateOffice {
            country: "Kenya".into(),
            city: "Nairobi".into(),
            address: "Riverside Drive".into(),
            phone: "+254700000000".into(),
            email: "nairobi@oncg.com".into(),
            is_headquarters: Some(true),
            is_active: None,
        }
    }

    #[test]
    fn accepts_a_complete_office() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_missing_fields_and_bad_email() {
        let office = CreateOffice {
            city: String::new(),
            email: "not-an-email".into(),
            ..valid()
        };
        let errors = office.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("city"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let update = UpdateOffice {
            phone: Some("+44 20 0000 0000".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());

        let update = UpdateOffice {
            email: Some("broken".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
