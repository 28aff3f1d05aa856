use chrono::Utc;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::errors::Result;

pub(crate) mod auth;
pub(crate) mod auth_otp;
pub(crate) mod contact_messages;
pub(crate) mod insights;
pub(crate) mod offices;
pub(crate) mod publications;
pub(crate) mod stats;
pub(crate) mod subscribers;
pub(crate) mod team;

pub(crate) fn parse_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id)?)
}

pub(crate) fn bson_now() -> DateTime {
    DateTime::from_millis(Utc::now().timestamp_millis())
}
