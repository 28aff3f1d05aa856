use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub order: i64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
    pub image: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTeamMember {
    pub name: Option<String>,
    pub position: Option<String>,
    pub image: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTeamMembers {
    pub member_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTeamMembers {
    pub member_id1: Option<String>,
    pub member_id2: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    pub id: String,
    pub name: String,
    pub position: String,
    pub image: String,
    pub linkedin: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamMember> for TeamMemberResponse {
    fn from(member: TeamMember) -> Self {
        Self {
            id: member._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: member.name,
            position: member.position,
            image: member.image,
            linkedin: member.linkedin,
            order: member.order,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

/// Order values assigned by a reorder request: position `i` gets `i + 1`.
pub fn positions<'a>(ids: &'a [String]) -> impl Iterator<Item = (&'a str, i64)> + 'a {
    ids.iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index as i64 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let assigned: Vec<_> = positions(&ids).collect();
        assert_eq!(assigned, vec![("a", 1), ("b", 2), ("c", 3)]);
    }
}
