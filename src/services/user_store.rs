use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime},
    Collection, Database,
};

use crate::errors::{AppError, Result};
use crate::models::user::User;

pub const USERS_COLLECTION: &str = "users";

/// Durable user credentials, keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replaces the stored password hash.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let now = DateTime::from_millis(Utc::now().timestamp_millis());
        let update = doc! {
            "$set": {
                "password": password_hash,
                "updated_at": now,
            }
        };

        let result = self.users.update_one(doc! { "email": email }, update).await?;
        if result.matched_count == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
