//! In-memory stand-ins for the user store and the notifier, used by tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{AppError, Result};
use crate::models::insight::InsightNotice;
use crate::models::user::User;
use crate::services::email_service::{Notifier, Recipient};
use crate::services::password::hash_password;
use crate::services::user_store::UserStore;

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUsers {
    pub async fn with_user(email: &str, password: &str) -> Self {
        let store = Self::default();
        let user = User {
            _id: None,
            email: email.to_string(),
            password: hash_password(password).await.unwrap(),
            name: "Ada".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.users.lock().unwrap().insert(email.to_string(), user);
        store
    }

    pub fn password_hash(&self, email: &str) -> String {
        self.users.lock().unwrap()[email].password.clone()
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(email).ok_or(AppError::UserNotFound)?;
        user.password = password_hash.to_string();
        Ok(())
    }
}

/// Records every message as `kind:recipient[:otp]`, optionally failing each send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    fn record(&self, entry: String) -> Result<()> {
        self.sent.lock().unwrap().push(entry);
        if self.fail {
            return Err(AppError::email("smtp down"));
        }
        Ok(())
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(&self, to: &Recipient, otp: &str, _valid_for: Duration) -> Result<()> {
        self.record(format!("otp:{}:{}", to.email, otp))
    }

    async fn send_password_reset_confirmation(&self, to: &Recipient) -> Result<()> {
        self.record(format!("confirm:{}", to.email))
    }

    async fn send_insight_notification(&self, to: &str, _insight: &InsightNotice) -> Result<()> {
        self.record(format!("insight:{}", to))
    }
}

/// Yields long enough for spawned notification tasks to run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
