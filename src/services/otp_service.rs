use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{Rng, RngCore};

use crate::errors::{AppError, Result};
use crate::models::user::User;
use crate::services::cache::KeyValueCache;
use crate::services::email_service::{Notifier, Recipient};
use crate::services::password::hash_password;
use crate::services::user_store::UserStore;

const RESET_TOKEN_BYTES: usize = 32;

// Cache key layout is shared with other deployments on the same instance.
pub fn otp_key(email: &str) -> String {
    format!("otp:{}", email)
}

pub fn reset_key(email: &str) -> String {
    format!("reset:{}", email)
}

pub fn attempts_key(email: &str) -> String {
    format!("otp_attempts:{}", email)
}

#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub otp_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// Wrong codes tolerated per OTP, `0` disables the limit.
    pub max_attempts: u32,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::from_secs(300),
            reset_token_ttl: Duration::from_secs(900),
            max_attempts: 5,
        }
    }
}

/// OTP based password reset.
///
/// Per email the flow moves `Idle -> OtpIssued -> TokenIssued -> Idle`.
/// All state lives in the cache, so expiry is whatever the cache enforces
/// and a missing key is treated as expired.
pub struct PasswordResetService {
    cache: Arc<dyn KeyValueCache>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    policy: ResetPolicy,
}

impl PasswordResetService {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            cache,
            users,
            notifier,
            policy,
        }
    }

    // 5 digits, uniform over [10000, 99999]
    pub fn generate_otp() -> String {
        rand::thread_rng().gen_range(10_000..=99_999).to_string()
    }

    pub fn generate_reset_token() -> String {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    async fn require_user(&self, email: &str) -> Result<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn request_reset(&self, email: &str) -> Result<()> {
        let user = self.require_user(email).await?;

        let otp = Self::generate_otp();
        self.cache.set_ex(&otp_key(email), &otp, self.policy.otp_ttl).await?;
        // a fresh code starts a fresh attempt window and supersedes any pending reset
        self.cache.delete(&attempts_key(email)).await?;
        self.cache.delete(&reset_key(email)).await?;

        tracing::info!(email = %email, "Password reset OTP issued");

        let notifier = Arc::clone(&self.notifier);
        let recipient = Recipient::new(user.email, user.name);
        let valid_for = self.policy.otp_ttl;
        tokio::spawn(async move {
            if let Err(e) = notifier.send_otp(&recipient, &otp, valid_for).await {
                tracing::error!(email = %recipient.email, "Failed to send OTP email: {}", e);
            }
        });

        Ok(())
    }

    /// Exchanges a correct OTP for a reset token.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String> {
        self.require_user(email).await?;

        let stored = self
            .cache
            .get(&otp_key(email))
            .await?
            .ok_or(AppError::OtpExpired)?;

        if stored != otp {
            return Err(self.record_failed_attempt(email).await?);
        }

        let token = Self::generate_reset_token();
        self.cache
            .set_ex(&reset_key(email), &token, self.policy.reset_token_ttl)
            .await?;
        self.cache.delete(&otp_key(email)).await?;
        self.cache.delete(&attempts_key(email)).await?;

        tracing::info!(email = %email, "Password reset OTP verified");
        Ok(token)
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<AppError> {
        if self.policy.max_attempts == 0 {
            return Ok(AppError::InvalidOtp);
        }

        let attempts = self
            .cache
            .incr(&attempts_key(email), self.policy.otp_ttl)
            .await?;

        if attempts >= i64::from(self.policy.max_attempts) {
            self.cache.delete(&otp_key(email)).await?;
            self.cache.delete(&attempts_key(email)).await?;
            tracing::warn!(email = %email, attempts, "OTP invalidated after repeated failures");
            return Ok(AppError::TooManyAttempts);
        }

        tracing::debug!(email = %email, attempts, "Invalid OTP submitted");
        Ok(AppError::InvalidOtp)
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.require_user(email).await?;

        // absent and mismatched tokens get the same error
        let valid = match self.cache.get(&reset_key(email)).await? {
            Some(stored) => constant_time_eq::constant_time_eq(stored.as_bytes(), reset_token.as_bytes()),
            None => false,
        };
        if !valid {
            return Err(AppError::InvalidResetToken);
        }

        let password_hash = hash_password(new_password).await?;
        self.users.update_password(email, &password_hash).await?;
        self.cache.delete(&reset_key(email)).await?;

        tracing::info!(email = %email, "Password reset completed");

        let notifier = Arc::clone(&self.notifier);
        let recipient = Recipient::new(user.email, user.name);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_password_reset_confirmation(&recipient).await {
                tracing::error!(
                    email = %recipient.email,
                    "Failed to send password reset confirmation: {}",
                    e
                );
            }
        });

        Ok(())
    }
}
