// config.rs
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub db_timeout: Duration,
    pub redis_url: Option<String>,
    pub cache_timeout: Duration,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub otp_ttl_secs: u64,
    pub reset_token_ttl_secs: u64,
    pub otp_max_attempts: u32,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub mail_from_name: String,
    pub frontend_url: String,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpConfig {
                host,
                port: parse_or("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            _ => None,
        };

        let mail_from = env::var("MAIL_FROM")
            .or_else(|_| env::var("SMTP_USERNAME"))
            .unwrap_or_else(|_| "no-reply@localhost".to_string());

        Ok(AppConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3004)?,
            database_url: required("DATABASE_URL")?,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "oncg".to_string()),
            db_timeout: Duration::from_millis(parse_or("DB_TIMEOUT_MS", 5_000)?),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            cache_timeout: Duration::from_millis(parse_or("CACHE_TIMEOUT_MS", 2_000)?),
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_secs: parse_or("JWT_TTL_SECS", 86_400)?,
            otp_ttl_secs: parse_or("OTP_TTL_SECS", 300)?,
            reset_token_ttl_secs: parse_or("RESET_TOKEN_TTL_SECS", 900)?,
            otp_max_attempts: parse_or("OTP_MAX_ATTEMPTS", 5)?,
            smtp,
            mail_from,
            mail_from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "ONCG Global".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "https://oncg.com".to_string()),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "host": self.host,
            "port": self.port,
            "database_name": self.database_name,
            "redis_configured": self.redis_url.is_some(),
            "smtp_configured": self.smtp.is_some(),
            "otp_ttl_secs": self.otp_ttl_secs,
            "reset_token_ttl_secs": self.reset_token_ttl_secs,
            "otp_max_attempts": self.otp_max_attempts,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::configuration(format!("{} must be set", key)))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::configuration(format!("{} has an invalid value: {}", key, raw))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u64 = parse_or("ONCG_TEST_SURELY_UNSET_VARIABLE", 300).unwrap();
        assert_eq!(value, 300);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("ONCG_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_or("ONCG_TEST_BAD_PORT", 3004);
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn parse_or_reads_numbers() {
        env::set_var("ONCG_TEST_ATTEMPTS", " 7 ");
        let value: u32 = parse_or("ONCG_TEST_ATTEMPTS", 5).unwrap();
        assert_eq!(value, 7);
    }
}
