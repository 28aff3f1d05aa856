pub mod cache;
pub mod email_service;
#[cfg(test)]
pub mod mocks;
pub mod otp_service;
pub mod password;
pub mod user_store;
