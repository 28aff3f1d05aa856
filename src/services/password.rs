use crate::errors::{AppError, Result};

/// bcrypt work factor used for every stored password.
pub const PASSWORD_HASH_COST: u32 = 10;

// bcrypt is deliberately slow, keep it off the async workers.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| AppError::service(format!("Password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::service(format!("Password verification task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_are_salted_and_verifiable() {
        let first = hash_password("NewPass!1").await.unwrap();
        let second = hash_password("NewPass!1").await.unwrap();

        assert_ne!(first, second);
        assert!(verify_password("NewPass!1", &first).await.unwrap());
        assert!(!verify_password("OldPass!1", &first).await.unwrap());
    }
}
