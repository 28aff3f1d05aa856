use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User};

/// HS256 signing and verification for bearer tokens.
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let user_id = user
            ._id
            .ok_or_else(|| AppError::service("User has no id"))?;

        let claims = Claims {
            sub: user_id.to_hex(),
            email: user.email.clone(),
            role: user.role.clone(),
            exp: (Utc::now().timestamp() + self.ttl_secs) as usize,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(auth): State<Arc<JwtAuth>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::AuthError("No token, authorization denied".to_string()))?;

    let claims = auth.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::AuthError("Token is not valid".to_string())
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Extension, Router};
    use mongodb::bson::oid::ObjectId;
    use tower::ServiceExt;

    fn user() -> User {
        User {
            _id: Some(ObjectId::new()),
            email: "admin@oncg.com".to_string(),
            password: String::new(),
            name: "Admin".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn app(auth: Arc<JwtAuth>) -> Router {
        Router::new()
            .route("/me", get(|Extension(claims): Extension<Claims>| async move { claims.email }))
            .layer(from_fn_with_state(auth, require_auth))
    }

    async fn call(auth: Arc<JwtAuth>, header: Option<String>) -> (StatusCode, String) {
        let mut request = axum::http::Request::builder().uri("/me");
        if let Some(value) = header {
            request = request.header(AUTHORIZATION, value);
        }
        let response = app(auth)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[test]
    fn issued_tokens_verify() {
        let auth = JwtAuth::new("secret", 3600);
        let user = user();
        let claims = auth.verify(&auth.issue(&user).unwrap()).unwrap();

        assert_eq!(claims.sub, user._id.unwrap().to_hex());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.user_id().unwrap(), user._id.unwrap());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = JwtAuth::new("one", 3600).issue(&user()).unwrap();
        assert!(JwtAuth::new("two", 3600).verify(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // beyond the default 60s leeway
        let token = JwtAuth::new("secret", -600).issue(&user()).unwrap();
        assert!(JwtAuth::new("secret", 3600).verify(&token).is_err());
    }

    #[tokio::test]
    async fn middleware_passes_claims_through() {
        let auth = Arc::new(JwtAuth::new("secret", 3600));
        let token = auth.issue(&user()).unwrap();

        let (status, body) = call(auth, Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "admin@oncg.com");
    }

    #[tokio::test]
    async fn middleware_rejects_missing_and_bad_tokens() {
        let auth = Arc::new(JwtAuth::new("secret", 3600));

        let (status, _) = call(auth.clone(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(auth.clone(), Some("Bearer nonsense".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(auth, Some("Basic dXNlcjpwYXNz".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
