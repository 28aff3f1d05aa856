use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::protected;
use crate::handlers::{auth, auth_otp};
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(jwt: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/profile",
            protected(get(auth::get_profile).patch(auth::update_profile), &jwt),
        )
        .route("/change-password", protected(patch(auth::change_password), &jwt))

        // Password reset: OTP by email, then a one-time reset token
        .route("/request-reset", post(auth_otp::request_password_reset))
        .route("/verify-otp", post(auth_otp::verify_otp))
        .route("/reset", post(auth_otp::reset_password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::services::cache::{KeyValueCache, MemoryCache};
    use crate::services::mocks::{InMemoryUsers, RecordingNotifier};
    use crate::services::otp_service::{otp_key, PasswordResetService, ResetPolicy};
    use crate::services::password::verify_password;

    const EMAIL: &str = "a@x.com";

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "mongodb://127.0.0.1:27017".to_string(),
            database_name: "oncg_test".to_string(),
            db_timeout: Duration::from_millis(100),
            redis_url: None,
            cache_timeout: Duration::from_secs(2),
            jwt_secret: "secret".to_string(),
            jwt_ttl_secs: 3600,
            otp_ttl_secs: 300,
            reset_token_ttl_secs: 900,
            otp_max_attempts: 5,
            smtp: None,
            mail_from: "no-reply@oncg.com".to_string(),
            mail_from_name: "ONCG Global".to_string(),
            frontend_url: "https://oncg.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    struct TestApp {
        router: Router,
        cache: Arc<MemoryCache>,
        users: Arc<InMemoryUsers>,
    }

    // The reset routes never touch MongoDB; the client connects lazily.
    async fn app() -> TestApp {
        let config = config();
        let db = mongodb::Client::with_uri_str(&config.database_url)
            .await
            .unwrap()
            .database(&config.database_name);

        let cache = Arc::new(MemoryCache::new());
        let users = Arc::new(InMemoryUsers::with_user(EMAIL, "OldPass!1").await);
        let notifier = Arc::new(RecordingNotifier::default());
        let password_reset = PasswordResetService::new(
            cache.clone(),
            users.clone(),
            notifier.clone(),
            ResetPolicy::default(),
        );
        let jwt = Arc::new(JwtAuth::new(&config.jwt_secret, config.jwt_ttl_secs));

        let state = AppState {
            db,
            config: Arc::new(config),
            auth: jwt.clone(),
            cache: cache.clone(),
            notifier,
            password_reset: Arc::new(password_reset),
        };

        TestApp {
            router: routes(jwt).with_state(state),
            cache,
            users,
        }
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn reset_flow_over_http() {
        let app = app().await;

        let (status, body) = post_json(&app.router, "/request-reset", json!({ "email": EMAIL })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let otp = app.cache.get(&otp_key(EMAIL)).await.unwrap().unwrap();
        let wrong = if otp == "10000" { "10001" } else { "10000" };

        let (status, body) =
            post_json(&app.router, "/verify-otp", json!({ "email": EMAIL, "otp": wrong })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) =
            post_json(&app.router, "/verify-otp", json!({ "email": EMAIL, "otp": otp })).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["resetToken"].as_str().unwrap().to_string();

        let reset = json!({ "email": EMAIL, "resetToken": token, "newPassword": "NewPass!1" });
        let (status, body) = post_json(&app.router, "/reset", reset.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(verify_password("NewPass!1", &app.users.password_hash(EMAIL)).await.unwrap());

        let (status, _) = post_json(&app.router, "/reset", reset).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_email_and_bad_input_are_rejected() {
        let app = app().await;

        let (status, body) =
            post_json(&app.router, "/request-reset", json!({ "email": "nobody@x.com" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) =
            post_json(&app.router, "/verify-otp", json!({ "email": EMAIL, "otp": "123" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
