//! End-to-end tests of the identity service router.
//!
//! Drives the real router with an in-memory user store: token issuance,
//! validation, role administration and the role-consistency check.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use user_api::config::Config;
use user_api::repositories::InMemoryUserRepository;
use user_api::routes::{build_routes, AppState};
use user_api::services::user_service;
use uuid::Uuid;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password";

struct TestApp {
    router: Router,
    admin_id: Uuid,
}

fn test_config() -> Config {
    let vars = HashMap::from([
        (
            "JWT_SECRET".to_string(),
            "integration-test-secret-0123456789abcdef".to_string(),
        ),
        ("JWT_ISSUER".to_string(), "ticketing-identity".to_string()),
        ("JWT_AUDIENCE".to_string(), "ticketing".to_string()),
        ("BCRYPT_COST".to_string(), "4".to_string()),
    ]);
    Config::from_vars(&vars).expect("test config")
}

async fn spawn_app() -> anyhow::Result<TestApp> {
    let config = test_config();
    let repo = Arc::new(InMemoryUserRepository::new());

    let admin_id =
        user_service::ensure_admin(repo.as_ref(), config.bcrypt_cost, ADMIN_EMAIL, ADMIN_PASSWORD)
            .await?;

    let state = Arc::new(AppState::new(config, repo));
    let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

    Ok(TestApp {
        router: build_routes(state, metrics_handle),
        admin_id,
    })
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        Ok((status, body))
    }

    async fn post_json(
        &self,
        uri: &str,
        bearer: Option<&str>,
        body: Value,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string()))?).await
    }

    async fn get(&self, uri: &str, bearer: Option<&str>) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    async fn delete(&self, uri: &str, bearer: &str) -> anyhow::Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
            .body(Body::empty())?;
        self.send(request).await
    }

    async fn login(&self, email: &str, password: &str) -> anyhow::Result<(String, Vec<String>)> {
        let (status, body) = self
            .post_json(
                "/api/v1/auth/token",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        let roles = body["roles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap().to_string())
            .collect();
        Ok((body["access_token"].as_str().unwrap().to_string(), roles))
    }

    async fn register(&self, email: &str) -> anyhow::Result<Uuid> {
        let (status, body) = self
            .post_json(
                "/api/v1/users/register",
                None,
                json!({ "email": email, "password": "password123", "display_name": "Member" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        Ok(body["user_id"].as_str().unwrap().parse()?)
    }

    async fn is_valid(&self, token: &str) -> anyhow::Result<bool> {
        let (status, _) = self
            .get(&format!("/api/v1/auth/validate?token={token}"), None)
            .await?;
        Ok(status == StatusCode::OK)
    }

    async fn admin_token(&self) -> anyhow::Result<String> {
        Ok(self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?.0)
    }
}

#[tokio::test]
async fn test_health_and_metrics_are_public() -> anyhow::Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    let (status, _) = app.get("/metrics", None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_issued_token_validates() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    app.register("member@example.com").await?;

    let (token, roles) = app.login("member@example.com", "password123").await?;
    assert_eq!(roles, vec!["User".to_string()]);

    let (status, body) = app
        .get(&format!("/api/v1/auth/validate?token={token}"), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true }));
    Ok(())
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    app.register("member@example.com").await?;

    for (email, password) in [
        ("member@example.com", "wrong-password"),
        ("ghost@example.com", "password123"),
    ] {
        let (status, body) = app
            .post_json(
                "/api/v1/auth/token",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }
    Ok(())
}

#[tokio::test]
async fn test_validate_rejects_missing_and_garbage_tokens() -> anyhow::Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get("/api/v1/auth/validate", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    assert!(!app.is_valid("not.a.token").await?);
    Ok(())
}

#[tokio::test]
async fn test_foreign_signature_is_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await?;

    // Same issuer/audience/subject, different secret
    let vars = HashMap::from([
        (
            "JWT_SECRET".to_string(),
            "some-other-environment-secret-value!!".to_string(),
        ),
        ("JWT_ISSUER".to_string(), "ticketing-identity".to_string()),
        ("JWT_AUDIENCE".to_string(), "ticketing".to_string()),
    ]);
    let foreign = Config::from_vars(&vars)?;
    let claims = common::jwt::UserClaims {
        sub: app.admin_id.to_string(),
        roles: vec!["Admin".to_string()],
        iss: "ticketing-identity".to_string(),
        aud: "ticketing".to_string(),
        iat: chrono::Utc::now().timestamp(),
        exp: chrono::Utc::now().timestamp() + 600,
    };
    let forged = user_api::crypto::sign_user_jwt(&claims, &foreign.jwt)?;

    assert!(!app.is_valid(&forged).await?);
    let (status, _) = app.get("/api/v1/me", Some(&forged)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_me_requires_bearer_token() -> anyhow::Result<()> {
    let app = spawn_app().await?;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/v1/me").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/api/v1/me")
                .header(header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_me_returns_principal() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let token = app.admin_token().await?;

    let (status, body) = app.get("/api/v1/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], app.admin_id.to_string());
    assert_eq!(body["scheme"], "Bearer");
    assert_eq!(body["roles"], json!(["Admin", "User"]));
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_and_invalid() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    app.register("dup@example.com").await?;

    let (status, body) = app
        .post_json(
            "/api/v1/users/register",
            None,
            json!({ "email": "DUP@example.com", "password": "password123", "display_name": "Again" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = app
        .post_json(
            "/api/v1/users/register",
            None,
            json!({ "email": "short@example.com", "password": "short", "display_name": "S" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let member_id = app.register("member@example.com").await?;
    let (member_token, _) = app.login("member@example.com", "password123").await?;

    let uri = format!("/api/v1/admin/users/{member_id}/roles");

    let (status, _) = app.get(&uri, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get(&uri, Some(&member_token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let admin_token = app.admin_token().await?;
    let (status, body) = app.get(&uri, Some(&admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["User"]));

    let (status, _) = app
        .get(&format!("/api/v1/admin/users/{}/roles", Uuid::new_v4()), Some(&admin_token))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

/// Token for {EventManager, User}; live set {EventManager, User} => valid.
/// Remove EventManager => the same token is invalid without reissue.
#[tokio::test]
async fn test_role_removal_invalidates_outstanding_token() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let admin_token = app.admin_token().await?;
    let member_id = app.register("organizer@example.com").await?;

    let (status, body) = app
        .post_json(
            &format!("/api/v1/admin/users/{member_id}/roles"),
            Some(&admin_token),
            json!({ "role": "EventManager" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["EventManager", "User"]));

    let (token, roles) = app.login("organizer@example.com", "password123").await?;
    assert_eq!(roles, vec!["EventManager".to_string(), "User".to_string()]);
    assert!(app.is_valid(&token).await?);

    let (status, body) = app
        .delete(
            &format!("/api/v1/admin/users/{member_id}/roles/EventManager"),
            &admin_token,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["User"]));

    assert!(!app.is_valid(&token).await?);
    let (status, _) = app.get("/api/v1/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (fresh, roles) = app.login("organizer@example.com", "password123").await?;
    assert_eq!(roles, vec!["User".to_string()]);
    assert!(app.is_valid(&fresh).await?);
    Ok(())
}

/// Token with Admin; live roles reduced to {User} => invalid.
/// Reissued token carrying only User => valid.
#[tokio::test]
async fn test_demoted_admin_token_is_rejected_until_reissued() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let root_token = app.admin_token().await?;

    let deputy_id = app.register("deputy@example.com").await?;
    app.post_json(
        &format!("/api/v1/admin/users/{deputy_id}/roles"),
        Some(&root_token),
        json!({ "role": "Admin" }),
    )
    .await?;

    let (deputy_token, roles) = app.login("deputy@example.com", "password123").await?;
    assert!(roles.contains(&"Admin".to_string()));
    let (status, _) = app
        .get(&format!("/api/v1/admin/users/{deputy_id}/roles"), Some(&deputy_token))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .delete(
            &format!("/api/v1/admin/users/{deputy_id}/roles/Admin"),
            &root_token,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    assert!(!app.is_valid(&deputy_token).await?);
    let (status, _) = app
        .get(&format!("/api/v1/admin/users/{deputy_id}/roles"), Some(&deputy_token))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (reissued, roles) = app.login("deputy@example.com", "password123").await?;
    assert_eq!(roles, vec!["User".to_string()]);
    assert!(app.is_valid(&reissued).await?);

    let (status, _) = app
        .get(&format!("/api/v1/admin/users/{deputy_id}/roles"), Some(&reissued))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_deactivated_user_token_is_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let admin_token = app.admin_token().await?;
    let member_id = app.register("leaving@example.com").await?;
    let (token, _) = app.login("leaving@example.com", "password123").await?;
    assert!(app.is_valid(&token).await?);

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/admin/users/{member_id}/active"))
        .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "is_active": false }).to_string()))?;
    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    assert!(!app.is_valid(&token).await?);

    let (status, _) = app
        .post_json(
            "/api/v1/auth/token",
            None,
            json!({ "email": "leaving@example.com", "password": "password123" }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_revoke_own_admin_role() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let admin_token = app.admin_token().await?;

    let (status, body) = app
        .delete(
            &format!("/api/v1/admin/users/{}/roles/Admin", app.admin_id),
            &admin_token,
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(app.is_valid(&admin_token).await?);
    Ok(())
}

#[tokio::test]
async fn test_unknown_role_is_bad_request() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let admin_token = app.admin_token().await?;

    let (status, _) = app
        .post_json(
            &format!("/api/v1/admin/users/{}/roles", app.admin_id),
            Some(&admin_token),
            json!({ "role": "SuperUser" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_malformed_user_id_is_json_bad_request() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let admin_token = app.admin_token().await?;

    let (status, body) = app
        .get("/api/v1/admin/users/not-a-uuid/roles", Some(&admin_token))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = app
        .delete("/api/v1/admin/users/not-a-uuid/roles/User", &admin_token)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}
