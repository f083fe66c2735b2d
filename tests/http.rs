mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use backend::{
    database::{MemoryUserStore, UserStore},
    models::Role,
    routes,
    utils::TokenIssuer,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryUserStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let router = routes::router(common::state_with_store(store.clone()));
        Self { router, store }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(json!({ "email": email, "password": password, "username": "someone" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn promote(&self, id: &str) {
        assert!(self.store.set_role(id, Role::Admin).await);
    }
}

#[tokio::test]
async fn register_login_and_change_password() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw1", "username": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert!(body["data"].get("password_hash").is_none());

    let (status, _) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw2", "username": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let token = app.token("a@x.com", "pw1").await;
    let (status, _) = app.login("a@x.com", "pw2").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            "PUT",
            "/api/users/password",
            Some(&token),
            Some(json!({ "current_password": "pw1", "new_password": "pw3" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("a@x.com", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("a@x.com", "pw3").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn failed_logins_look_the_same() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;

    let unknown = app.login("ghost@x.com", "pw1").await;
    let wrong = app.login("a@x.com", "nope").await;

    assert_eq!(unknown, wrong);
    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/users", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_strips_password_material() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;
    let token = app.token("a@x.com", "pw1").await;

    let (status, first) = app.send("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"].as_array().unwrap().len(), 1);
    assert!(!first.to_string().contains("password"));

    let (_, second) = app.send("GET", "/api/users", Some(&token), None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn me_routes_use_token_subject() {
    let app = TestApp::new();
    let id = app.register("a@x.com", "pw1").await;
    let token = app.token("a@x.com", "pw1").await;

    let (status, body) = app.send("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = app
        .send("PUT", "/api/users/me", Some(&token), Some(json!({ "username": "alicia" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alicia");
}

#[tokio::test]
async fn generic_update_rejects_role_injection() {
    let app = TestApp::new();
    let id = app.register("a@x.com", "pw1").await;
    let token = app.token("a@x.com", "pw1").await;

    let (status, _) = app
        .send("PUT", "/api/users/me", Some(&token), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = app.store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Member);
}

#[tokio::test]
async fn admin_routes_are_gated_by_role() {
    let app = TestApp::new();
    let admin_id = app.register("admin@x.com", "pw1").await;
    let member_id = app.register("m@x.com", "pw1").await;
    app.promote(&admin_id).await;

    let member_token = app.token("m@x.com", "pw1").await;
    let (status, _) = app
        .send("DELETE", &format!("/api/users/{admin_id}"), Some(&member_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = app.token("admin@x.com", "pw1").await;
    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/users/{member_id}"),
            Some(&admin_token),
            Some(json!({ "username": "renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "renamed");

    let (_, listing) = app.send("GET", "/api/users", Some(&admin_token), None).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .send("DELETE", &format!("/api/users/{member_id}"), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("GET", &format!("/api/users/{member_id}"), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = app.send("GET", "/api/users", Some(&admin_token), None).await;
    let ids: Vec<&str> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![admin_id.as_str()]);
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "not-an-email", "password": "pw1", "username": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("POST", "/api/auth/login", None, Some(json!({ "email": "a@x.com" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_from_other_issuer_is_rejected() {
    let app = TestApp::new();
    let id = app.register("a@x.com", "pw1").await;

    let foreign = TokenIssuer::new("someone-else", Duration::from_secs(60)).unwrap();
    let (token, _) = foreign.issue(&id, Role::Admin).unwrap();
    let (status, _) = app.send("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (token, _) = common::token_issuer().issue(&id, Role::Member).unwrap();
    let (status, _) = app.send("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn posts_are_public_to_read_but_need_a_session_to_write() {
    let app = TestApp::new();
    let author = app.register("a@x.com", "pw1").await;
    let token = app.token("a@x.com", "pw1").await;

    let draft = json!({ "title": "Best pizza", "description": "Vote", "categories": ["other"] });
    let (status, _) = app.send("POST", "/api/posts", None, Some(draft.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("POST", "/api/posts", Some(&token), Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created_by"], author.as_str());
    assert_eq!(body["data"]["vote_count"], 0);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", &format!("/api/posts/{post_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Best pizza");

    let (_, body) = app
        .send("GET", &format!("/api/users/{author}/posts"), None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.send("GET", "/api/posts?category=sport", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (_, body) = app.send("GET", "/api/posts?category=other", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("GET", "/api/posts?category=cooking", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send("GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().contains(&json!("sport")));
}

#[tokio::test]
async fn only_admins_edit_or_remove_posts_and_comments() {
    let app = TestApp::new();
    let admin_id = app.register("admin@x.com", "pw1").await;
    app.register("m@x.com", "pw1").await;
    app.promote(&admin_id).await;
    let member = app.token("m@x.com", "pw1").await;
    let admin = app.token("admin@x.com", "pw1").await;

    let (_, body) = app
        .send(
            "POST",
            "/api/posts",
            Some(&member),
            Some(json!({ "title": "Pizza", "description": "Vote" })),
        )
        .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let post_uri = format!("/api/posts/{post_id}");

    let (status, body) = app
        .send(
            "POST",
            &format!("{post_uri}/comments"),
            Some(&member),
            Some(json!({ "content": "yes" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_uri = format!("/api/comments/{}", body["data"]["id"].as_str().unwrap());

    let edit = json!({ "title": "Pasta" });
    let (status, _) = app.send("PUT", &post_uri, Some(&member), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("DELETE", &comment_uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("PUT", &post_uri, Some(&admin), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Pasta");
    assert_eq!(body["data"]["updated_by"], admin_id.as_str());

    let (status, body) = app
        .send("PUT", &comment_uri, Some(&admin), Some(json!({ "content": "edited" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "edited");

    let (status, _) = app.send("DELETE", &post_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", &comment_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "评论不存在");
    let (status, _) = app
        .send("GET", &format!("{post_uri}/comments"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vote_count_cannot_be_set_through_post_update() {
    let app = TestApp::new();
    let admin_id = app.register("admin@x.com", "pw1").await;
    app.promote(&admin_id).await;
    let admin = app.token("admin@x.com", "pw1").await;

    let (_, body) = app
        .send(
            "POST",
            "/api/posts",
            Some(&admin),
            Some(json!({ "title": "Pizza", "description": "Vote" })),
        )
        .await;
    let post_uri = format!("/api/posts/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app
        .send("PUT", &post_uri, Some(&admin), Some(json!({ "vote_count": 999 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send("GET", &post_uri, None, None).await;
    assert_eq!(body["data"]["vote_count"], 0);
}
