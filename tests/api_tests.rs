use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use critiq::config::Config;
use critiq::db::DEFAULT_ACCESS_TOKEN;
use critiq::services::Mailer;
use critiq::state::SharedState;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Mail backend that records outbound bodies so tests can read the
/// confirmation code a signup would have delivered.
#[derive(Default)]
struct CapturingMailer {
    bodies: Mutex<Vec<String>>,
}

impl CapturingMailer {
    fn last_code(&self) -> String {
        let bodies = self.bodies.lock().unwrap();
        let body = bodies.last().expect("no mail was sent");
        body.rsplit("confirmation code: ")
            .next()
            .expect("mail body has no code")
            .trim()
            .to_string()
    }

    fn sent_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, _to: &str, _subject: &str, body: &str) -> anyhow::Result<()> {
        self.bodies.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

async fn spawn_app() -> (Router, Arc<CapturingMailer>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps every query on the same in-memory db.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let mailer = Arc::new(CapturingMailer::default());
    let shared = SharedState::with_mailer(config, mailer.clone())
        .await
        .expect("Failed to create shared state");
    let state = critiq::api::create_app_state(Arc::new(shared))
        .await
        .expect("Failed to create app state");

    (critiq::api::router(state).await, mailer)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Run the signup + token exchange flow and return the issued bearer token.
async fn signup_and_activate(
    app: &Router,
    mailer: &CapturingMailer,
    username: &str,
    email: &str,
) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({"username": username, "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = mailer.last_code();
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/token",
        None,
        Some(serde_json::json!({"username": username, "confirmation_code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_category(app: &Router, name: &str, slug: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/categories",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({"name": name, "slug": slug})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_genre(app: &Router, name: &str, slug: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/genres",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({"name": name, "slug": slug})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_reads_and_unauthorized_writes() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/titles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 0);

    let (status, _) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        None,
        Some(serde_json::json!({"name": "Movies", "slug": "movies"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some("not-a-real-token"),
        Some(serde_json::json!({"name": "Movies", "slug": "movies"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_crud_and_slug_conflict() {
    let (app, _) = spawn_app().await;

    create_category(&app, "Movies", "movies").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({"name": "Another", "slug": "movies"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("movies"));

    let (status, body) = send(&app, "GET", "/api/categories?search=Mov", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["slug"], "movies");

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/categories/movies",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/categories/movies",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_idempotence_and_conflicts() {
    let (app, mailer) = spawn_app().await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({"username": "alice", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");
        assert_eq!(body["data"]["email"], "a@x.com");
    }
    assert_eq!(mailer.sent_count(), 2);

    // Exactly one row exists for alice.
    let (status, body) = send(
        &app,
        "GET",
        "/api/users?search=alice",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({"username": "alice", "email": "other@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Username"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({"username": "alice2", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Email"));
}

#[tokio::test]
async fn test_token_exchange_and_code_rotation() {
    let (app, mailer) = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({"username": "alice", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = mailer.last_code();

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(serde_json::json!({"username": "alice", "confirmation_code": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(serde_json::json!({"username": "nobody", "confirmation_code": &code})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(serde_json::json!({"username": "alice", "confirmation_code": &code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The code is single-use; a second exchange with it is rejected.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(serde_json::json!({"username": "alice", "confirmation_code": &code})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn test_username_validation_messages() {
    let (app, _) = spawn_app().await;

    for name in ["me", "Me", "ME"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({"username": name, "email": "m@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("reserved"));
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({"username": "al ice!", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("' '"));
    assert!(message.contains("'!'"));
}

#[tokio::test]
async fn test_title_round_trip_and_rating_lifecycle() {
    let (app, mailer) = spawn_app().await;

    create_category(&app, "Science Fiction", "scifi").await;
    create_genre(&app, "Sci-Fi", "sf").await;
    create_genre(&app, "Adventure", "adventure").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "Dune",
            "year": 1965,
            "category": "scifi",
            "genre": ["sf", "adventure"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let title_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["category"]["slug"], "scifi");
    assert!(body["data"]["rating"].is_null());

    let mut genre_slugs: Vec<&str> = body["data"]["genre"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["slug"].as_str().unwrap())
        .collect();
    genre_slugs.sort_unstable();
    assert_eq!(genre_slugs, vec!["adventure", "sf"]);

    // Genre list must not be empty.
    let (status, _) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "No Genres",
            "year": 2000,
            "category": "scifi",
            "genre": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let token = signup_and_activate(&app, &mailer, "alice", "a@x.com").await;

    let uri = format!("/api/titles/{title_id}/reviews");
    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(serde_json::json!({"text": "A classic.", "score": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["author"], "alice");
    assert_eq!(body["data"]["title"], "Dune");
    let review_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/titles/{title_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"].as_f64(), Some(8.0));

    // One review per (author, title).
    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(serde_json::json!({"text": "Again!", "score": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("second review"));

    // Rating follows the review through update and delete.
    let review_uri = format!("/api/titles/{title_id}/reviews/{review_id}");
    let (status, _) = send(
        &app,
        "PATCH",
        &review_uri,
        Some(&token),
        Some(serde_json::json!({"score": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/api/titles/{title_id}"), None, None).await;
    assert_eq!(body["data"]["rating"].as_f64(), Some(6.0));

    let (status, _) = send(&app, "DELETE", &review_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/api/titles/{title_id}"), None, None).await;
    assert!(body["data"]["rating"].is_null());
}

#[tokio::test]
async fn test_title_filters_and_ordering() {
    let (app, _) = spawn_app().await;

    create_category(&app, "Movies", "movies").await;
    create_category(&app, "Books", "books").await;
    create_genre(&app, "Drama", "drama").await;
    create_genre(&app, "Comedy", "comedy").await;

    for (name, year, category, genre) in [
        ("Alpha", 1990, "movies", "drama"),
        ("Beta", 2000, "books", "comedy"),
        ("Gamma", 2010, "movies", "comedy"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/titles",
            Some(DEFAULT_ACCESS_TOKEN),
            Some(serde_json::json!({
                "name": name,
                "year": year,
                "category": category,
                "genre": [genre],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/api/titles?category=MOVIES", None, None).await;
    assert_eq!(body["data"]["count"], 2);

    let (_, body) = send(&app, "GET", "/api/titles?genre=comedy", None, None).await;
    assert_eq!(body["data"]["count"], 2);

    let (_, body) = send(&app, "GET", "/api/titles?name=amm", None, None).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["name"], "Gamma");

    let (_, body) = send(&app, "GET", "/api/titles?year=2000", None, None).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["name"], "Beta");

    let (_, body) = send(&app, "GET", "/api/titles?ordering=-year", None, None).await;
    assert_eq!(body["data"]["results"][0]["name"], "Gamma");

    let (_, body) = send(&app, "GET", "/api/titles?category=nothing", None, None).await;
    assert_eq!(body["data"]["count"], 0);

    let (status, _) = send(&app, "GET", "/api/titles?ordering=bogus", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_year_and_score_boundaries() {
    use chrono::Datelike;
    let (app, mailer) = spawn_app().await;

    create_category(&app, "Movies", "movies").await;
    create_genre(&app, "Drama", "drama").await;

    let current_year = chrono::Utc::now().year();

    let (status, body) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "This Year",
            "year": current_year,
            "category": "movies",
            "genre": ["drama"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let title_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "Next Year",
            "year": current_year + 1,
            "category": "movies",
            "genre": ["drama"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let token = signup_and_activate(&app, &mailer, "alice", "a@x.com").await;
    let uri = format!("/api/titles/{title_id}/reviews");

    for score in [0, 11] {
        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(serde_json::json!({"text": "Out of range", "score": score})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(serde_json::json!({"text": "Lowest", "score": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let review_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/titles/{title_id}/reviews/{review_id}"),
        Some(&token),
        Some(serde_json::json!({"score": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_review_and_comment_permissions() {
    let (app, mailer) = spawn_app().await;

    create_category(&app, "Movies", "movies").await;
    create_genre(&app, "Drama", "drama").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "Alpha",
            "year": 1990,
            "category": "movies",
            "genre": ["drama"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let title_id = body["data"]["id"].as_i64().unwrap();

    let alice = signup_and_activate(&app, &mailer, "alice", "a@x.com").await;
    let bob = signup_and_activate(&app, &mailer, "bob", "b@x.com").await;

    // Plain users cannot touch admin-only resources.
    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&alice),
        Some(serde_json::json!({"name": "Nope", "slug": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/titles/{title_id}/reviews"),
        Some(&alice),
        Some(serde_json::json!({"text": "Mine.", "score": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let review_id = body["data"]["id"].as_i64().unwrap();
    let review_uri = format!("/api/titles/{title_id}/reviews/{review_id}");

    // Another plain user may not edit alice's review; a moderator and the
    // admin may.
    let (status, _) = send(
        &app,
        "PATCH",
        &review_uri,
        Some(&bob),
        Some(serde_json::json!({"score": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/users/bob",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({"role": "moderator"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PATCH",
        &review_uri,
        Some(&bob),
        Some(serde_json::json!({"score": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Comments follow the same shape.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/reviews/{review_id}/comments"),
        Some(&bob),
        Some(serde_json::json!({"text": "Agreed."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["author"], "bob");

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/reviews/{review_id}/comments/{comment_id}"),
        Some(&alice),
        Some(serde_json::json!({"text": "Hijacked."})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/reviews/{review_id}/comments/{comment_id}"),
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Comments under a missing review 404.
    let (status, _) = send(&app, "GET", "/api/reviews/9999/comments", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Admin may remove the review entirely.
    let (status, _) = send(&app, "DELETE", &review_uri, Some(DEFAULT_ACCESS_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_me_cannot_change_own_role() {
    let (app, mailer) = spawn_app().await;

    let token = signup_and_activate(&app, &mailer, "alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/users/me",
        Some(&token),
        Some(serde_json::json!({"bio": "Hi there", "role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "Hi there");
    // The role key is read-only on the me resource.
    assert_eq!(body["data"]["role"], "user");

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(serde_json::json!({"name": "Still not admin", "slug": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "username": "carol",
            "email": "c@x.com",
            "role": "moderator",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "moderator");

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({"username": "carol2", "email": "c@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "GET",
        "/api/users/carol",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "c@x.com");

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "username": "dave",
            "email": "d@x.com",
            "role": "emperor",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/users/carol",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        "/api/users/carol",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_delete_detaches_titles() {
    let (app, _) = spawn_app().await;

    create_category(&app, "Movies", "movies").await;
    create_genre(&app, "Drama", "drama").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/titles",
        Some(DEFAULT_ACCESS_TOKEN),
        Some(serde_json::json!({
            "name": "Alpha",
            "year": 1990,
            "category": "movies",
            "genre": ["drama"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let title_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/categories/movies",
        Some(DEFAULT_ACCESS_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/titles/{title_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["category"].is_null());
}
