use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};

use tastebuddy_api::{
    create_router,
    db::MemoryStore,
    models::{Role, User, UserId},
    services::passwords::{verify_password, MIN_COST},
    AppState,
};

fn create_test_server() -> (TestServer, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone())).with_password_cost(MIN_COST);
    let server = TestServer::new(create_router(state)).unwrap();
    (server, store)
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = actual.as_f64().unwrap();
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

async fn create_recipe(server: &TestServer, body: Value) -> i64 {
    let response = server.post("/api/v1/admin/recipes").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

async fn ensure_profile(server: &TestServer, user_id: &str) {
    server
        .post("/api/v1/taste_profile")
        .json(&json!({ "userId": user_id }))
        .await
        .assert_status_ok();
}

fn error_code(response: &axum_test::TestResponse) -> String {
    response.json::<Value>()["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let (server, _) = create_test_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");

    let response = server.get("/health").await;
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let (server, _) = create_test_server();

    // Unknown until ensured
    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "alice")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "profile_not_found");

    let response = server
        .post("/api/v1/taste_profile")
        .json(&json!({ "userId": "alice" }))
        .await;
    response.assert_status_ok();
    let created: Value = response.json();
    assert_eq!(created["user_id"], "alice");
    assert_eq!(created["v"], json!([0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]));

    let response = server
        .put("/api/v1/taste_profile")
        .json(&json!({ "userId": "alice", "v": [1.4, "0.2", 0, 0, 0, -3, 0.9] }))
        .await;
    response.assert_status_ok();
    let replaced: Value = response.json();
    assert_eq!(replaced["ok"], true);
    assert_eq!(replaced["v"], json!([1.0, 0.2, 0.0, 0.0, 0.0, 0.0, 0.9]));

    // Ensuring again leaves an edited profile untouched
    ensure_profile(&server, "alice").await;

    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "alice")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["v"],
        json!([1.0, 0.2, 0.0, 0.0, 0.0, 0.0, 0.9])
    );
}

#[tokio::test]
async fn test_profile_validation() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/taste_profile").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "userId_required");

    let response = server
        .put("/api/v1/taste_profile")
        .json(&json!({ "userId": "alice", "v": [0.1, 0.2] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "missing_fields");
}

#[tokio::test]
async fn test_submit_rating_moves_profile() {
    let (server, _) = create_test_server();
    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Honey Cake", "ingredients": ["Honey"], "taste_v": [1, 0, 0, 0, 0, 0, 0] }),
    )
    .await;
    ensure_profile(&server, "u1").await;

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": recipe_id, "rating": 5 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_close(&body["v"][0], 0.85);
    assert_close(&body["v"][1], 0.5);

    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "u1")
        .await;
    assert_close(&response.json::<Value>()["v"][0], 0.85);
}

#[tokio::test]
async fn test_submit_neutral_rating_keeps_profile() {
    let (server, store) = create_test_server();
    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Pickles", "ingredients": ["Cucumber"], "taste_v": [0, 0.3, 1, 0, 0, 0, 0.8] }),
    )
    .await;
    ensure_profile(&server, "u1").await;

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": recipe_id, "rating": "3" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["v"], json!(vec![0.5; 7]));
    assert_eq!(store.rating_count().await, 1);
}

#[tokio::test]
async fn test_submit_rating_rejections_write_nothing() {
    let (server, store) = create_test_server();
    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Soup", "ingredients": ["Leek"], "taste_v": [0, 1, 0, 0, 1, 0, 0] }),
    )
    .await;
    ensure_profile(&server, "u1").await;

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": recipe_id, "rating": 7 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_rating");

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": recipe_id, "rating": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "missing_fields");

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": "abc", "rating": 4 }))
        .await;
    assert_eq!(error_code(&response), "missing_fields");

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "ghost", "recipeId": recipe_id, "rating": 4 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "profile_not_found");

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": "u1", "recipeId": 999, "rating": 4 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "recipe_not_found");

    assert_eq!(store.rating_count().await, 0);
    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "u1")
        .await;
    assert_eq!(response.json::<Value>()["v"], json!(vec![0.5; 7]));
}

#[tokio::test]
async fn test_recommendations_rank_and_filter() {
    let (server, _) = create_test_server();
    let pasta = create_recipe(
        &server,
        json!({ "name": "Pasta", "ingredients": ["Tomato Sauce", "Basil"], "taste_v": [0, 0.5, 0.5, 0, 0.8, 0, 0] }),
    )
    .await;
    let pesto = create_recipe(
        &server,
        json!({ "name": "Pesto", "ingredients": ["Basil"], "taste_v": [0, 0.5, 0, 0, 0.5, 0, 0], "featured": true }),
    )
    .await;
    ensure_profile(&server, "u1").await;

    // Unfiltered: every recipe is listed
    let response = server
        .get("/api/v1/recipes")
        .add_query_param("userId", "u1")
        .await;
    response.assert_status_ok();
    let ranked: Vec<Value> = response.json();
    assert_eq!(ranked.len(), 2);
    let featured = ranked.iter().find(|r| r["id"] == pesto).unwrap();
    assert_eq!(featured["reason"], "featured");
    assert_eq!(featured["avg_rating"], Value::Null);
    assert_eq!(featured["user_rating"], Value::Null);

    // Filtered: only recipes containing a term survive
    let response = server
        .get("/api/v1/recipes")
        .add_query_param("userId", "u1")
        .add_query_param("q", " TOMATO ")
        .await;
    let ranked: Vec<Value> = response.json();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0]["id"], pasta);
    assert_eq!(ranked[0]["reason"], "taste_match");
    assert_eq!(
        ranked[0]["restaurant_metrics"]["relevance"],
        ranked[0]["score"]
    );

    // Scores are sorted descending
    let response = server
        .get("/api/v1/recipes")
        .add_query_param("userId", "u1")
        .add_query_param("q", "basil")
        .await;
    let ranked: Vec<Value> = response.json();
    let scores: Vec<f64> = ranked.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_recommendations_require_profile() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/recipes").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "userId_required");

    let response = server
        .get("/api/v1/recipes")
        .add_query_param("userId", "nobody")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "profile_not_found");
}

// Rating through /recipes/:id/rate must leave the taste profile alone,
// unlike POST /ratings.
#[tokio::test]
async fn test_rate_recipe_does_not_touch_profile() {
    let (server, store) = create_test_server();
    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Chili", "ingredients": ["Pepper"], "taste_v": [0, 0, 0, 0, 0, 1, 0] }),
    )
    .await;
    ensure_profile(&server, "u1").await;

    let response = server
        .post(&format!("/api/v1/recipes/{}/rate", recipe_id))
        .json(&json!({ "userId": "u1", "rating": 5 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["recipe_id"], recipe_id);
    assert_eq!(body["user_rating"], 5);
    assert_eq!(body["rating_count"], 1);
    assert_close(&body["avg_rating"], 5.0);
    assert_close(&body["acceptance_score"], 1.0);

    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "u1")
        .await;
    assert_eq!(response.json::<Value>()["v"], json!(vec![0.5; 7]));

    // Re-rating overwrites instead of accumulating
    let first = store
        .rating_updated_at(&UserId::parse("u1").unwrap(), recipe_id)
        .await
        .unwrap();
    let response = server
        .post(&format!("/api/v1/recipes/{}/rate", recipe_id))
        .json(&json!({ "userId": "u1", "rating": 2 }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["rating_count"], 1);
    assert_close(&body["avg_rating"], 2.0);
    assert_close(&body["acceptance_score"], 0.4);
    assert_eq!(store.rating_count().await, 1);
    let second = store
        .rating_updated_at(&UserId::parse("u1").unwrap(), recipe_id)
        .await
        .unwrap();
    assert!(second >= first);

    // Recommendations now carry the user's own rating
    let response = server
        .get("/api/v1/recipes")
        .add_query_param("userId", "u1")
        .await;
    let ranked: Vec<Value> = response.json();
    assert_eq!(ranked[0]["user_rating"], 2);
}

#[tokio::test]
async fn test_rate_recipe_validation() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/recipes/abc/rate")
        .json(&json!({ "userId": "u1", "rating": 4 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_id");

    let response = server
        .post("/api/v1/recipes/1/rate")
        .json(&json!({ "rating": 4 }))
        .await;
    assert_eq!(error_code(&response), "missing_fields");

    let response = server
        .post("/api/v1/recipes/1/rate")
        .json(&json!({ "userId": "u1", "rating": 6 }))
        .await;
    assert_eq!(error_code(&response), "invalid_rating");

    let response = server
        .post("/api/v1/recipes/42/rate")
        .json(&json!({ "userId": "u1", "rating": 4 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "recipe_not_found");
}

#[tokio::test]
async fn test_aggregates() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/ratings/aggregate").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["average_rating"], Value::Null);
    assert_eq!(body["rating_count"], 0);

    let response = server.get("/api/v1/taste_profiles/aggregate").await;
    let body: Value = response.json();
    assert_eq!(body["average"], json!(vec![0.0; 7]));
    assert_eq!(body["count"], 0);
    assert_eq!(body["window_days"], Value::Null);

    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Toast", "ingredients": ["Bread"], "taste_v": [0, 0, 0, 0, 0, 0, 1] }),
    )
    .await;
    ensure_profile(&server, "u1").await;
    server
        .put("/api/v1/taste_profile")
        .json(&json!({ "userId": "u2", "v": [1, 1, 1, 1, 1, 1, 0] }))
        .await
        .assert_status_ok();
    for (user, rating) in [("u1", 4), ("u2", 5)] {
        server
            .post(&format!("/api/v1/recipes/{}/rate", recipe_id))
            .json(&json!({ "userId": user, "rating": rating }))
            .await
            .assert_status_ok();
    }

    let body: Value = server.get("/api/v1/ratings/aggregate").await.json();
    assert_close(&body["average_rating"], 4.5);
    assert_eq!(body["rating_count"], 2);

    let body: Value = server
        .get("/api/v1/taste_profiles/aggregate")
        .add_query_param("windowDays", "7")
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["window_days"], 7);
    assert_close(&body["average"][0], 0.75);
    assert_close(&body["average"][6], 0.25);

    // Invalid windows fall back to all-time
    let body: Value = server
        .get("/api/v1/taste_profiles/aggregate")
        .add_query_param("windowDays", "-2")
        .await
        .json();
    assert_eq!(body["window_days"], Value::Null);
    assert_eq!(body["count"], 2);

    // A window reaching back before the epoch covers every profile
    let response = server
        .get("/api/v1/taste_profiles/aggregate")
        .add_query_param("windowDays", "100000000")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["window_days"], 100_000_000);
    assert_eq!(body["count"], 2);
    assert_close(&body["average"][0], 0.75);
}

#[tokio::test]
async fn test_unreadable_bodies_are_json_errors() {
    let (server, store) = create_test_server();

    let response = server
        .post("/api/v1/ratings")
        .bytes("{\"userId\": 7, \"rating\":".into())
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_body");

    // No JSON content type at all
    let response = server
        .post("/api/v1/admin/recipes")
        .text(r#"{"name": "Toast", "ingredients": ["Bread"], "taste_v": [0, 0, 0, 0, 0, 0, 1]}"#)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_body");
    assert!(response.json::<Value>()["message"].is_string());

    let response = server.put("/api/v1/taste_profile").bytes("".into()).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_body");

    let response = server
        .get("/api/v1/taste_profiles/aggregate?windowDays=1&windowDays=2")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_query");

    assert_eq!(store.rating_count().await, 0);
    let recipes: Vec<Value> = server.get("/api/v1/admin/recipes").await.json();
    assert!(recipes.is_empty());
}

#[tokio::test]
async fn test_admin_recipe_crud() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/admin/recipes")
        .json(&json!({ "name": "Salad", "ingredients": ["Lettuce", "Radish"], "taste_v": [0, 0, 0.4, 0.2, 0, 0, 0.9] }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["name"], "Salad");
    assert_eq!(created["ingredients"], json!(["Lettuce", "Radish"]));
    assert_eq!(created["featured"], false);

    let response = server
        .put(&format!("/api/v1/admin/recipes/{}", id))
        .json(&json!({ "featured": true }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["featured"], true);
    assert_eq!(updated["name"], "Salad");

    let response = server.get(&format!("/api/v1/admin/recipes/{}", id)).await;
    assert_eq!(response.json::<Value>()["featured"], true);

    let recipes: Vec<Value> = server.get("/api/v1/admin/recipes").await.json();
    assert_eq!(recipes.len(), 1);

    let response = server.delete(&format!("/api/v1/admin/recipes/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["ok"], true);

    let response = server.get(&format!("/api/v1/admin/recipes/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "recipe_not_found");

    let response = server.delete(&format!("/api/v1/admin/recipes/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_recipe_validation() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/admin/recipes")
        .json(&json!({ "name": "Incomplete", "ingredients": ["Egg"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "missing_fields");

    let response = server
        .post("/api/v1/admin/recipes")
        .json(&json!({ "name": "Mixed", "ingredients": ["Egg", 3], "taste_v": [0, 0, 0, 0, 0, 0, 0] }))
        .await;
    assert_eq!(error_code(&response), "missing_fields");

    let id = create_recipe(
        &server,
        json!({ "name": "Omelette", "ingredients": ["Egg"], "taste_v": [0, 0.4, 0, 0, 0.6, 0, 0] }),
    )
    .await;
    let path = format!("/api/v1/admin/recipes/{}", id);

    let cases = [
        (json!({ "name": "   " }), "invalid_name"),
        (json!({ "ingredients": "Egg" }), "invalid_ingredients"),
        (json!({ "taste_v": [1, 2, 3] }), "invalid_taste_v"),
        (json!({ "featured": "yes" }), "invalid_featured"),
        (json!({}), "nothing_to_update"),
    ];
    for (body, code) in cases {
        let response = server.put(&path).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&response), code);
    }

    let response = server.get("/api/v1/admin/recipes/0").await;
    assert_eq!(error_code(&response), "invalid_id");
}

#[tokio::test]
async fn test_delete_recipe_cascades_ratings() {
    let (server, store) = create_test_server();
    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Fries", "ingredients": ["Potato"], "taste_v": [0, 1, 0, 0, 0, 0, 1] }),
    )
    .await;
    server
        .post(&format!("/api/v1/recipes/{}/rate", recipe_id))
        .json(&json!({ "userId": "u1", "rating": 4 }))
        .await
        .assert_status_ok();
    assert_eq!(store.rating_count().await, 1);

    server
        .delete(&format!("/api/v1/admin/recipes/{}", recipe_id))
        .await
        .assert_status_ok();
    assert_eq!(store.rating_count().await, 0);

    let body: Value = server.get("/api/v1/ratings/aggregate").await.json();
    assert_eq!(body["rating_count"], 0);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (server, store) = create_test_server();
    let now = Utc::now();
    store
        .add_user(User {
            id: UserId::parse("7").unwrap(),
            email: "cook@example.com".to_string(),
            role: Role::User,
            created_at: now,
        })
        .await;
    store
        .add_user(User {
            id: UserId::parse("1").unwrap(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            created_at: now,
        })
        .await;

    let recipe_id = create_recipe(
        &server,
        json!({ "name": "Stew", "ingredients": ["Beef"], "taste_v": [0, 0.6, 0, 0, 1, 0, 0] }),
    )
    .await;
    ensure_profile(&server, "7").await;
    server
        .post("/api/v1/ratings")
        .json(&json!({ "userId": 7, "recipeId": recipe_id, "rating": 5 }))
        .await
        .assert_status_ok();

    // Privileged accounts are hidden from the listing
    let users: Vec<Value> = server.get("/api/v1/admin/users").await.json();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "cook@example.com");
    assert_eq!(users[0]["role"], "user");

    let response = server.delete("/api/v1/admin/users/1").await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response), "forbidden_admin_user");

    let response = server.delete("/api/v1/admin/users/7").await;
    response.assert_status_ok();
    assert_eq!(store.rating_count().await, 0);

    let response = server
        .get("/api/v1/taste_profile")
        .add_query_param("userId", "7")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.delete("/api/v1/admin/users/7").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "user_not_found");
}

#[tokio::test]
async fn test_admin_create_user() {
    let (server, store) = create_test_server();

    let response = server
        .post("/api/v1/admin/users")
        .json(&json!({ "email": "Cook@Example.com", "password": "secret1" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["user"]["email"], "cook@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());

    let user_id = UserId::parse(body["user"]["id"].as_str().unwrap()).unwrap();
    let hash = store.password_hash(&user_id).await.unwrap();
    assert_ne!(hash, "secret1");
    assert!(verify_password("secret1", &hash).unwrap());

    let response = server
        .post("/api/v1/admin/users")
        .json(&json!({ "email": "cook@example.com", "password": "another" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&response), "email_exists");

    for body in [
        json!({ "email": "cook.example.com", "password": "secret1" }),
        json!({ "email": "new@example.com", "password": "five5" }),
        json!({ "email": "new@example.com" }),
        json!({}),
    ] {
        let response = server.post("/api/v1/admin/users").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&response), "email_password_required");
    }

    let users: Vec<Value> = server.get("/api/v1/admin/users").await.json();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_admin_update_user() {
    let (server, store) = create_test_server();
    let now = Utc::now();
    store
        .add_user(User {
            id: UserId::parse("1").unwrap(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            created_at: now,
        })
        .await;

    let mut ids = Vec::new();
    for email in ["first@example.com", "second@example.com"] {
        let response = server
            .post("/api/v1/admin/users")
            .json(&json!({ "email": email, "password": "secret1" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        ids.push(response.json::<Value>()["user"]["id"].as_str().unwrap().to_string());
    }
    let path = format!("/api/v1/admin/users/{}", ids[0]);

    let response = server
        .put(&path)
        .json(&json!({ "email": "Renamed@Example.com" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["user"]["email"], "renamed@example.com");

    let response = server
        .put(&path)
        .json(&json!({ "password": "changed1" }))
        .await;
    response.assert_status_ok();
    let hash = store
        .password_hash(&UserId::parse(&ids[0]).unwrap())
        .await
        .unwrap();
    assert!(verify_password("changed1", &hash).unwrap());
    assert!(!verify_password("secret1", &hash).unwrap());

    let response = server
        .put(&path)
        .json(&json!({ "email": "second@example.com" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&response), "email_exists");

    let response = server.put(&path).json(&json!({ "email": "nope" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_email");

    let response = server.put(&path).json(&json!({ "password": "abc" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_password");

    let response = server
        .put(&path)
        .json(&json!({ "email": null, "password": null }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "nothing_to_update");

    let response = server
        .put("/api/v1/admin/users/1")
        .json(&json!({ "email": "boss@example.com" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response), "forbidden_admin_user");

    let response = server
        .put("/api/v1/admin/users/999")
        .json(&json!({ "email": "ghost@example.com" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "user_not_found");

    // Earlier failures left the account as it was
    let users: Vec<Value> = server.get("/api/v1/admin/users").await.json();
    assert!(users
        .iter()
        .any(|user| user["email"] == "renamed@example.com"));
}
