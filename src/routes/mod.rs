use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::TasteStore,
    error::AppResult,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::passwords::DEFAULT_COST,
};

pub mod admin;
pub mod aggregates;
pub mod extract;
pub mod profiles;
pub mod ratings;
pub mod recipes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TasteStore>,
    /// bcrypt work factor used when setting account passwords
    pub password_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn TasteStore>) -> Self {
        Self {
            store,
            password_cost: DEFAULT_COST,
        }
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ratings", post(ratings::submit))
        .route("/ratings/aggregate", get(aggregates::ratings))
        .route(
            "/taste_profile",
            get(profiles::get_profile)
                .post(profiles::ensure_profile)
                .put(profiles::replace_profile),
        )
        .route("/taste_profiles/aggregate", get(aggregates::taste_profiles))
        .route("/recipes", get(recipes::recommend))
        .route("/recipes/:id/rate", post(recipes::rate))
        .route(
            "/admin/recipes",
            get(admin::list_recipes).post(admin::create_recipe),
        )
        .route(
            "/admin/recipes/:id",
            get(admin::get_recipe)
                .put(admin::update_recipe)
                .delete(admin::delete_recipe),
        )
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<(StatusCode, Json<Value>)> {
    state.store.ping().await?;
    Ok((StatusCode::OK, Json(json!({ "status": "healthy" }))))
}
