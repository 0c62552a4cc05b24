//! Public HTTP endpoints

pub mod credits;
pub mod payments;
pub mod projects;
pub mod prompts;
pub mod usage;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

/// Routes for the catalog, generation, quota, credits and payments
pub fn create_handlers_router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list_projects))
        .route("/prompts/{project_id}/generate", post(prompts::generate_prompt))
        .route("/prompts/rate-limit", get(prompts::rate_limit_status))
        .route("/api/usage", get(usage::get_usage))
        .route("/api/credits/{user_id}", get(credits::get_credits))
        .route("/api/credits/{user_id}/deduct", post(credits::deduct_credits))
        .route(
            "/api/create-checkout-session",
            post(payments::create_checkout_session),
        )
        .route("/api/verify-payment", get(payments::verify_payment))
        .route("/api/stripe/webhook", post(payments::stripe_webhook))
}
