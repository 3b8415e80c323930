pub mod admin;
pub mod health;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::ratelimit::middleware::general_rate_limit;
use crate::state::AppState;
use crate::{chat, contact, jobsearch, matcher, resume};

pub fn build_router(state: AppState) -> Router {
    // Everything under /api/v1 counts against the general per-IP limit
    // and the deny list. /health stays outside so probes are never throttled.
    let api = Router::new()
        // Assistant chat
        .route("/api/v1/chat", post(chat::handle_chat))
        .route(
            "/api/v1/chat/history/:conversation_id",
            get(chat::handle_chat_history),
        )
        // AI career tools
        .route("/api/v1/job-matcher", post(matcher::handle_job_match))
        .route(
            "/api/v1/resume-customizer",
            post(resume::handle_resume_customizer),
        )
        .route("/api/v1/cover-letter", post(resume::handle_cover_letter))
        // Aggregated job search
        .route("/api/v1/job-search", get(jobsearch::handle_job_search))
        // Contact form
        .route("/api/v1/contact", post(contact::handle_contact))
        // Operator surface
        .route(
            "/api/v1/admin/rate-limit/reset",
            post(admin::handle_rate_limit_reset),
        )
        .route("/api/v1/admin/ip-block", post(admin::handle_ip_block))
        .route(
            "/api/v1/admin/ip-block/:ip",
            delete(admin::handle_ip_unblock),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            general_rate_limit,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
