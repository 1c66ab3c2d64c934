use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use diesel::prelude::*;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    auth::AuthenticatedDoctor,
    error::{AppError, AppResult},
    models::Doctor,
    schema::doctors,
    state::AppState,
};

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod patients;
pub mod transcriptions;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::profile).put(auth::update_profile));

    let patients_routes = Router::new()
        .route(
            "/",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/:id",
            get(patients::get_patient)
                .patch(patients::update_patient)
                .delete(patients::delete_patient),
        );

    let transcriptions_routes = Router::new()
        .route("/", get(transcriptions::list_transcriptions))
        .route(
            "/:id",
            get(transcriptions::get_transcription)
                .patch(transcriptions::update_transcription)
                .delete(transcriptions::delete_transcription),
        );

    let dashboard_routes = Router::new()
        .route("/patients", get(dashboard::recent_patients))
        .route("/transcripts", get(dashboard::recent_transcripts))
        .route("/statistics/daily", get(dashboard::daily_statistics))
        .route("/statistics/monthly", get(dashboard::monthly_statistics))
        .route("/statistics/busiest-days", get(dashboard::busiest_days));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/patients", patients_routes)
        .nest("/api/transcriptions", transcriptions_routes)
        .nest("/api/dashboard", dashboard_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedDoctor, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}

/// Normalize pagination input: non-positive or missing values fall back to
/// page 1 / limit 10.
pub(crate) fn normalize_page(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = match page {
        Some(page) if page >= 1 => page,
        _ => DEFAULT_PAGE,
    };
    let limit = match limit {
        Some(limit) if limit >= 1 => limit,
        _ => DEFAULT_PAGE_LIMIT,
    };
    (page, limit)
}

/// Resolve the acting doctor row from the authenticated email. A token whose
/// doctor no longer exists is an authorization failure, not a missing
/// resource.
pub(crate) fn resolve_doctor(
    conn: &mut PgConnection,
    email: &str,
) -> AppResult<Doctor> {
    doctors::table
        .filter(doctors::email.eq(email))
        .first(conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)
}
