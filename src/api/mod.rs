mod activities;
pub mod auth;
mod calendar;
mod courses;
mod enrollments;
pub mod error;
mod semesters;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify", post(auth::verify))
        .route("/resend-code", post(auth::resend_code))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate));

    // Protected API routes
    let api_routes = Router::new()
        // Course catalog
        .route("/courses", get(courses::list_courses))
        .route("/courses", post(courses::create_course))
        .route("/courses/:id", get(courses::get_course))
        // Enrollments
        .route("/user/courses", get(enrollments::list_enrollments))
        .route("/user/courses", post(enrollments::create_enrollment))
        .route("/user/courses/stats", get(enrollments::enrollment_stats))
        .route("/user/courses/:id", put(enrollments::update_enrollment))
        .route("/user/courses/:id", delete(enrollments::delete_enrollment))
        // Semesters
        .route("/semesters", get(semesters::list_semesters))
        .route("/semesters", post(semesters::create_semester))
        .route("/semesters/:id", get(semesters::get_semester))
        .route("/semesters/:id", put(semesters::update_semester))
        .route("/semesters/:id", delete(semesters::delete_semester))
        .route("/semesters/:id/courses", get(semesters::list_semester_courses))
        .route("/semesters/:id/courses", post(semesters::add_semester_course))
        .route(
            "/semesters/:id/courses/:course_id",
            delete(semesters::remove_semester_course),
        )
        // Calendar
        .route("/activities", get(activities::list_activities))
        .route("/activities", post(activities::create_activity))
        .route("/activities/:id", put(activities::update_activity))
        .route("/activities/:id", delete(activities::delete_activity))
        .route("/activity-types", get(activities::list_activity_types))
        .route("/activity-types", post(activities::create_activity_type))
        .route("/activity-types/:id", put(activities::update_activity_type))
        .route(
            "/activity-types/:id",
            delete(activities::delete_activity_type),
        )
        .route("/templates", get(activities::list_templates))
        .route("/templates", post(activities::create_template))
        .route("/templates/:id", put(activities::update_template))
        .route("/templates/:id", delete(activities::delete_template))
        .route("/calendar", get(calendar::get_calendar))
        // Maintenance (admin role checked in the handler)
        .route("/admin/seed-courses", post(courses::seed_courses))
        // Protected by auth
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
