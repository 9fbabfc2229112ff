// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assignment, auth, chat, leaderboard, project, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, reviewer_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: auth, quiz browsing, the ranked leaderboard.
/// * Authenticated routes: attempts, assignments, projects, chat.
/// * Reviewer routes (mentor/admin): quiz authoring, project verification.
/// * Admin routes: user management, manual leaderboard recompute.
///
/// The leaderboard has no write route; entries change only through the
/// recompute hook of the handlers that write source records.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://localhost:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .merge(
            Router::new()
                .route("/generate", post(quiz::generate_quiz))
                .route("/{id}/attempts", post(quiz::start_attempt))
                .layer(require_auth.clone()),
        )
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .layer(middleware::from_fn(reviewer_middleware))
                .layer(require_auth.clone()),
        );

    let attempt_routes = Router::new()
        .route("/mine", get(quiz::list_my_attempts))
        .route("/{id}/submit", post(quiz::submit_attempt))
        .layer(require_auth.clone());

    let assignment_routes = Router::new()
        .route(
            "/",
            get(assignment::list_my_assignments).post(assignment::create_assignment),
        )
        .route("/{id}/submit", post(assignment::submit_assignment))
        .layer(require_auth.clone());

    let project_routes = Router::new()
        .route(
            "/",
            get(project::list_my_projects).post(project::create_project),
        )
        .layer(require_auth.clone())
        .merge(
            Router::new()
                .route("/pending", get(project::list_pending_projects))
                .route("/{id}/verify", post(project::verify_project))
                .route("/{id}/revoke", post(project::revoke_project))
                .layer(middleware::from_fn(reviewer_middleware))
                .layer(require_auth.clone()),
        );

    let leaderboard_routes = Router::new()
        .route("/", get(leaderboard::get_leaderboard))
        .merge(
            Router::new()
                .route("/me", get(leaderboard::get_my_entry))
                .layer(require_auth.clone()),
        );

    let chat_routes = Router::new()
        .route("/", get(chat::get_history).post(chat::send_message))
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user).delete(admin::delete_user))
        .route(
            "/leaderboard/{user_id}/recompute",
            post(leaderboard::recompute_user),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/assignments", assignment_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        .nest("/api/chat", chat_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
