use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use examination_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth, cors, rate_limit},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        // Expired live attempts get auto-submitted even if the client never
        // comes back; the deadline is server time, not a browser countdown.
        let state = app_state.clone();
        let interval = Duration::from_secs(config.attempt_sweep_seconds);
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.attempt_service.finalize_expired().await {
                    tracing::error!("Attempt sweeper error: {:?}", e);
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let me_api = Router::new()
        .route(
            "/api/me",
            get(routes::profile::get_me).patch(routes::profile::update_me),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::authenticate,
        ));

    let admin_api = Router::new()
        .route("/api/admin/profiles", get(routes::admin::list_profiles))
        .route(
            "/api/admin/profiles/:id/role",
            patch(routes::admin::update_profile_role),
        )
        .route(
            "/api/admin/subjects",
            get(routes::admin::list_subjects).post(routes::admin::create_subject),
        )
        .route(
            "/api/admin/subjects/:id",
            patch(routes::admin::update_subject).delete(routes::admin::delete_subject),
        )
        .route(
            "/api/admin/exams",
            get(routes::admin::list_exams).post(routes::admin::create_exam),
        )
        .route(
            "/api/admin/exams/:id",
            get(routes::admin::get_exam)
                .patch(routes::admin::update_exam)
                .delete(routes::admin::delete_exam),
        )
        .route(
            "/api/admin/exams/:id/questions",
            get(routes::admin::list_questions).post(routes::admin::create_question),
        )
        .route(
            "/api/admin/questions/:id",
            patch(routes::admin::update_question).delete(routes::admin::delete_question),
        )
        .route("/api/admin/attempts", get(routes::admin::list_attempts))
        .route("/api/admin/attempts/:id", get(routes::admin::get_attempt))
        .layer(axum_middleware::from_fn(auth::require_admin))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::authenticate,
        ))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.admin_rps),
            rate_limit::rps_middleware,
        ));

    let student_api = Router::new()
        .route("/api/student/subjects", get(routes::student::list_subjects))
        .route("/api/student/exams", get(routes::student::list_exams))
        .route("/api/student/exams/:id", get(routes::student::get_exam))
        .route(
            "/api/student/exams/:id/start",
            post(routes::student::start_exam),
        )
        .route("/api/student/attempts", get(routes::student::my_attempts))
        .route(
            "/api/student/attempts/:id/answer",
            patch(routes::student::save_answer),
        )
        .route(
            "/api/student/attempts/:id/submit",
            post(routes::student::submit_attempt),
        )
        .route(
            "/api/student/attempts/:id/status",
            get(routes::student::attempt_status),
        )
        .route(
            "/api/student/attempts/:id/result",
            get(routes::student::attempt_result),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::authenticate,
        ))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.student_rps),
            rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(me_api)
        .merge(admin_api)
        .merge(student_api)
        .with_state(app_state)
        .layer(cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
