use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

use examination_backend::middleware::auth;
use examination_backend::models::profile::Role;
use examination_backend::{routes, AppState};

fn init_test_env() -> bool {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").map(|v| v.trim().is_empty()).unwrap_or(true) {
        eprintln!("skipping: DATABASE_URL is not set");
        return false;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("ADMIN_RPS", "1000");
    env::set_var("STUDENT_RPS", "1000");
    let _ = examination_backend::config::init_config();
    true
}

fn make_token(id: Uuid) -> String {
    let claims = auth::Claims {
        sub: id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"test_secret_key"),
    )
    .expect("encode token")
}

async fn seed_profile(pool: &sqlx::PgPool, role: Role, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO profiles (id, full_name, email, role) VALUES ($1, $2, $3, $4)"#,
    )
    .bind(id)
    .bind(name)
    .bind(format!("{}_{}@example.com", name.to_lowercase().replace(' ', "_"), id))
    .bind(role)
    .execute(pool)
    .await
    .expect("seed profile");
    id
}

fn admin_app(state: AppState) -> Router {
    let me_api = Router::new()
        .route(
            "/api/me",
            get(routes::profile::get_me).patch(routes::profile::update_me),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
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
        .layer(axum::middleware::from_fn(auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    let student_api = Router::new()
        .route(
            "/api/student/exams/:id/start",
            post(routes::student::start_exam),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .merge(me_api)
        .merge(admin_api)
        .merge(student_api)
        .with_state(state)
}

async fn body_json(res: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn request(method: &str, uri: String, token: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn admin_catalog_and_authorization() {
    if !init_test_env() {
        return;
    }
    let pool = examination_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let state = AppState::new(pool.clone());
    let app = admin_app(state.clone());

    let admin_id = seed_profile(&pool, Role::Admin, "Catalog Admin").await;
    let student_id = seed_profile(&pool, Role::Student, "Catalog Student").await;
    let admin_token = make_token(admin_id);
    let student_token = make_token(student_id);

    // no profile row: denied outright, even with a valid token
    let ghost_token = make_token(Uuid::new_v4());
    let res = app
        .clone()
        .oneshot(request("GET", "/api/me".into(), &ghost_token, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // students are shut out of the admin surface
    let res = app
        .clone()
        .oneshot(request("GET", "/api/admin/subjects".into(), &student_token, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // admin builds the catalog over HTTP
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/subjects".into(),
            &admin_token,
            Some(serde_json::json!({"name": "Physics", "description": "Mechanics"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let subject = body_json(res).await;
    let subject_id = subject["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/exams".into(),
            &admin_token,
            Some(serde_json::json!({
                "subject_id": subject_id,
                "title": "Kinematics",
                "duration_minutes": 45,
                "passing_marks": 4,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let exam = body_json(res).await;
    let exam_id = exam["id"].as_str().unwrap().to_string();
    assert_eq!(exam["total_marks"], 0);

    // two questions; the derived total follows every mutation
    let mut question_ids = Vec::new();
    for (text, correct, marks) in [("v = ?", "A", 3), ("a = ?", "C", 7)] {
        let res = app
            .clone()
            .oneshot(request(
                "POST",
                format!("/api/admin/exams/{}/questions", exam_id),
                &admin_token,
                Some(serde_json::json!({
                    "question_text": text,
                    "option_a": "d/t",
                    "option_b": "d*t",
                    "option_c": "dv/dt",
                    "option_d": "none",
                    "correct_answer": correct,
                    "marks": marks,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let question = body_json(res).await;
        question_ids.push(question["id"].as_str().unwrap().to_string());
    }
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            format!("/api/admin/exams/{}", exam_id),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["total_marks"], 10);

    let res = app
        .clone()
        .oneshot(request(
            "PATCH",
            format!("/api/admin/questions/{}", question_ids[0]),
            &admin_token,
            Some(serde_json::json!({"marks": 5})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            format!("/api/admin/exams/{}", exam_id),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["total_marks"], 12);

    let res = app
        .clone()
        .oneshot(request(
            "DELETE",
            format!("/api/admin/questions/{}", question_ids[1]),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app
        .clone()
        .oneshot(request(
            "GET",
            format!("/api/admin/exams/{}", exam_id),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["total_marks"], 5);

    // a student cannot delete the subject, and nothing disappears
    let res = app
        .clone()
        .oneshot(request(
            "DELETE",
            format!("/api/admin/subjects/{}", subject_id),
            &student_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let survivors: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM exams WHERE subject_id = $1"#)
        .bind(Uuid::parse_str(&subject_id).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(survivors, 1);

    // a student cannot hand themselves a role through their own profile
    let res = app
        .clone()
        .oneshot(request(
            "PATCH",
            "/api/me".into(),
            &student_token,
            Some(serde_json::json!({"full_name": "Still A Student", "role": "admin"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me = body_json(res).await;
    assert_eq!(me["role"], "student");
    assert_eq!(me["full_name"], "Still A Student");

    // role changes are an admin operation, and they bite on the next request
    let res = app
        .clone()
        .oneshot(request(
            "PATCH",
            format!("/api/admin/profiles/{}/role", student_id),
            &student_token,
            Some(serde_json::json!({"role": "admin"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(request(
            "PATCH",
            format!("/api/admin/profiles/{}/role", student_id),
            &admin_token,
            Some(serde_json::json!({"role": "admin"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(request("GET", "/api/admin/subjects".into(), &student_token, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(request(
            "PATCH",
            format!("/api/admin/profiles/{}/role", student_id),
            &admin_token,
            Some(serde_json::json!({"role": "student"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(request("GET", "/api/admin/subjects".into(), &student_token, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // deleting the subject cascades; the exam is gone and cannot be started
    let res = app
        .clone()
        .oneshot(request(
            "DELETE",
            format!("/api/admin/subjects/{}", subject_id),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            format!("/api/admin/exams/{}", exam_id),
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            format!("/api/student/exams/{}/start", exam_id),
            &student_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let orphan_questions: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM questions WHERE exam_id = $1"#)
            .bind(Uuid::parse_str(&exam_id).unwrap())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphan_questions, 0);
}
