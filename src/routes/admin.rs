use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{
    AttemptListQuery, CreateExamPayload, CreateQuestionPayload, CreateSubjectPayload,
    ExamListQuery, PageQuery, UpdateExamPayload, UpdateQuestionPayload, UpdateRolePayload,
    UpdateSubjectPayload,
};
use crate::error::Result;
use crate::policy::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let result = state.profile_service.list(&actor, page, per_page).await?;
    Ok(Json(result))
}

#[utoipa::path(
    patch,
    path = "/api/admin/profiles/{id}/role",
    params(
        ("id" = Uuid, Path, description = "Profile ID")
    ),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Role updated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Profile not found")
    )
)]
#[axum::debug_handler]
pub async fn update_profile_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.set_role(&actor, id, payload.role).await?;
    let _ = state
        .audit_service
        .log(
            Some(actor.id),
            "update_role",
            "profile",
            id,
            Some(json!({"role": payload.role})),
        )
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/admin/subjects",
    request_body = CreateSubjectPayload,
    responses(
        (status = 201, description = "Subject created"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateSubjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let subject = state.subject_service.create(&actor, payload).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "create", "subject", subject.id, None)
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[axum::debug_handler]
pub async fn list_subjects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let subjects = state.subject_service.list(&actor).await?;
    Ok(Json(subjects))
}

#[axum::debug_handler]
pub async fn update_subject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let subject = state.subject_service.update(&actor, id, payload).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "update", "subject", id, None)
        .await?;
    Ok(Json(subject))
}

#[utoipa::path(
    delete,
    path = "/api/admin/subjects/{id}",
    params(
        ("id" = Uuid, Path, description = "Subject ID")
    ),
    responses(
        (status = 204, description = "Subject and its exams deleted"),
        (status = 404, description = "Subject not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.subject_service.delete(&actor, id).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "delete", "subject", id, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateExamPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let exam = state.exam_service.create(&actor, payload).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "create", "exam", exam.id, None)
        .await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[axum::debug_handler]
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ExamListQuery>,
) -> Result<impl IntoResponse> {
    let exams = state.exam_service.list(&actor, query.subject_id).await?;
    Ok(Json(exams))
}

#[axum::debug_handler]
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let exam = state.exam_service.get(&actor, id).await?;
    Ok(Json(exam))
}

#[axum::debug_handler]
pub async fn update_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExamPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let exam = state.exam_service.update(&actor, id, payload).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "update", "exam", id, None)
        .await?;
    Ok(Json(exam))
}

#[axum::debug_handler]
pub async fn delete_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.exam_service.delete(&actor, id).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "delete", "exam", id, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let questions = state.question_service.list_for_exam(&actor, exam_id).await?;
    Ok(Json(questions))
}

#[utoipa::path(
    post,
    path = "/api/admin/exams/{id}/questions",
    params(
        ("id" = Uuid, Path, description = "Exam ID")
    ),
    request_body = CreateQuestionPayload,
    responses(
        (status = 201, description = "Question created; exam total recalculated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state
        .question_service
        .create(&actor, exam_id, payload)
        .await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "create", "question", question.id, None)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state.question_service.update(&actor, id, payload).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "update", "question", id, None)
        .await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.question_service.delete(&actor, id).await?;
    let _ = state
        .audit_service
        .log(Some(actor.id), "delete", "question", id, None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AttemptListQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let (items, total) = state
        .attempt_service
        .list(
            &actor,
            query.exam_id,
            query.student_id,
            query.status,
            page,
            per_page,
        )
        .await?;
    Ok(Json(json!({
        "items": items,
        "total": total,
        "page": page,
        "per_page": per_page,
    })))
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (attempt, answers) = state.attempt_service.get_with_answers(&actor, id).await?;
    Ok(Json(json!({
        "attempt": attempt,
        "answers": answers,
    })))
}
