use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::ExamListQuery;
use crate::dto::student_dto::{
    AttemptResultResponse, AttemptStatusResponse, ExamDetailResponse, PublicQuestion,
    SaveAnswerRequest, SaveAnswerResponse, StartAttemptResponse,
};
use crate::error::Result;
use crate::policy::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let subjects = state.subject_service.list_active().await?;
    Ok(Json(subjects))
}

#[axum::debug_handler]
pub async fn list_exams(
    State(state): State<AppState>,
    Query(query): Query<ExamListQuery>,
) -> Result<impl IntoResponse> {
    let exams = state.exam_service.list_active(query.subject_id).await?;
    Ok(Json(exams))
}

#[axum::debug_handler]
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let exam = state.exam_service.get(&actor, id).await?;
    let questions = state.question_service.list_for_exam(&actor, id).await?;
    let response = ExamDetailResponse {
        id: exam.id,
        subject_id: exam.subject_id,
        title: exam.title,
        description: exam.description,
        duration_minutes: exam.duration_minutes,
        total_marks: exam.total_marks,
        passing_marks: exam.passing_marks,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    };
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/student/exams/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Exam ID")
    ),
    responses(
        (status = 200, description = "Attempt started or resumed", body = StartAttemptResponse),
        (status = 404, description = "Exam does not exist or is not available")
    )
)]
#[axum::debug_handler]
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let started = state.attempt_service.start_or_resume(&actor, id).await?;
    let questions = state.question_service.list_for_exam(&actor, id).await?;
    let response = StartAttemptResponse {
        attempt_id: started.attempt.id,
        exam_id: started.attempt.exam_id,
        status: started.attempt.status,
        started_at: started.attempt.started_at,
        remaining_seconds: started.remaining_seconds,
        total_marks: started.attempt.total_marks,
        resumed: started.resumed,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SaveAnswerRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;
    let answer = state
        .attempt_service
        .record_answer(&actor, attempt_id, req.question_id, req.selected_answer)
        .await?;
    Ok(Json(SaveAnswerResponse {
        saved: true,
        question_id: answer.question_id,
        answered_at: answer.answered_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/student/attempts/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Attempt scored", body = AttemptResultResponse),
        (status = 409, description = "Attempt was already submitted")
    )
)]
#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.attempt_service.submit(&actor, attempt_id).await?;
    let (attempt, exam) = state.attempt_service.result(&actor, attempt_id).await?;
    let _ = state
        .audit_service
        .log(
            Some(actor.id),
            "submit_attempt",
            "exam_attempt",
            attempt_id,
            Some(json!({"score": attempt.score, "percentage": attempt.percentage})),
        )
        .await?;
    Ok(Json(AttemptResultResponse::from_attempt(
        attempt,
        exam.passing_marks,
    )))
}

#[axum::debug_handler]
pub async fn attempt_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let progress = state.attempt_service.progress(&actor, attempt_id).await?;
    Ok(Json(AttemptStatusResponse {
        attempt_id: progress.attempt.id,
        status: progress.attempt.status,
        started_at: progress.attempt.started_at,
        remaining_seconds: progress.remaining_seconds,
        questions_answered: progress.questions_answered,
        total_questions: progress.total_questions,
    }))
}

#[axum::debug_handler]
pub async fn attempt_result(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (attempt, exam) = state.attempt_service.result(&actor, attempt_id).await?;
    Ok(Json(AttemptResultResponse::from_attempt(
        attempt,
        exam.passing_marks,
    )))
}

#[axum::debug_handler]
pub async fn my_attempts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let attempts = state.attempt_service.list_my(&actor).await?;
    Ok(Json(attempts))
}
