use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::exam_attempt::{AttemptStatus, ExamAttempt};
use crate::models::question::{AnswerChoice, Question};

/// A question as students see it: the answer key never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub marks: i32,
    pub order_number: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
            marks: q.marks,
            order_number: q.order_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamDetailResponse {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub passing_marks: i32,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub exam_id: Uuid,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub total_marks: i32,
    pub resumed: bool,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaveAnswerRequest {
    pub question_id: Uuid,
    pub selected_answer: AnswerChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveAnswerResponse {
    pub saved: bool,
    pub question_id: Uuid,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptStatusResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub questions_answered: i64,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptResultResponse {
    pub attempt_id: Uuid,
    pub exam_id: Uuid,
    pub status: AttemptStatus,
    pub score: i32,
    pub percentage: Decimal,
    pub total_marks: i32,
    pub passing_marks: i32,
    /// Derived as score >= passing_marks; recomputed on every read.
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AttemptResultResponse {
    pub fn from_attempt(attempt: ExamAttempt, passing_marks: i32) -> Self {
        let score = attempt.score.unwrap_or(0);
        Self {
            attempt_id: attempt.id,
            exam_id: attempt.exam_id,
            status: attempt.status,
            score,
            percentage: attempt.percentage.unwrap_or_default(),
            total_marks: attempt.total_marks,
            passing_marks,
            passed: score >= passing_marks,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
        }
    }
}
