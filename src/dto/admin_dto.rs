use crate::models::exam_attempt::AttemptStatus;
use crate::models::profile::Role;
use crate::models::question::AnswerChoice;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectPayload {
    #[validate(length(min = 1, message = "Subject name cannot be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateExamPayload {
    pub subject_id: Uuid,

    #[validate(length(min = 1, message = "Exam title cannot be empty"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: i32,

    #[validate(range(min = 0, message = "Passing marks cannot be negative"))]
    pub passing_marks: i32,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateExamPayload {
    pub subject_id: Option<Uuid>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: Option<i32>,

    #[validate(range(min = 0, message = "Passing marks cannot be negative"))]
    pub passing_marks: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub question_text: String,

    #[validate(length(min = 1))]
    pub option_a: String,
    #[validate(length(min = 1))]
    pub option_b: String,
    #[validate(length(min = 1))]
    pub option_c: String,
    #[validate(length(min = 1))]
    pub option_d: String,

    pub correct_answer: AnswerChoice,

    #[validate(range(min = 1, message = "Marks must be at least 1"))]
    pub marks: i32,

    pub order_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQuestionPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub question_text: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub option_a: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub option_b: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub option_c: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub option_d: Option<String>,

    pub correct_answer: Option<AnswerChoice>,

    #[validate(range(min = 1, message = "Marks must be at least 1"))]
    pub marks: Option<i32>,

    pub order_number: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: Role,
}

/// Owner-editable profile fields; role is deliberately absent.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExamListQuery {
    pub subject_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptListQuery {
    pub exam_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub status: Option<AttemptStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// Trims strings and folds empty ones to None, so a blank form field cannot
// overwrite a stored value.
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
