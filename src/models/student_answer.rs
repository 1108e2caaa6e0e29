use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::question::AnswerChoice;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_answer: AnswerChoice,
    /// NULL while the attempt is live; set by the scoring pass on submit.
    pub is_correct: Option<bool>,
    pub answered_at: DateTime<Utc>,
}
