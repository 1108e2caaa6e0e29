use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::exam_attempt::{AttemptStatus, ExamAttempt};
use crate::models::question::{AnswerChoice, Question};
use crate::models::student_answer::StudentAnswer;
use crate::policy::{can_access_answer, can_access_attempt, Action, Actor};
use crate::services::scoring_service::ScoringService;
use crate::utils::time;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct StartedAttempt {
    pub attempt: ExamAttempt,
    pub remaining_seconds: i64,
    pub resumed: bool,
}

#[derive(Debug, Clone)]
pub struct AttemptProgress {
    pub attempt: ExamAttempt,
    pub remaining_seconds: i64,
    pub questions_answered: i64,
    pub total_questions: i64,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start: resume the live attempt for (student, exam) if one exists,
    /// otherwise create one with total_marks snapshotted from the exam.
    /// The partial unique index on live attempts makes the create atomic;
    /// losing the insert race means someone holds a live attempt, which we
    /// then resume. An attempt found past its deadline is finalized on the
    /// spot and returned as completed.
    pub async fn start_or_resume(&self, actor: &Actor, exam_id: Uuid) -> Result<StartedAttempt> {
        if !can_access_attempt(actor, actor.id, Action::Create) {
            return Err(Error::Forbidden);
        }

        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;
        if !exam.is_active {
            return Err(Error::NotFound("Exam is not available".to_string()));
        }

        for _ in 0..2 {
            let inserted = sqlx::query_as::<_, ExamAttempt>(
                r#"
                INSERT INTO exam_attempts (exam_id, student_id, total_marks)
                VALUES ($1, $2, $3)
                ON CONFLICT (student_id, exam_id) WHERE status = 'in_progress' DO NOTHING
                RETURNING *
                "#,
            )
            .bind(exam.id)
            .bind(actor.id)
            .bind(exam.total_marks)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(attempt) = inserted {
                tracing::info!(attempt_id = %attempt.id, exam_id = %exam.id, student_id = %actor.id, "attempt started");
                return Ok(StartedAttempt {
                    remaining_seconds: (exam.duration_minutes as i64) * 60,
                    attempt,
                    resumed: false,
                });
            }

            let existing = sqlx::query_as::<_, ExamAttempt>(
                r#"
                SELECT * FROM exam_attempts
                WHERE student_id = $1 AND exam_id = $2 AND status = 'in_progress'
                "#,
            )
            .bind(actor.id)
            .bind(exam.id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(attempt) = existing {
                let remaining =
                    time::remaining_seconds(attempt.started_at, exam.duration_minutes, time::now());
                if remaining == 0 {
                    let finalized = self.finalize(attempt.id).await?;
                    return Ok(StartedAttempt {
                        attempt: finalized,
                        remaining_seconds: 0,
                        resumed: true,
                    });
                }
                return Ok(StartedAttempt {
                    attempt,
                    remaining_seconds: remaining,
                    resumed: true,
                });
            }
            // the live attempt completed between insert and select; retry
        }

        Err(Error::Conflict(
            "Attempt creation raced with a submission, please retry".to_string(),
        ))
    }

    /// Answer: upsert keyed by (attempt_id, question_id). Only valid while
    /// the attempt is live and inside its deadline; a late answer finalizes
    /// the attempt instead of being recorded. Correctness is not computed
    /// here.
    pub async fn record_answer(
        &self,
        actor: &Actor,
        attempt_id: Uuid,
        question_id: Uuid,
        selected: AnswerChoice,
    ) -> Result<StudentAnswer> {
        let attempt = self.fetch(attempt_id).await?;
        if !can_access_answer(actor, attempt.student_id, Action::Create) {
            return Err(Error::Forbidden);
        }
        if attempt.status == AttemptStatus::Completed {
            return Err(Error::Conflict(
                "Attempt has already been submitted".to_string(),
            ));
        }

        let duration_minutes =
            sqlx::query_scalar::<_, i32>(r#"SELECT duration_minutes FROM exams WHERE id = $1"#)
                .bind(attempt.exam_id)
                .fetch_one(&self.pool)
                .await?;
        if time::remaining_seconds(attempt.started_at, duration_minutes, time::now()) == 0 {
            self.finalize(attempt.id).await?;
            return Err(Error::Conflict(
                "Time is up; the attempt has been submitted".to_string(),
            ));
        }

        let owning_exam =
            sqlx::query_scalar::<_, Uuid>(r#"SELECT exam_id FROM questions WHERE id = $1"#)
                .bind(question_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::BadRequest("Unknown question".to_string()))?;
        if owning_exam != attempt.exam_id {
            return Err(Error::BadRequest(
                "Question does not belong to this exam".to_string(),
            ));
        }

        let answer = sqlx::query_as::<_, StudentAnswer>(
            r#"
            INSERT INTO student_answers (attempt_id, question_id, selected_answer)
            VALUES ($1, $2, $3)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET selected_answer = EXCLUDED.selected_answer, answered_at = NOW()
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(question_id)
        .bind(selected)
        .fetch_one(&self.pool)
        .await?;
        Ok(answer)
    }

    /// Manual submit. Timeout submits go through [`finalize`] directly.
    pub async fn submit(&self, actor: &Actor, attempt_id: Uuid) -> Result<ExamAttempt> {
        let attempt = self.fetch(attempt_id).await?;
        if !can_access_attempt(actor, attempt.student_id, Action::Update) {
            return Err(Error::Forbidden);
        }
        if attempt.status == AttemptStatus::Completed {
            return Err(Error::Conflict(
                "Attempt has already been submitted".to_string(),
            ));
        }
        self.finalize(attempt_id).await
    }

    /// The terminal transition: one transaction writes every answer's
    /// is_correct flag, the score, the percentage and the completed status.
    /// Idempotent: finalizing a completed attempt returns it unchanged.
    pub async fn finalize(&self, attempt_id: Uuid) -> Result<ExamAttempt> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, ExamAttempt>(
            r#"SELECT * FROM exam_attempts WHERE id = $1 FOR UPDATE"#,
        )
        .bind(attempt_id)
        .fetch_one(&mut *tx)
        .await?;
        if attempt.status == AttemptStatus::Completed {
            tx.rollback().await?;
            return Ok(attempt);
        }

        sqlx::query(
            r#"
            UPDATE student_answers sa
            SET is_correct = (sa.selected_answer = q.correct_answer)
            FROM questions q
            WHERE q.id = sa.question_id AND sa.attempt_id = $1
            "#,
        )
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

        let questions =
            sqlx::query_as::<_, Question>(r#"SELECT * FROM questions WHERE exam_id = $1"#)
                .bind(attempt.exam_id)
                .fetch_all(&mut *tx)
                .await?;
        let answers = sqlx::query_as::<_, StudentAnswer>(
            r#"SELECT * FROM student_answers WHERE attempt_id = $1"#,
        )
        .bind(attempt_id)
        .fetch_all(&mut *tx)
        .await?;

        let grade = ScoringService::grade(&questions, &answers);
        let percentage = ScoringService::percentage(grade.score, attempt.total_marks);

        let updated = sqlx::query_as::<_, ExamAttempt>(
            r#"
            UPDATE exam_attempts
            SET status = 'completed', completed_at = NOW(), score = $1, percentage = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(grade.score)
        .bind(percentage)
        .bind(attempt_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            attempt_id = %attempt_id,
            score = grade.score,
            %percentage,
            "attempt scored"
        );
        Ok(updated)
    }

    /// Sweeper entry point: finalizes every live attempt whose deadline has
    /// passed, so an abandoned client cannot leave an attempt in progress
    /// forever.
    pub async fn finalize_expired(&self) -> Result<u64> {
        let expired = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT a.id
            FROM exam_attempts a
            JOIN exams e ON e.id = a.exam_id
            WHERE a.status = 'in_progress'
              AND a.started_at + make_interval(mins => e.duration_minutes) <= NOW()
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut count = 0u64;
        for id in expired {
            match self.finalize(id).await {
                Ok(_) => count += 1,
                Err(e) => {
                    tracing::error!(attempt_id = %id, error = ?e, "failed to finalize expired attempt")
                }
            }
        }
        if count > 0 {
            tracing::info!(count, "auto-submitted expired attempts");
        }
        Ok(count)
    }

    pub async fn progress(&self, actor: &Actor, attempt_id: Uuid) -> Result<AttemptProgress> {
        let attempt = self.fetch(attempt_id).await?;
        if !can_access_attempt(actor, attempt.student_id, Action::Read) {
            return Err(Error::Forbidden);
        }

        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(attempt.exam_id)
            .fetch_one(&self.pool)
            .await?;

        let (attempt, remaining_seconds) = if attempt.status == AttemptStatus::InProgress {
            let remaining =
                time::remaining_seconds(attempt.started_at, exam.duration_minutes, time::now());
            if remaining == 0 {
                (self.finalize(attempt.id).await?, 0)
            } else {
                (attempt, remaining)
            }
        } else {
            (attempt, 0)
        };

        let questions_answered = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM student_answers WHERE attempt_id = $1"#,
        )
        .bind(attempt_id)
        .fetch_one(&self.pool)
        .await?;
        let total_questions =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM questions WHERE exam_id = $1"#)
                .bind(attempt.exam_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(AttemptProgress {
            attempt,
            remaining_seconds,
            questions_answered,
            total_questions,
        })
    }

    /// Completed attempt plus its exam, for the result view. Pass/fail is
    /// derived from passing_marks at display time, never stored.
    pub async fn result(&self, actor: &Actor, attempt_id: Uuid) -> Result<(ExamAttempt, Exam)> {
        let attempt = self.fetch(attempt_id).await?;
        if !can_access_attempt(actor, attempt.student_id, Action::Read) {
            return Err(Error::Forbidden);
        }
        if attempt.status != AttemptStatus::Completed {
            return Err(Error::Conflict(
                "Attempt has not been submitted yet".to_string(),
            ));
        }
        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(attempt.exam_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((attempt, exam))
    }

    pub async fn get_with_answers(
        &self,
        actor: &Actor,
        attempt_id: Uuid,
    ) -> Result<(ExamAttempt, Vec<StudentAnswer>)> {
        let attempt = self.fetch(attempt_id).await?;
        if !can_access_attempt(actor, attempt.student_id, Action::Read) {
            return Err(Error::Forbidden);
        }
        let answers = sqlx::query_as::<_, StudentAnswer>(
            r#"SELECT * FROM student_answers WHERE attempt_id = $1 ORDER BY answered_at"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok((attempt, answers))
    }

    pub async fn list_my(&self, actor: &Actor) -> Result<Vec<ExamAttempt>> {
        let attempts = sqlx::query_as::<_, ExamAttempt>(
            r#"SELECT * FROM exam_attempts WHERE student_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(actor.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        exam_id: Option<Uuid>,
        student_id: Option<Uuid>,
        status: Option<AttemptStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ExamAttempt>, i64)> {
        if !actor.is_admin() {
            return Err(Error::Forbidden);
        }
        let offset = (page - 1) * limit;
        let rows = sqlx::query_as::<_, ExamAttempt>(
            r#"
            SELECT * FROM exam_attempts
            WHERE ($1::uuid IS NULL OR exam_id = $1)
              AND ($2::uuid IS NULL OR student_id = $2)
              AND ($3::attempt_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(exam_id)
        .bind(student_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM exam_attempts
            WHERE ($1::uuid IS NULL OR exam_id = $1)
              AND ($2::uuid IS NULL OR student_id = $2)
              AND ($3::attempt_status IS NULL OR status = $3)
            "#,
        )
        .bind(exam_id)
        .bind(student_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn fetch(&self, attempt_id: Uuid) -> Result<ExamAttempt> {
        let attempt =
            sqlx::query_as::<_, ExamAttempt>(r#"SELECT * FROM exam_attempts WHERE id = $1"#)
                .bind(attempt_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(attempt)
    }
}
