use crate::dto::admin_dto::{CreateQuestionPayload, UpdateQuestionPayload};
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::question::Question;
use crate::policy::{can_access_catalog, Action, Actor};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Questions of an exam in display order. Students only see questions
    /// of active exams; hiding the answer key is the DTO layer's job.
    pub async fn list_for_exam(&self, actor: &Actor, exam_id: Uuid) -> Result<Vec<Question>> {
        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;
        if !can_access_catalog(actor, exam.is_active, Action::Read) {
            return Err(Error::Forbidden);
        }
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE exam_id = $1 ORDER BY order_number, id"#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        exam_id: Uuid,
        payload: CreateQuestionPayload,
    ) -> Result<Question> {
        if !can_access_catalog(actor, true, Action::Create) {
            return Err(Error::Forbidden);
        }

        let mut tx = self.pool.begin().await?;
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (exam_id, question_text, option_a, option_b, option_c, option_d, correct_answer, marks, order_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(exam_id)
        .bind(payload.question_text)
        .bind(payload.option_a)
        .bind(payload.option_b)
        .bind(payload.option_c)
        .bind(payload.option_d)
        .bind(payload.correct_answer)
        .bind(payload.marks)
        .bind(payload.order_number.unwrap_or(0))
        .fetch_one(&mut *tx)
        .await?;

        Self::sync_total_marks(&mut tx, exam_id).await?;
        tx.commit().await?;
        Ok(question)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateQuestionPayload,
    ) -> Result<Question> {
        if !can_access_catalog(actor, true, Action::Update) {
            return Err(Error::Forbidden);
        }

        let mut tx = self.pool.begin().await?;
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET question_text = COALESCE($1, question_text),
                option_a = COALESCE($2, option_a),
                option_b = COALESCE($3, option_b),
                option_c = COALESCE($4, option_c),
                option_d = COALESCE($5, option_d),
                correct_answer = COALESCE($6, correct_answer),
                marks = COALESCE($7, marks),
                order_number = COALESCE($8, order_number)
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(payload.question_text)
        .bind(payload.option_a)
        .bind(payload.option_b)
        .bind(payload.option_c)
        .bind(payload.option_d)
        .bind(payload.correct_answer)
        .bind(payload.marks)
        .bind(payload.order_number)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        Self::sync_total_marks(&mut tx, question.exam_id).await?;
        tx.commit().await?;
        Ok(question)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if !can_access_catalog(actor, true, Action::Delete) {
            return Err(Error::Forbidden);
        }

        let mut tx = self.pool.begin().await?;
        let exam_id = sqlx::query_scalar::<_, Uuid>(
            r#"DELETE FROM questions WHERE id = $1 RETURNING exam_id"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        Self::sync_total_marks(&mut tx, exam_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Restores the exam's derived total inside the caller's transaction, so
    /// the invariant holds the moment the mutation commits.
    async fn sync_total_marks(tx: &mut Transaction<'_, Postgres>, exam_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE exams
            SET total_marks = (SELECT COALESCE(SUM(marks), 0) FROM questions WHERE exam_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(exam_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
