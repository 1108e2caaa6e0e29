use crate::dto::admin_dto::{CreateExamPayload, UpdateExamPayload};
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::policy::{can_access_catalog, Action, Actor};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ExamService {
    pool: PgPool,
}

impl ExamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateExamPayload) -> Result<Exam> {
        if !can_access_catalog(actor, true, Action::Create) {
            return Err(Error::Forbidden);
        }
        let exam = sqlx::query_as::<_, Exam>(
            r#"
            INSERT INTO exams (subject_id, title, description, duration_minutes, passing_marks, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.subject_id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.duration_minutes)
        .bind(payload.passing_marks)
        .bind(payload.is_active.unwrap_or(true))
        .bind(actor.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exam)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Exam> {
        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM exams WHERE id = $1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !can_access_catalog(actor, exam.is_active, Action::Read) {
            return Err(Error::Forbidden);
        }
        Ok(exam)
    }

    pub async fn list(&self, actor: &Actor, subject_id: Option<Uuid>) -> Result<Vec<Exam>> {
        if !actor.is_admin() {
            return Err(Error::Forbidden);
        }
        let exams = sqlx::query_as::<_, Exam>(
            r#"
            SELECT * FROM exams
            WHERE ($1::uuid IS NULL OR subject_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    pub async fn list_active(&self, subject_id: Option<Uuid>) -> Result<Vec<Exam>> {
        let exams = sqlx::query_as::<_, Exam>(
            r#"
            SELECT * FROM exams
            WHERE is_active = TRUE
              AND ($1::uuid IS NULL OR subject_id = $1)
            ORDER BY title
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, payload: UpdateExamPayload) -> Result<Exam> {
        if !can_access_catalog(actor, true, Action::Update) {
            return Err(Error::Forbidden);
        }
        let exam = sqlx::query_as::<_, Exam>(
            r#"
            UPDATE exams
            SET subject_id = COALESCE($1, subject_id),
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration_minutes = COALESCE($4, duration_minutes),
                passing_marks = COALESCE($5, passing_marks),
                is_active = COALESCE($6, is_active)
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(payload.subject_id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.duration_minutes)
        .bind(payload.passing_marks)
        .bind(payload.is_active)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exam)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if !can_access_catalog(actor, true, Action::Delete) {
            return Err(Error::Forbidden);
        }
        let result = sqlx::query(r#"DELETE FROM exams WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Exam not found".to_string()));
        }
        Ok(())
    }
}
