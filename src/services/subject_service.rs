use crate::dto::admin_dto::{CreateSubjectPayload, UpdateSubjectPayload};
use crate::error::{Error, Result};
use crate::models::subject::Subject;
use crate::policy::{can_access_catalog, Action, Actor};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubjectService {
    pool: PgPool,
}

impl SubjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateSubjectPayload) -> Result<Subject> {
        if !can_access_catalog(actor, true, Action::Create) {
            return Err(Error::Forbidden);
        }
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (name, description, is_active, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.name)
        .bind(payload.description)
        .bind(payload.is_active.unwrap_or(true))
        .bind(actor.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(subject)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(r#"SELECT * FROM subjects WHERE id = $1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !can_access_catalog(actor, subject.is_active, Action::Read) {
            return Err(Error::Forbidden);
        }
        Ok(subject)
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Subject>> {
        if !actor.is_admin() {
            return Err(Error::Forbidden);
        }
        let subjects =
            sqlx::query_as::<_, Subject>(r#"SELECT * FROM subjects ORDER BY created_at DESC"#)
                .fetch_all(&self.pool)
                .await?;
        Ok(subjects)
    }

    /// The student-facing catalog: active rows only, enforced here rather
    /// than left to the caller.
    pub async fn list_active(&self) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            r#"SELECT * FROM subjects WHERE is_active = TRUE ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateSubjectPayload,
    ) -> Result<Subject> {
        if !can_access_catalog(actor, true, Action::Update) {
            return Err(Error::Forbidden);
        }
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                is_active = COALESCE($3, is_active)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(payload.name)
        .bind(payload.description)
        .bind(payload.is_active)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(subject)
    }

    /// Cascades to the subject's exams, questions and attempts by schema
    /// design.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if !can_access_catalog(actor, true, Action::Delete) {
            return Err(Error::Forbidden);
        }
        let result = sqlx::query(r#"DELETE FROM subjects WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Subject not found".to_string()));
        }
        tracing::info!(subject_id = %id, "subject deleted with cascade");
        Ok(())
    }
}
