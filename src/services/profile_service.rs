use crate::dto::admin_dto::UpdateProfilePayload;
use crate::error::{Error, Result};
use crate::models::profile::{Profile, Role};
use crate::policy::{can_access_profile, Action, Actor};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedProfiles {
    pub items: Vec<Profile>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Profile> {
        if !can_access_profile(actor, id, Action::Read) {
            return Err(Error::Forbidden);
        }
        let profile =
            sqlx::query_as::<_, Profile>(r#"SELECT * FROM profiles WHERE id = $1"#)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(profile)
    }

    pub async fn list(&self, actor: &Actor, page: i64, per_page: i64) -> Result<PaginatedProfiles> {
        if !actor.is_admin() {
            return Err(Error::Forbidden);
        }
        let offset = (page - 1) * per_page;
        let items = sqlx::query_as::<_, Profile>(
            r#"SELECT * FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2"#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM profiles"#)
            .fetch_one(&self.pool)
            .await?;

        let total_pages = if per_page > 0 {
            ((total as f64) / (per_page as f64)).ceil() as i64
        } else {
            1
        };

        Ok(PaginatedProfiles {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Non-role fields only; the payload deliberately has no role member.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<Profile> {
        if !can_access_profile(actor, id, Action::Update) {
            return Err(Error::Forbidden);
        }
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($1, full_name),
                email = COALESCE($2, email)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(payload.full_name)
        .bind(payload.email)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Role promotion/demotion. Owners passing the profile-update predicate
    /// still may not reach this; only admins change roles.
    pub async fn set_role(&self, actor: &Actor, id: Uuid, role: Role) -> Result<Profile> {
        if !actor.is_admin() || !can_access_profile(actor, id, Action::Update) {
            return Err(Error::Forbidden);
        }
        let profile = sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles SET role = $1 WHERE id = $2 RETURNING *"#,
        )
        .bind(role)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(profile_id = %id, role = ?role, "profile role changed");
        Ok(profile)
    }
}
