use crate::error::Result;
use crate::models::profile::Role;
use sqlx::PgPool;
use uuid::Uuid;

/// Resolves an authenticated identity to its stored role.
///
/// This is the one place roles come from. It reads the profiles table
/// directly and depends on nothing in the policy layer, so policy checks on
/// other tables can call through it without evaluating profile policies
/// recursively. A missing profile resolves to `None`, and every check built
/// on top of that denies.
#[derive(Clone)]
pub struct RoleResolver {
    pool: PgPool,
}

impl RoleResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn resolve(&self, identity: Uuid) -> Result<Option<Role>> {
        let role = sqlx::query_scalar::<_, Role>(r#"SELECT role FROM profiles WHERE id = $1"#)
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }
}
