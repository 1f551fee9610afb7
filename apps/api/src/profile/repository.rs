use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{ProfileUpdate, UserProfile};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;
    /// Applies the present fields of `update`. Returns the new profile, or
    /// `None` when the user does not exist.
    async fn update(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError>;
}

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        PgProfileRepository { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, name, profile_picture, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError> {
        // COALESCE keeps columns the update leaves out.
        Ok(sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                profile_picture = COALESCE($3, profile_picture)
            WHERE id = $1
            RETURNING id, email, name, profile_picture, created_at
            "#,
        )
        .bind(user_id)
        .bind(update.name.as_deref())
        .bind(update.profile_picture.as_deref())
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryProfiles {
        users: Mutex<HashMap<Uuid, UserProfile>>,
    }

    impl MemoryProfiles {
        pub(crate) fn with(profile: UserProfile) -> Self {
            let profiles = MemoryProfiles::default();
            profiles.users.lock().unwrap().insert(profile.id, profile);
            profiles
        }
    }

    #[async_trait]
    impl ProfileRepository for MemoryProfiles {
        async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
            Ok(self.users.lock().unwrap().get(&user_id).cloned())
        }

        async fn update(
            &self,
            user_id: Uuid,
            update: &ProfileUpdate,
        ) -> Result<Option<UserProfile>, AppError> {
            let mut users = self.users.lock().unwrap();
            let Some(profile) = users.get_mut(&user_id) else {
                return Ok(None);
            };
            if let Some(name) = &update.name {
                profile.name = name.clone();
            }
            if let Some(picture) = &update.profile_picture {
                profile.profile_picture = Some(picture.clone());
            }
            Ok(Some(profile.clone()))
        }
    }
}
