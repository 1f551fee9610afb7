use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeBody, ResumeData, ResumeRow};

/// Persistence for resume documents. Every query is scoped to the owner.
///
/// Carried in `AppState` as `Arc<dyn ResumeRepository>`.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn fetch_by_id(&self, id: Uuid, owner: Uuid) -> Result<Option<ResumeData>, AppError>;
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<ResumeData>, AppError>;
    async fn create(&self, resume: &ResumeData) -> Result<(), AppError>;
    /// Replaces the stored document. Returns false when no row matched.
    async fn update(&self, resume: &ResumeData) -> Result<bool, AppError>;
    /// Returns false when no row matched.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError>;
}

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        PgResumeRepository { pool }
    }
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn fetch_by_id(&self, id: Uuid, owner: Uuid) -> Result<Option<ResumeData>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ResumeRow::into_resume))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<ResumeData>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ResumeRow::into_resume).collect())
    }

    async fn create(&self, resume: &ResumeData) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, user_id, title, job_title, summary, template, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.title)
        .bind(&resume.job_title)
        .bind(&resume.summary)
        .bind(resume.template.as_str())
        .bind(Json(ResumeBody::from(resume)))
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Created resume {} for user {}", resume.id, resume.user_id);
        Ok(())
    }

    async fn update(&self, resume: &ResumeData) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET title = $3, job_title = $4, summary = $5, template = $6, body = $7, updated_at = $8
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.title)
        .bind(&resume.job_title)
        .bind(&resume.summary)
        .bind(resume.template.as_str())
        .bind(Json(ResumeBody::from(resume)))
        .bind(resume.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Deleted resume {id} for user {owner}");
        }
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository used by handler and router tests.
    #[derive(Default)]
    pub(crate) struct MemoryResumes {
        rows: Mutex<HashMap<Uuid, ResumeData>>,
    }

    impl MemoryResumes {
        pub(crate) fn with(resumes: Vec<ResumeData>) -> Self {
            MemoryResumes {
                rows: Mutex::new(resumes.into_iter().map(|r| (r.id, r)).collect()),
            }
        }

        pub(crate) fn get(&self, id: Uuid) -> Option<ResumeData> {
            self.rows.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl ResumeRepository for MemoryResumes {
        async fn fetch_by_id(&self, id: Uuid, owner: Uuid) -> Result<Option<ResumeData>, AppError> {
            Ok(self.get(id).filter(|r| r.user_id == owner))
        }

        async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<ResumeData>, AppError> {
            let mut list: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == owner)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(list)
        }

        async fn create(&self, resume: &ResumeData) -> Result<(), AppError> {
            self.rows.lock().unwrap().insert(resume.id, resume.clone());
            Ok(())
        }

        async fn update(&self, resume: &ResumeData) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&resume.id) {
                Some(existing) if existing.user_id == resume.user_id => {
                    *existing = resume.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.get(&id).is_some_and(|r| r.user_id == owner) {
                rows.remove(&id);
                return Ok(true);
            }
            Ok(false)
        }
    }
}
