// services/job_lock.rs - Database-backed locks for scheduled jobs
//
// A lock is a row in `job_locks` keyed by (job_name, key). Taking it is one
// atomic statement: insert, or take over a row whose lease already ran out.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::future::Future;

use crate::database::DatabaseError;

const DEFAULT_LOCK_MINUTES: i64 = 10;

pub fn default_lock_timeout() -> Duration {
    Duration::minutes(DEFAULT_LOCK_MINUTES)
}

pub struct JobLockService {
    pool: PgPool,
}

impl JobLockService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `true` when the lock was taken, `false` when another run still holds it.
    pub async fn acquire(&self, job_name: &str, key: &str, timeout: Duration) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let expires_at = now + timeout;

        let result = sqlx::query(
            "INSERT INTO job_locks (job_name, key, started_at, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (job_name, key) DO UPDATE
                SET started_at = EXCLUDED.started_at, expires_at = EXCLUDED.expires_at
                WHERE job_locks.expires_at < $3",
        )
        .bind(job_name)
        .bind(key)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let acquired = result.rows_affected() == 1;
        if acquired {
            tracing::info!(job = job_name, key, %expires_at, "Lock acquired");
        } else {
            tracing::warn!(job = job_name, key, "Job already running");
        }
        Ok(acquired)
    }

    pub async fn release(&self, job_name: &str, key: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM job_locks WHERE job_name = $1 AND key = $2")
            .bind(job_name)
            .bind(key)
            .execute(&self.pool)
            .await?;
        tracing::info!(job = job_name, key, "Lock released");
        Ok(())
    }

    /// Run `job` under the lock. `Ok(None)` means the job was skipped because
    /// another run holds the lock. The lock is released whether the job
    /// succeeds or fails.
    pub async fn with_lock<T, E, F, Fut>(
        &self,
        job_name: &str,
        key: &str,
        timeout: Duration,
        job: F,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DatabaseError>,
    {
        if !self.acquire(job_name, key, timeout).await? {
            return Ok(None);
        }

        let outcome = job().await;

        if let Err(e) = self.release(job_name, key).await {
            // The lease expires on its own
            tracing::error!(job = job_name, key, error = %e, "Failed to release lock");
        }

        outcome.map(Some)
    }

    /// Drop every lock whose lease has run out; returns how many were removed.
    pub async fn cleanup_expired(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM job_locks WHERE expires_at < now()")
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "Expired job locks removed");
        }
        Ok(removed)
    }
}
