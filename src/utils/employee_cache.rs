use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::employee::Employee;

/// In-memory cache of active employees found by national id.
///
/// Misses and inactive employees are not stored: they are looked up again on
/// the next scan, so new or reactivated staff can check in right away.
#[derive(Clone)]
pub struct EmployeeCache {
    cache: Cache<String, Employee>,
}

#[inline]
fn normalize(national_id: &str) -> String {
    national_id.trim().to_string()
}

impl EmployeeCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, national_id: &str) -> Option<Employee> {
        self.cache.get(&normalize(national_id)).await
    }

    pub async fn insert(&self, employee: Employee) {
        self.cache
            .insert(normalize(&employee.national_id), employee)
            .await;
    }

    /// Batch insert
    async fn batch_insert(&self, employees: Vec<Employee>) {
        let futures: Vec<_> = employees
            .into_iter()
            .map(|e| self.insert(e))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load active employees into the cache, streamed in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, national_id, full_name, position, status
            FROM employees
            WHERE status = 'active'
            "#,
        )
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_insert(std::mem::take(&mut batch)).await;
            }
        }

        // Insert any remaining employees
        if !batch.is_empty() {
            self.batch_insert(batch).await;
        }

        tracing::info!(total_count, "Employee cache warmup complete");

        Ok(())
    }
}
