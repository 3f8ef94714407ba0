//! Durable job backend (§4.6): a `BlobStore`/`JobTable`/`MessageBus` trait
//! triad plus one in-memory implementation of each, standing in for the
//! S3/DynamoDB/SQS-shaped deployment a real service would use. The traits
//! exist so a production build can swap in real clients without touching
//! [`DurableWorker`]'s enqueue → claim → run → persist loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{PlannerError, Result};
use crate::events::JobStatus;
use crate::jobs::JobId;
use crate::payload::{JobMessage, JobRow, OptimizationResult};

/// Content-addressed storage for request/result payloads, referenced from a
/// [`JobRow`] by key (`request_ref`/`result_ref`) rather than inlined.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// The transactional job table keyed by [`JobId`] (§6's `JobRow` schema).
/// `try_claim` implements the conditional-update-fails-on-cancel race: a
/// worker claiming a row the client has since cancelled must observe the
/// cancel and back off rather than overwrite it.
#[async_trait]
pub trait JobTable: Send + Sync {
    async fn put(&self, row: JobRow) -> Result<()>;
    async fn get(&self, id: JobId) -> Result<Option<JobRow>>;
    async fn try_claim(&self, id: JobId) -> Result<Option<JobRow>>;
    async fn update(&self, row: JobRow) -> Result<()>;
    async fn request_cancel(&self, id: JobId) -> Result<()>;
}

/// At-least-once message bus carrying just a job id (§6); a worker pops a
/// message, claims the row, and processes it.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn send(&self, message: JobMessage) -> Result<()>;
    async fn receive(&self) -> Result<Option<JobMessage>>;
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs.lock().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| PlannerError::Internal(format!("no blob at key {key}")))
    }
}

#[derive(Default)]
pub struct InMemoryJobTable {
    rows: Mutex<HashMap<JobId, JobRow>>,
}

impl InMemoryJobTable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobTable for InMemoryJobTable {
    async fn put(&self, row: JobRow) -> Result<()> {
        self.rows.lock().insert(row.job_id, row);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<JobRow>> {
        Ok(self.rows.lock().get(&id).cloned())
    }

    /// Claims a `queued` row by flipping it to `running`, refusing if the
    /// client already set `cancel_flag`. Returns `None` if the row is
    /// missing, already claimed, or cancelled.
    async fn try_claim(&self, id: JobId) -> Result<Option<JobRow>> {
        let mut rows = self.rows.lock();
        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.status != "queued" || row.cancel_flag {
            return Ok(None);
        }
        row.status = "running".to_string();
        row.started_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn update(&self, row: JobRow) -> Result<()> {
        self.rows.lock().insert(row.job_id, row);
        Ok(())
    }

    async fn request_cancel(&self, id: JobId) -> Result<()> {
        if let Some(row) = self.rows.lock().get_mut(&id) {
            row.cancel_flag = true;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageBus {
    queue: Mutex<std::collections::VecDeque<JobMessage>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn send(&self, message: JobMessage) -> Result<()> {
        self.queue.lock().push_back(message);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<JobMessage>> {
        Ok(self.queue.lock().pop_front())
    }
}

/// Runs the durable job loop: pop a message, claim its row, solve, persist
/// the result. A row that lost the claim race (cancelled between enqueue
/// and claim) is skipped without solving.
pub struct DurableWorker {
    blobs: Arc<dyn BlobStore>,
    table: Arc<dyn JobTable>,
    bus: Arc<dyn MessageBus>,
}

impl DurableWorker {
    pub fn new(blobs: Arc<dyn BlobStore>, table: Arc<dyn JobTable>, bus: Arc<dyn MessageBus>) -> Self {
        Self { blobs, table, bus }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryJobTable::new()),
            Arc::new(InMemoryMessageBus::new()),
        )
    }

    pub fn table(&self) -> &Arc<dyn JobTable> {
        &self.table
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.bus
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Enqueues a new job: writes the request blob, inserts a `queued` row,
    /// and posts the message.
    pub async fn enqueue(&self, request_bytes: Vec<u8>, idem_key: Option<String>, ttl_days: u32) -> Result<JobId> {
        let id = JobId::new();
        let request_ref = format!("requests/{id}.json");
        self.blobs.put(&request_ref, request_bytes).await?;

        let now = Utc::now();
        let row = JobRow {
            job_id: id,
            status: "queued".to_string(),
            progress: 0.0,
            submitted_at: now,
            started_at: None,
            completed_at: None,
            last_heartbeat: None,
            cancel_flag: false,
            expires_at: (now + chrono::Duration::days(ttl_days as i64)).timestamp(),
            idem_key,
            request_ref,
            result_ref: None,
            error_message: None,
        };
        self.table.put(row).await?;
        self.bus.send(JobMessage { job_id: id }).await?;
        Ok(id)
    }

    /// Processes one message off the bus, if any. Returns `Ok(None)` if the
    /// queue was empty or the claimed row lost the cancel race.
    pub async fn run_once(
        &self,
        solve: impl FnOnce(Vec<u8>) -> Result<OptimizationResult>,
    ) -> Result<Option<JobId>> {
        let Some(message) = self.bus.receive().await? else {
            return Ok(None);
        };

        let Some(row) = self.table.try_claim(message.job_id).await? else {
            return Ok(None);
        };

        let request_bytes = self.blobs.get(&row.request_ref).await?;
        let outcome = solve(request_bytes);

        let mut row = row;
        row.completed_at = Some(Utc::now());

        match outcome {
            Ok(result) => {
                let result_ref = format!("results/{}.json", row.job_id);
                let bytes = serde_json::to_vec(&result)?;
                self.blobs.put(&result_ref, bytes).await?;
                row.status = JobStatus::Succeeded.to_string();
                row.progress = 1.0;
                row.result_ref = Some(result_ref);
            }
            Err(e) => {
                row.status = JobStatus::Failed.to_string();
                row.error_message = Some(e.to_string());
            }
        }

        self.table.update(row).await?;
        Ok(Some(message.job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> OptimizationResult {
        OptimizationResult {
            status: "ok".to_string(),
            objective_value: Some(42.0),
            solution: None,
            stats: Default::default(),
            warnings: vec![],
            timeline: None,
        }
    }

    #[tokio::test]
    async fn enqueue_then_run_once_marks_succeeded() {
        let worker = DurableWorker::in_memory();
        let id = worker.enqueue(b"{}".to_vec(), None, 7).await.unwrap();

        let processed = worker.run_once(|_bytes| Ok(sample_result())).await.unwrap();
        assert_eq!(processed, Some(id));

        let row = worker.table().get(id).await.unwrap().unwrap();
        assert_eq!(row.status, "succeeded");
        assert!(row.result_ref.is_some());
    }

    #[tokio::test]
    async fn cancel_before_claim_skips_the_solve() {
        let worker = DurableWorker::in_memory();
        let id = worker.enqueue(b"{}".to_vec(), None, 7).await.unwrap();
        worker.table().request_cancel(id).await.unwrap();

        let processed = worker
            .run_once(|_| panic!("solve should not run on a cancelled row"))
            .await
            .unwrap();
        assert_eq!(processed, None);
    }

    #[tokio::test]
    async fn empty_queue_returns_none() {
        let worker = DurableWorker::in_memory();
        let processed = worker.run_once(|_| Ok(sample_result())).await.unwrap();
        assert_eq!(processed, None);
    }
}
