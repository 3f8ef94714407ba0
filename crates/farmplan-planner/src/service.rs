//! Main optimization service entry point.
//!
//! [`OptimizeService`] is the single entry point a transport layer (HTTP
//! handler, CLI, durable worker) calls into: it validates a [`Plan`], runs
//! the lexicographic stage sequence, and returns the external
//! [`OptimizationResult`] shape - synchronously within a deadline, or as a
//! tracked background job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use farmplan_core::model::Plan;
use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::events::JobEvent;
use crate::extraction::{extract_timeline, flatten_solution};
use crate::jobs::{JobId, JobTracker, Progress};
use crate::payload::{JobInfo, OptimizationResult};
use crate::stage::{run_stages, StageRunOutcome};
use farmplan_objectives::Stage;

fn parse_stages(names: &[String]) -> Result<Vec<Stage>> {
    names
        .iter()
        .map(|name| {
            Stage::parse(name)
                .ok_or_else(|| PlannerError::Config(format!("unknown stage name: {name}")))
        })
        .collect()
}

fn outcome_to_result(plan: &Plan, outcome: StageRunOutcome) -> OptimizationResult {
    match outcome {
        StageRunOutcome::Success {
            records,
            maps,
            values,
        } => {
            let timeline = extract_timeline(plan, &maps, &values);
            let objective_value = records.last().map(|r| r.objective_value);
            let stats = records
                .iter()
                .map(|r| (format!("stage:{}", r.name), r.objective_value))
                .collect();
            OptimizationResult {
                status: "ok".to_string(),
                objective_value,
                solution: Some(flatten_solution(&maps, &values)),
                stats,
                warnings: vec![],
                timeline: Some(timeline),
            }
        }
        StageRunOutcome::Infeasible {
            stage,
            reason,
            last_feasible,
            ..
        } => {
            let hints = last_feasible
                .map(|(maps, values)| flatten_solution(&maps, &values))
                .map(|solution| format!("{} variables carried from the last feasible stage", solution.len()))
                .into_iter()
                .collect();
            OptimizationResult::infeasible(format!("stage {stage} infeasible: {reason}"), hints)
        }
        StageRunOutcome::Unknown {
            stage,
            reason,
            last_feasible,
            ..
        } => {
            let hints = last_feasible
                .map(|(maps, values)| flatten_solution(&maps, &values))
                .map(|solution| format!("{} variables carried from the last feasible stage", solution.len()))
                .into_iter()
                .collect();
            OptimizationResult::unknown(format!("stage {stage} inconclusive: {reason}"), hints)
        }
        StageRunOutcome::Cancelled { .. } => OptimizationResult {
            status: "error".to_string(),
            objective_value: None,
            solution: None,
            stats: HashMap::new(),
            warnings: vec!["cancelled before any stage completed".to_string()],
            timeline: None,
        },
    }
}

/// Main service coordinating optimization requests.
///
/// Owns the in-process [`JobTracker`], a bounded [`Semaphore`] sized to
/// [`crate::config::JobConfig::pool_capacity`], and the loaded
/// [`PlannerConfig`]. The durable backend in [`crate::durable`] is a
/// separate, independent entry point - it doesn't go through this service.
pub struct OptimizeService {
    jobs: Arc<JobTracker>,
    job_info: Arc<dashmap::DashMap<JobId, JobInfo>>,
    config: Arc<RwLock<PlannerConfig>>,
    pool: Arc<Semaphore>,
}

impl OptimizeService {
    /// Create a new service with configuration loaded from
    /// `~/.farmplan/config.toml`, or defaults if absent.
    pub fn new() -> Result<Self> {
        let config = PlannerConfig::load()?;
        Self::with_config(config)
    }

    pub fn with_config(config: PlannerConfig) -> Result<Self> {
        let pool = Arc::new(Semaphore::new(config.jobs.pool_capacity.max(1)));
        Ok(Self {
            jobs: JobTracker::shared(),
            job_info: Arc::new(dashmap::DashMap::new()),
            config: Arc::new(RwLock::new(config)),
            pool,
        })
    }

    pub fn jobs(&self) -> &Arc<JobTracker> {
        &self.jobs
    }

    pub fn config(&self) -> &Arc<RwLock<PlannerConfig>> {
        &self.config
    }

    pub fn active_job_count(&self) -> usize {
        self.jobs.active_count()
    }

    pub fn subscribe_jobs(&self) -> tokio::sync::broadcast::Receiver<JobEvent> {
        self.jobs.subscribe()
    }

    fn resolve_stages(&self, requested: Option<Vec<String>>) -> Result<Vec<Stage>> {
        let cfg = self.config.read();
        let names = requested.unwrap_or_else(|| cfg.core.default_stages.clone());
        parse_stages(&names)
    }

    /// Runs the stage sequence synchronously, within the configured sync
    /// deadline. On timeout, the in-flight solve is left running in the
    /// background (detached, not aborted) and a `timeout` result is
    /// returned immediately - matching §5's "no partial solver state is
    /// observed by the caller on timeout".
    pub async fn optimize_sync(
        &self,
        plan: Plan,
        requested_stages: Option<Vec<String>>,
        tolerances: HashMap<String, f64>,
    ) -> Result<OptimizationResult> {
        plan.validate()?;

        let stages = self.resolve_stages(requested_stages)?;
        let (deadline, default_tolerance, stage_time_limit) = {
            let cfg = self.config.read();
            (
                cfg.core.sync_deadline(),
                cfg.core.default_tolerance,
                cfg.core.stage_time_limit(),
            )
        };

        let handle = tokio::task::spawn_blocking(move || {
            run_stages(
                &plan,
                &stages,
                &tolerances,
                default_tolerance,
                stage_time_limit,
                None,
                |_, _| {},
            )
            .map(|outcome| outcome_to_result(&plan, outcome))
        });

        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(e))) => Err(PlannerError::Model(e)),
            Ok(Err(_join_error)) => Err(PlannerError::Internal("solver task panicked".to_string())),
            Err(_elapsed) => Ok(OptimizationResult::timeout(deadline.as_millis() as u64)),
        }
    }

    /// Submits the stage sequence as a tracked background job, bounded by
    /// the in-process worker pool. Returns immediately with the job id;
    /// progress and the terminal result arrive via [`JobTracker::subscribe`]
    /// or [`OptimizeService::job_status`].
    pub fn submit_async(
        self: &Arc<Self>,
        plan: Plan,
        requested_stages: Option<Vec<String>>,
        tolerances: HashMap<String, f64>,
    ) -> Result<JobId> {
        plan.validate()?;
        let stages = self.resolve_stages(requested_stages)?;

        let handle = self.jobs.create();
        let id = handle.id;
        self.job_info.insert(
            id,
            JobInfo {
                job_id: id,
                status: crate::events::JobStatus::Queued.to_string(),
                progress: 0.0,
                result: None,
                submitted_at: chrono::Utc::now(),
                completed_at: None,
            },
        );

        let service = Arc::clone(self);
        let (default_tolerance, stage_time_limit, deadline) = {
            let cfg = self.config.read();
            (
                cfg.core.default_tolerance,
                cfg.core.stage_time_limit(),
                cfg.core.async_deadline(),
            )
        };

        tokio::spawn(async move {
            let Ok(_permit) = service.pool.acquire().await else {
                service.jobs.fail(id, "worker pool closed");
                return;
            };
            service.run_tracked(id, handle.cancel_token.clone(), plan, stages, tolerances, default_tolerance, stage_time_limit, deadline).await;
        });

        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_tracked(
        self: Arc<Self>,
        id: JobId,
        cancel: CancellationToken,
        plan: Plan,
        stages: Vec<Stage>,
        tolerances: HashMap<String, f64>,
        default_tolerance: f64,
        stage_time_limit: Duration,
        deadline: Duration,
    ) {
        let tracker = Arc::clone(&self.jobs);
        let progress_id = id;
        let progress_tracker = Arc::clone(&tracker);
        let cancel_for_stage = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            run_stages(
                &plan,
                &stages,
                &tolerances,
                default_tolerance,
                stage_time_limit,
                Some(&cancel_for_stage),
                move |fraction, name| {
                    progress_tracker.update_progress(
                        progress_id,
                        Progress::with_message(fraction, name.to_string()),
                    );
                },
            )
            .map(|outcome| outcome_to_result(&plan, outcome))
        });

        let outcome = tokio::select! {
            result = tokio::time::timeout(deadline, handle) => result,
            _ = cancel.cancelled() => {
                self.jobs.cancel(id);
                self.finish_job_info(id, "canceled".to_string(), None);
                return;
            }
        };

        match outcome {
            Ok(Ok(Ok(result))) => {
                let status = result.status.clone();
                self.jobs.complete(id, result.clone());
                self.finish_job_info(id, status, Some(result));
            }
            Ok(Ok(Err(e))) => {
                self.jobs.fail(id, e.to_string());
                self.finish_job_info(id, "failed".to_string(), None);
            }
            Ok(Err(_join_error)) => {
                self.jobs.fail(id, "solver task panicked");
                self.finish_job_info(id, "failed".to_string(), None);
            }
            Err(_elapsed) => {
                self.jobs.timeout(id);
                self.finish_job_info(id, "timeout".to_string(), None);
            }
        }
    }

    fn finish_job_info(&self, id: JobId, status: String, result: Option<OptimizationResult>) {
        if let Some(mut entry) = self.job_info.get_mut(&id) {
            entry.status = status;
            entry.progress = 1.0;
            entry.result = result;
            entry.completed_at = Some(chrono::Utc::now());
        }
    }

    pub fn job_status(&self, id: JobId) -> Option<JobInfo> {
        self.job_info.get(&id).map(|r| r.clone())
    }

    pub fn cancel(&self, id: JobId) {
        self.jobs.cancel(id);
    }
}

impl Default for OptimizeService {
    fn default() -> Self {
        Self::new().expect("failed to create default OptimizeService")
    }
}

/// Builder for configuring an [`OptimizeService`].
pub struct OptimizeServiceBuilder {
    config: Option<PlannerConfig>,
    config_path: Option<std::path::PathBuf>,
}

impl OptimizeServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            config_path: None,
        }
    }

    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<OptimizeService> {
        let config = if let Some(cfg) = self.config {
            cfg
        } else if let Some(path) = self.config_path {
            PlannerConfig::load_from(&path)?
        } else {
            PlannerConfig::load()?
        };

        OptimizeService::with_config(config)
    }
}

impl Default for OptimizeServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Crop, Event, Horizon, Land};

    fn plan() -> Plan {
        Plan {
            horizon: Horizon { num_days: 1 },
            crops: vec![Crop {
                id: "wheat".into(),
                name: "Wheat".into(),
                category: None,
                price_per_area: Some(10.0),
            }],
            events: vec![Event {
                id: "sow".into(),
                crop_id: "wheat".into(),
                name: "Sow".into(),
                category: None,
                kind: None,
                uses_land: true,
                start_cond: None,
                end_cond: None,
                frequency_days: None,
                preceding_event_id: None,
                lag_min_days: None,
                lag_max_days: None,
                people_required: None,
                labor_total_per_area: None,
                labor_daily_cap: None,
                required_roles: None,
                required_resources: None,
            }],
            lands: vec![Land {
                id: "L1".into(),
                name: "Field 1".into(),
                area: 5.0,
                tags: None,
                blocked_days: None,
            }],
            workers: vec![],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[tokio::test]
    async fn sync_optimize_returns_ok_status() {
        let service = OptimizeService::with_config(PlannerConfig::default()).unwrap();
        let result = service
            .optimize_sync(plan(), Some(vec!["profit".to_string()]), HashMap::new())
            .await
            .unwrap();
        assert_eq!(result.status, "ok");
    }

    #[tokio::test]
    async fn async_submit_eventually_reports_completion() {
        let service = Arc::new(OptimizeService::with_config(PlannerConfig::default()).unwrap());
        let id = service
            .submit_async(plan(), Some(vec!["profit".to_string()]), HashMap::new())
            .unwrap();

        let mut events = service.subscribe_jobs();
        loop {
            match events.recv().await.unwrap() {
                JobEvent::Completed { id: done_id, .. } if done_id == id => break,
                JobEvent::Failed { id: done_id, .. } if done_id == id => break,
                _ => continue,
            }
        }

        let info = service.job_status(id).unwrap();
        assert_eq!(info.status, "ok");
    }
}
