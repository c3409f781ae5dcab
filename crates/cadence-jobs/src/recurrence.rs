//! Recurrence expansion job.
//!
//! Every recurring task acts as a standing template: each run materializes
//! one fresh, non-recurring task per template and leaves the template as is.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cadence_cache::{Mutation, TaskCache};
use cadence_core::{recurrence, JobType, Result, TaskRepository};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Outcome of one expansion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceReport {
    /// Ids of the clones created in this run.
    pub created_task_ids: Vec<Uuid>,
    /// Templates that produced no clone (unrecognized interval).
    pub skipped_task_ids: Vec<Uuid>,
}

/// Expands recurring templates into concrete tasks.
#[derive(Clone)]
pub struct RecurrenceExpander {
    tasks: Arc<dyn TaskRepository>,
    cache: TaskCache,
}

impl RecurrenceExpander {
    pub fn new(tasks: Arc<dyn TaskRepository>, cache: TaskCache) -> Self {
        Self { tasks, cache }
    }

    /// Load every recurring task and insert all clones in one batch.
    ///
    /// A store error aborts the run and nothing is inserted.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "recurrence", op = "expand"))]
    pub async fn expand(&self) -> Result<RecurrenceReport> {
        let templates = self.tasks.list_recurring().await?;

        let mut clones = Vec::with_capacity(templates.len());
        let mut skipped_task_ids = Vec::new();
        for template in &templates {
            match recurrence::advance(template) {
                Some(clone) => clones.push(clone),
                None => skipped_task_ids.push(template.id),
            }
        }

        if !skipped_task_ids.is_empty() {
            warn!(
                skipped = skipped_task_ids.len(),
                "Recurring tasks with unrecognized intervals were skipped"
            );
        }

        if clones.is_empty() {
            return Ok(RecurrenceReport {
                created_task_ids: Vec::new(),
                skipped_task_ids,
            });
        }

        let created = self.tasks.insert_batch(clones).await?;

        let owners: BTreeSet<Uuid> = created.iter().map(|t| t.user_id).collect();
        self.cache
            .invalidate(&Mutation::RecurringClonesCreated {
                owners: owners.into_iter().collect(),
            })
            .await;

        Ok(RecurrenceReport {
            created_task_ids: created.into_iter().map(|t| t.id).collect(),
            skipped_task_ids,
        })
    }
}

/// Job handler running [`RecurrenceExpander::expand`].
pub struct RecurrenceHandler {
    expander: RecurrenceExpander,
}

impl RecurrenceHandler {
    pub fn new(expander: RecurrenceExpander) -> Self {
        Self { expander }
    }
}

#[async_trait]
impl JobHandler for RecurrenceHandler {
    fn job_type(&self) -> JobType {
        JobType::RecurrenceExpansion
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "recurrence", op = "execute", job_id = %ctx.job.id)
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let start = Instant::now();
        match self.expander.expand().await {
            Ok(report) => {
                info!(
                    attempt = ctx.attempt(),
                    created = report.created_task_ids.len(),
                    skipped = report.skipped_task_ids.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Recurring tasks expanded"
                );
                JobResult::Success(serde_json::to_value(&report).ok())
            }
            // The batch was rolled back, so a later attempt starts clean.
            Err(e) => JobResult::Retry(format!("Recurrence expansion failed: {}", e)),
        }
    }
}
