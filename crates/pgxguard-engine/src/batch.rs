//! Concurrent batch assessment.
//!
//! Each drug in a batch is an independent unit of work over the read-only profile and
//! rule table, so tasks fan out freely and results are collected in completion order.
//! A failing drug never aborts its siblings; every requested drug lands in exactly one
//! of `results` or `errors`.

use crate::assess::{AssessmentOutcome, RiskAssessment, RiskAssessor};
use crate::burden::dedup_upper;
use pgxguard_common::profile::GenomicProfile;
use pgxguard_common::{PgxError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Per-request drug cap; larger batches are rejected, never truncated.
pub const MAX_BATCH_DRUGS: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub drug: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_drugs: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub results: Vec<RiskAssessment>,
    pub errors: Vec<BatchError>,
}

pub struct BatchOrchestrator {
    assessor: Arc<RiskAssessor>,
    max_drugs: usize,
}

impl BatchOrchestrator {
    pub fn new(assessor: Arc<RiskAssessor>) -> Self {
        Self {
            assessor,
            max_drugs: MAX_BATCH_DRUGS,
        }
    }

    pub fn with_limit(mut self, max_drugs: usize) -> Self {
        self.max_drugs = max_drugs;
        self
    }

    /// Assess every drug in the deduplicated batch concurrently.
    pub async fn run_batch(
        &self,
        profile: &GenomicProfile,
        drugs: &[String],
    ) -> Result<BatchReport> {
        let scope = dedup_upper(drugs);
        if scope.len() > self.max_drugs {
            return Err(PgxError::BatchTooLarge {
                requested: scope.len(),
                limit: self.max_drugs,
            });
        }
        debug!(drugs = scope.len(), "Dispatching batch assessment");

        let profile = Arc::new(profile.clone());
        let mut tasks = JoinSet::new();
        for drug in &scope {
            let assessor = Arc::clone(&self.assessor);
            let profile = Arc::clone(&profile);
            let drug = drug.clone();
            tasks.spawn(async move {
                let outcome = assessor.assess(&drug, &profile);
                (drug, outcome)
            });
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut pending: std::collections::HashSet<String> = scope.iter().cloned().collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((drug, Ok(AssessmentOutcome::Assessed(assessment)))) => {
                    pending.remove(&drug);
                    results.push(assessment);
                }
                Ok((drug, Ok(AssessmentOutcome::DrugNotFound { available_drugs, .. }))) => {
                    pending.remove(&drug);
                    errors.push(BatchError {
                        message: format!("Drug '{drug}' not found in rule table"),
                        drug,
                        available_drugs: Some(available_drugs),
                    });
                }
                Ok((drug, Err(e))) => {
                    pending.remove(&drug);
                    errors.push(BatchError {
                        message: e.to_string(),
                        drug,
                        available_drugs: None,
                    });
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Batch assessment task failed to join");
                }
            }
        }

        // A task that never reported (panic, abort) must still account for its drug so
        // the batch partitions the input set exactly.
        for drug in &scope {
            if pending.contains(drug) {
                errors.push(BatchError {
                    drug: drug.clone(),
                    message: "Assessment task did not complete".to_string(),
                    available_drugs: None,
                });
            }
        }

        Ok(BatchReport { results, errors })
    }
}
