//! pgxguard-engine — Deterministic pharmacogenomic risk scoring.
//!
//! Resolves one drug against a patient's genomic profile into a risk assessment,
//! aggregates per-drug assessments into a burden score, answers phenotype what-if
//! questions, and fans batches out concurrently. All decision logic lives here; rule
//! loading, profile building, and presentation are collaborators.

pub mod assess;
pub mod batch;
pub mod burden;
pub mod counterfactual;
pub mod pathway;

pub use assess::{AssessmentOutcome, RiskAssessment, RiskAssessor};
pub use batch::{BatchOrchestrator, BatchReport, MAX_BATCH_DRUGS};
pub use burden::{BurdenAggregator, BurdenReport, RiskTier};
pub use counterfactual::{CounterfactualOutcome, CounterfactualReport, CounterfactualSimulator};
pub use pathway::{narrate, PathwayStep};

use pgxguard_common::{GenomicProfile, Phenotype, Result};
use pgxguard_config::Config;
use pgxguard_rules::RuleStore;
use std::sync::Arc;

/// Facade wiring the engine components around one shared rule store.
pub struct PgxEngine {
    assessor: Arc<RiskAssessor>,
    burden: BurdenAggregator,
    counterfactual: CounterfactualSimulator,
    batch: BatchOrchestrator,
}

impl PgxEngine {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self::with_batch_limit(store, MAX_BATCH_DRUGS)
    }

    pub fn with_batch_limit(store: Arc<RuleStore>, max_batch_drugs: usize) -> Self {
        let assessor = Arc::new(RiskAssessor::new(Arc::clone(&store)));
        Self {
            burden: BurdenAggregator::new(Arc::clone(&store)),
            counterfactual: CounterfactualSimulator::new(Arc::clone(&assessor)),
            batch: BatchOrchestrator::new(Arc::clone(&assessor)).with_limit(max_batch_drugs),
            assessor,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(RuleStore::new(&config.rules.path));
        Self::with_batch_limit(store, config.batch.max_drugs)
    }

    pub fn assess(&self, drug: &str, profile: &GenomicProfile) -> Result<AssessmentOutcome> {
        self.assessor.assess(drug, profile)
    }

    pub fn aggregate_burden(
        &self,
        profile: &GenomicProfile,
        drugs: Option<&[String]>,
    ) -> Result<BurdenReport> {
        self.burden.aggregate(profile, drugs)
    }

    pub fn simulate(
        &self,
        drug: &str,
        profile: &GenomicProfile,
        target: Phenotype,
    ) -> Result<CounterfactualOutcome> {
        self.counterfactual.simulate(drug, profile, target)
    }

    pub async fn run_batch(
        &self,
        profile: &GenomicProfile,
        drugs: &[String],
    ) -> Result<BatchReport> {
        self.batch.run_batch(profile, drugs).await
    }
}
