//! Phenotype what-if simulation.
//!
//! Re-runs the assessor against a derived profile in which only the drug's primary
//! gene is replaced by the target phenotype; every other gene passes through
//! unchanged.

use crate::assess::{AssessmentOutcome, RiskAssessment, RiskAssessor};
use pgxguard_common::profile::{GeneCall, GenomicProfile, Phenotype};
use pgxguard_common::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Default star allele used when rewriting a diplotype to homozygous normal.
const DEFAULT_STAR: &str = "*1";

#[derive(Debug, Clone, Serialize)]
pub struct ActualArm {
    pub phenotype: Phenotype,
    pub risk_assessment: RiskAssessment,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedArm {
    pub simulated_phenotype: Phenotype,
    pub risk_assessment: RiskAssessment,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterfactualReport {
    pub drug: String,
    pub primary_gene: String,
    pub actual: ActualArm,
    pub counterfactual: SimulatedArm,
    pub risk_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CounterfactualOutcome {
    Simulated(CounterfactualReport),
    DrugNotFound {
        drug: String,
        available_drugs: Vec<String>,
    },
}

impl CounterfactualOutcome {
    pub fn report(&self) -> Option<&CounterfactualReport> {
        match self {
            CounterfactualOutcome::Simulated(r) => Some(r),
            CounterfactualOutcome::DrugNotFound { .. } => None,
        }
    }
}

pub struct CounterfactualSimulator {
    assessor: Arc<RiskAssessor>,
}

impl CounterfactualSimulator {
    pub fn new(assessor: Arc<RiskAssessor>) -> Self {
        Self { assessor }
    }

    pub fn simulate(
        &self,
        drug: &str,
        profile: &GenomicProfile,
        target: Phenotype,
    ) -> Result<CounterfactualOutcome> {
        let actual = match self.assessor.assess(drug, profile)? {
            AssessmentOutcome::Assessed(a) => a,
            AssessmentOutcome::DrugNotFound { drug, available_drugs } => {
                return Ok(CounterfactualOutcome::DrugNotFound { drug, available_drugs });
            }
        };

        let derived = derive_profile(profile, &actual.primary_gene, target);
        let counterfactual = match self.assessor.assess(drug, &derived)? {
            AssessmentOutcome::Assessed(a) => a,
            // The drug was just resolved against the same table snapshot lineage;
            // a not-found here would mean the store lost the drug mid-request.
            AssessmentOutcome::DrugNotFound { drug, available_drugs } => {
                return Ok(CounterfactualOutcome::DrugNotFound { drug, available_drugs });
            }
        };

        let risk_changed = actual.risk_label != counterfactual.risk_label;
        debug!(
            drug = %actual.drug,
            actual = %actual.phenotype,
            simulated = %target,
            risk_changed,
            "Counterfactual simulation complete"
        );

        Ok(CounterfactualOutcome::Simulated(CounterfactualReport {
            drug: actual.drug.clone(),
            primary_gene: actual.primary_gene.clone(),
            actual: ActualArm {
                phenotype: actual.phenotype,
                recommendation: actual.recommendation.clone(),
                risk_assessment: actual,
            },
            counterfactual: SimulatedArm {
                simulated_phenotype: target,
                recommendation: counterfactual.recommendation.clone(),
                risk_assessment: counterfactual,
            },
            risk_changed,
        }))
    }
}

/// Clone the profile and replace the primary gene's call with the target phenotype.
/// A gene absent from the profile starts from the assumed-normal call, so simulating
/// a phenotype for an uncalled gene still takes effect. Only an NM target gets a
/// rewritten homozygous diplotype; no single canonical diplotype represents the
/// other phenotypes, so they keep the original string.
fn derive_profile(profile: &GenomicProfile, gene: &str, target: Phenotype) -> GenomicProfile {
    let mut derived = profile.clone();
    let mut call = derived
        .gene(gene)
        .cloned()
        .unwrap_or_else(GeneCall::assumed_normal);

    call.phenotype = target;
    call.activity_score = target.activity_default();
    if target == Phenotype::Nm {
        call.diplotype = format!("{DEFAULT_STAR}/{DEFAULT_STAR}");
    }

    derived.insert(gene.to_string(), call);
    derived
}
