//! Single-drug risk assessment.
//!
//! Resolves a drug against the profile's primary-gene call via the rule store. An
//! unknown drug is a structured outcome, not a fault, so batch callers can degrade
//! gracefully; only configuration faults (missing rule table) propagate as errors.

use pgxguard_common::confidence::compute_confidence;
use pgxguard_common::profile::{GeneCall, GenomicProfile, Phenotype, Severity, Variant};
use pgxguard_common::Result;
use pgxguard_rules::{DrugRule, PhenotypeRule, RuleStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub const GUIDELINE_SOURCE: &str = "CPIC";

/// Variant facts as surfaced to callers; genotype is the derived display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantReport {
    pub rsid: Option<String>,
    pub impact: String,
    pub genotype: String,
    pub star_allele_1: Option<String>,
    pub star_allele_2: Option<String>,
}

impl From<&Variant> for VariantReport {
    fn from(v: &Variant) -> Self {
        Self {
            rsid: v.rsid.clone(),
            impact: v.impact.clone(),
            genotype: v.genotype_display(),
            star_allele_1: v.star_allele_1.clone(),
            star_allele_2: v.star_allele_2.clone(),
        }
    }
}

/// Completed assessment for one (drug, profile) pair. Never mutated after creation;
/// recomputed fresh on every call.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub drug: String,
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub activity_score: f64,
    pub detected_variants: Vec<VariantReport>,
    pub risk_label: String,
    pub severity: Severity,
    pub confidence: f64,
    pub recommendation: String,
    pub guideline_source: String,
}

/// Tagged assessment result; callers pattern-match instead of probing for error keys.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssessmentOutcome {
    Assessed(RiskAssessment),
    DrugNotFound {
        drug: String,
        available_drugs: Vec<String>,
    },
}

impl AssessmentOutcome {
    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            AssessmentOutcome::Assessed(a) => Some(a),
            AssessmentOutcome::DrugNotFound { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AssessmentOutcome::DrugNotFound { .. })
    }
}

/// Stateless assessor over a shared rule store.
pub struct RiskAssessor {
    store: Arc<RuleStore>,
}

impl RiskAssessor {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    pub fn assess(&self, drug: &str, profile: &GenomicProfile) -> Result<AssessmentOutcome> {
        let table = self.store.load()?;
        let drug_name = drug.to_uppercase();

        let Some(drug_rule) = table.drug(&drug_name) else {
            debug!(drug = %drug_name, "Drug has no rules");
            return Ok(AssessmentOutcome::DrugNotFound {
                drug: drug_name,
                available_drugs: table.drug_names(),
            });
        };

        // Missing gene in the profile means no variant evidence was found; assume a
        // normal metabolizer.
        let assumed;
        let call = match profile.gene(&drug_rule.primary_gene) {
            Some(call) => call,
            None => {
                assumed = GeneCall::assumed_normal();
                &assumed
            }
        };

        let rule = resolve_phenotype_rule(drug_rule, call.phenotype, &drug_name);
        let confidence = compute_confidence(call);

        Ok(AssessmentOutcome::Assessed(RiskAssessment {
            drug: drug_name,
            primary_gene: drug_rule.primary_gene.clone(),
            diplotype: call.diplotype.clone(),
            phenotype: call.phenotype,
            activity_score: call.activity_score,
            detected_variants: call.detected_variants.iter().map(VariantReport::from).collect(),
            risk_label: rule.risk_label,
            severity: rule.severity,
            confidence,
            recommendation: rule.recommendation,
            guideline_source: GUIDELINE_SOURCE.to_string(),
        }))
    }
}

/// Exact phenotype match, then the NM rule as a safe fallback, then a synthesized
/// low-severity rule deferring to clinical judgment.
fn resolve_phenotype_rule(drug_rule: &DrugRule, phenotype: Phenotype, drug: &str) -> PhenotypeRule {
    if let Some(rule) = drug_rule.rule_for(phenotype) {
        return rule.clone();
    }
    if let Some(rule) = drug_rule.rule_for(Phenotype::Nm) {
        debug!(drug = %drug, phenotype = %phenotype, "No exact phenotype rule; using NM fallback");
        return rule.clone();
    }
    PhenotypeRule {
        risk_label: "Unknown".to_string(),
        severity: Severity::Low,
        recommendation: format!(
            "No specific guideline found for {phenotype} phenotype with {drug}. \
             Exercise clinical judgment."
        ),
    }
}
