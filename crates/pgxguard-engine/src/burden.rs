//! Pharmacogenomic burden aggregation.
//!
//! A gene's burden is driven by its worst drug interaction, not a sum over drugs
//! sharing the gene: per gene we keep the maximum severity weight across the evaluated
//! drug scope, and the total burden is the sum of those maxima.

use pgxguard_common::profile::{GenomicProfile, Phenotype, Severity};
use pgxguard_common::Result;
use pgxguard_rules::RuleStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One drug's contribution to a gene's burden.
#[derive(Debug, Clone, Serialize)]
pub struct DrugBurden {
    pub drug: String,
    pub risk_label: String,
    pub severity: Severity,
    pub weight: f64,
}

/// Aggregated burden for one gene across the evaluated drug scope.
#[derive(Debug, Clone, Serialize)]
pub struct GeneBurden {
    pub phenotype: Phenotype,
    pub activity_score: f64,
    pub max_severity_weight: f64,
    pub affected_drugs: Vec<DrugBurden>,
}

/// A (drug, gene) pair whose phenotype rule is critical or high severity.
/// Not deduplicated by gene: every contributing drug is surfaced.
#[derive(Debug, Clone, Serialize)]
pub struct HighRiskPair {
    pub drug: String,
    pub gene: String,
    pub phenotype: Phenotype,
    pub risk_label: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Critical,
    High,
    Moderate,
    Low,
    Minimal,
}

impl RiskTier {
    /// Tier thresholds on the total burden score, inclusive at each boundary.
    pub fn from_total(total: f64) -> Self {
        if total >= 12.0 {
            RiskTier::Critical
        } else if total >= 8.0 {
            RiskTier::High
        } else if total >= 4.0 {
            RiskTier::Moderate
        } else if total > 0.0 {
            RiskTier::Low
        } else {
            RiskTier::Minimal
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BurdenReport {
    pub total_score: f64,
    pub normalized_score: f64,
    pub risk_tier: RiskTier,
    pub gene_burdens: BTreeMap<String, GeneBurden>,
    pub high_risk_pairs: Vec<HighRiskPair>,
    pub genes_affected_count: usize,
    pub drugs_analyzed_count: usize,
}

pub struct BurdenAggregator {
    store: Arc<RuleStore>,
}

impl BurdenAggregator {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    /// Aggregate burden across `drugs`, or across every drug in the store when the
    /// scope is omitted. Drugs without rules, and phenotypes without a rule for a
    /// drug, are skipped.
    pub fn aggregate(
        &self,
        profile: &GenomicProfile,
        drugs: Option<&[String]>,
    ) -> Result<BurdenReport> {
        let table = self.store.load()?;

        let scope: Vec<String> = match drugs {
            None => table.drug_names(),
            Some(ds) => dedup_upper(ds),
        };

        let mut gene_burdens: BTreeMap<String, GeneBurden> = BTreeMap::new();
        let mut high_risk_pairs: Vec<HighRiskPair> = Vec::new();

        for drug in &scope {
            let Some(drug_rule) = table.drug(drug) else {
                debug!(drug = %drug, "Skipping drug without rules in burden scope");
                continue;
            };

            let call = profile.gene(&drug_rule.primary_gene);
            let phenotype = call.map(|c| c.phenotype).unwrap_or(Phenotype::Nm);
            let activity_score = call.map(|c| c.activity_score).unwrap_or(2.0);

            let Some(rule) = drug_rule.rule_for(phenotype) else {
                continue;
            };
            let weight = rule.severity.weight();

            let burden = gene_burdens
                .entry(drug_rule.primary_gene.clone())
                .or_insert_with(|| GeneBurden {
                    phenotype,
                    activity_score,
                    max_severity_weight: 0.0,
                    affected_drugs: Vec::new(),
                });

            burden.affected_drugs.push(DrugBurden {
                drug: drug.clone(),
                risk_label: rule.risk_label.clone(),
                severity: rule.severity,
                weight,
            });
            if weight > burden.max_severity_weight {
                burden.max_severity_weight = weight;
            }

            if rule.severity.is_high_risk() {
                high_risk_pairs.push(HighRiskPair {
                    drug: drug.clone(),
                    gene: drug_rule.primary_gene.clone(),
                    phenotype,
                    risk_label: rule.risk_label.clone(),
                    severity: rule.severity,
                });
            }
        }

        // Genes whose worst interaction carries no weight are not burdened; they drop
        // out of the report entirely.
        gene_burdens.retain(|_, g| g.max_severity_weight > 0.0);

        let total_score: f64 = gene_burdens.values().map(|g| g.max_severity_weight).sum();
        let genes_affected_count = gene_burdens.len();
        let normalized_score = if genes_affected_count > 0 {
            round3(total_score / (genes_affected_count as f64 * Severity::Critical.weight()))
        } else {
            0.0
        };

        Ok(BurdenReport {
            total_score,
            normalized_score,
            risk_tier: RiskTier::from_total(total_score),
            gene_burdens,
            high_risk_pairs,
            genes_affected_count,
            drugs_analyzed_count: scope.len(),
        })
    }
}

/// Case-fold and deduplicate, preserving first-seen order.
pub(crate) fn dedup_upper(drugs: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(drugs.len());
    for drug in drugs {
        let upper = drug.to_uppercase();
        if seen.insert(upper.clone()) {
            out.push(upper);
        }
    }
    out
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
