//! Rule-table document model.
//! The persisted document is keyed by upper-cased drug name; each entry names exactly
//! one primary gene and maps phenotype codes to clinical guidance.

use pgxguard_common::profile::{Phenotype, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Guidance for one (drug, phenotype) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeRule {
    pub risk_label: String,
    pub severity: Severity,
    pub recommendation: String,
}

/// All guidance for one drug: the gene whose phenotype drives the risk, and the
/// per-phenotype rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRule {
    pub primary_gene: String,
    #[serde(default)]
    pub phenotype_rules: HashMap<Phenotype, PhenotypeRule>,
}

impl DrugRule {
    pub fn rule_for(&self, phenotype: Phenotype) -> Option<&PhenotypeRule> {
        self.phenotype_rules.get(&phenotype)
    }
}

/// Parsed rule table. Lookups case-fold the drug name to upper case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    drugs: HashMap<String, DrugRule>,
}

impl RuleTable {
    /// Parse the persisted JSON document. Drug keys are normalized to upper case so a
    /// document with mixed-case keys still resolves.
    pub fn from_json_str(doc: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, DrugRule> = serde_json::from_str(doc)?;
        Ok(Self::from_drugs(raw))
    }

    pub fn from_drugs(drugs: impl IntoIterator<Item = (String, DrugRule)>) -> Self {
        let drugs = drugs
            .into_iter()
            .map(|(name, rule)| (name.to_uppercase(), rule))
            .collect();
        Self { drugs }
    }

    pub fn drug(&self, name: &str) -> Option<&DrugRule> {
        self.drugs.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drugs.contains_key(&name.to_uppercase())
    }

    /// All known drug identifiers, lexically sorted.
    pub fn drug_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drugs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}
