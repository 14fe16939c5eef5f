//! Core value types for patient genomic profiles.
//! These are Rust representations of the per-gene calls produced by the external
//! variant-calling collaborator; the engine treats them as immutable inputs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Phenotype (metabolizer status)
// ---------------------------------------------------------------------------

/// Metabolizer phenotype derived from a gene's diplotype.
/// Unrecognized codes collapse to `Unknown` rather than failing deserialization,
/// since rule tables only ever key on the canonical codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phenotype {
    /// Poor metabolizer
    Pm,
    /// Intermediate metabolizer
    Im,
    /// Normal metabolizer
    Nm,
    /// Rapid metabolizer
    Rm,
    /// Ultra-rapid metabolizer
    Urm,
    Unknown,
}

impl Phenotype {
    pub fn code(&self) -> &'static str {
        match self {
            Phenotype::Pm => "PM",
            Phenotype::Im => "IM",
            Phenotype::Nm => "NM",
            Phenotype::Rm => "RM",
            Phenotype::Urm => "URM",
            Phenotype::Unknown => "Unknown",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "PM" => Phenotype::Pm,
            "IM" => Phenotype::Im,
            "NM" => Phenotype::Nm,
            "RM" => Phenotype::Rm,
            "URM" => Phenotype::Urm,
            _ => Phenotype::Unknown,
        }
    }

    /// Representative activity score for simulating this phenotype.
    pub fn activity_default(&self) -> f64 {
        match self {
            Phenotype::Pm => 0.0,
            Phenotype::Im => 0.5,
            Phenotype::Nm => 2.0,
            Phenotype::Rm => 2.5,
            Phenotype::Urm => 3.0,
            Phenotype::Unknown => 2.0,
        }
    }
}

impl From<String> for Phenotype {
    fn from(s: String) -> Self {
        Phenotype::from_code(&s)
    }
}

impl From<Phenotype> for String {
    fn from(p: Phenotype) -> Self {
        p.code().to_string()
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Clinical severity rank of a phenotype rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    None,
}

impl Severity {
    /// Numeric weight used in burden aggregation.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 4.0,
            Severity::High => 3.0,
            Severity::Moderate => 2.0,
            Severity::Low => 1.0,
            Severity::None => 0.0,
        }
    }

    /// Critical and high severities flag a (drug, gene) pair for surfacing.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
            Severity::None => "none",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// One detected pharmacogene variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub rsid: Option<String>, // e.g. rs3892097
    #[serde(default = "default_impact")]
    pub impact: String,
    /// Called allele pair; the display genotype is always derived from this.
    #[serde(default)]
    pub genotype_alleles: Option<(String, String)>,
    #[serde(default)]
    pub star_allele_1: Option<String>,
    #[serde(default)]
    pub star_allele_2: Option<String>,
}

fn default_impact() -> String {
    "unknown".to_string()
}

impl Variant {
    /// Display form of the genotype, `"a/b"` when alleles were called.
    pub fn genotype_display(&self) -> String {
        match &self.genotype_alleles {
            Some((a, b)) => format!("{a}/{b}"),
            None => "unknown".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeneCall / GenomicProfile
// ---------------------------------------------------------------------------

/// Per-gene call from the profile builder: diplotype, derived phenotype, and the
/// sequencing-quality signals the confidence scorer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneCall {
    #[serde(default = "default_diplotype")]
    pub diplotype: String,
    #[serde(default = "default_phenotype")]
    pub phenotype: Phenotype,
    #[serde(default = "default_activity")]
    pub activity_score: f64,
    #[serde(default)]
    pub detected_variants: Vec<Variant>,
    #[serde(default)]
    pub quality_flags: Vec<String>,
    #[serde(default)]
    pub has_unphased_het: bool,
    #[serde(default)]
    pub min_gq: Option<f64>,
    #[serde(default)]
    pub min_dp: Option<f64>,
}

fn default_diplotype() -> String {
    "*1/*1".to_string()
}

fn default_phenotype() -> Phenotype {
    Phenotype::Nm
}

fn default_activity() -> f64 {
    2.0
}

impl GeneCall {
    /// The normal-metabolizer assumption used when a gene is absent from the profile.
    pub fn assumed_normal() -> Self {
        Self {
            diplotype: default_diplotype(),
            phenotype: Phenotype::Nm,
            activity_score: 2.0,
            detected_variants: Vec::new(),
            quality_flags: Vec::new(),
            has_unphased_het: false,
            min_gq: None,
            min_dp: None,
        }
    }
}

impl Default for GeneCall {
    fn default() -> Self {
        Self::assumed_normal()
    }
}

/// Patient genomic profile keyed by gene symbol (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenomicProfile(pub HashMap<String, GeneCall>);

impl GenomicProfile {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, gene: impl Into<String>, call: GeneCall) {
        self.0.insert(gene.into(), call);
    }

    pub fn gene(&self, symbol: &str) -> Option<&GeneCall> {
        self.0.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GeneCall)> {
        self.0.iter()
    }
}

impl FromIterator<(String, GeneCall)> for GenomicProfile {
    fn from_iter<I: IntoIterator<Item = (String, GeneCall)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
