//! End-to-end engine scenarios over an in-memory rule store.

use pgxguard_common::profile::{GeneCall, GenomicProfile, Phenotype, Severity, Variant};
use pgxguard_engine::{narrate, PgxEngine, RiskTier};
use pgxguard_rules::{DrugRule, PhenotypeRule, RuleStore, RuleTable};
use std::collections::HashMap;
use std::sync::Arc;

fn rule(label: &str, severity: Severity, rec: &str) -> PhenotypeRule {
    PhenotypeRule {
        risk_label: label.to_string(),
        severity,
        recommendation: rec.to_string(),
    }
}

/// Rule table mirroring the CPIC guidance shape for three drugs across two genes.
fn demo_table() -> RuleTable {
    let mut codeine = HashMap::new();
    codeine.insert(
        Phenotype::Pm,
        rule(
            "Therapeutic failure",
            Severity::High,
            "Avoid codeine; morphine formation is severely reduced.",
        ),
    );
    codeine.insert(
        Phenotype::Urm,
        rule(
            "Toxicity risk",
            Severity::Critical,
            "Avoid codeine due to excessive morphine formation.",
        ),
    );
    codeine.insert(
        Phenotype::Nm,
        rule("Normal response", Severity::None, "Use standard dosing."),
    );

    let mut tramadol = HashMap::new();
    tramadol.insert(
        Phenotype::Pm,
        rule("Reduced analgesia", Severity::Moderate, "Consider a non-opioid."),
    );
    tramadol.insert(
        Phenotype::Nm,
        rule("Normal response", Severity::None, "Use standard dosing."),
    );

    let mut clopidogrel = HashMap::new();
    clopidogrel.insert(
        Phenotype::Pm,
        rule(
            "Reduced efficacy",
            Severity::Critical,
            "Use prasugrel or ticagrelor instead.",
        ),
    );
    clopidogrel.insert(
        Phenotype::Nm,
        rule("Normal response", Severity::None, "Use standard dosing."),
    );

    RuleTable::from_drugs([
        (
            "CODEINE".to_string(),
            DrugRule {
                primary_gene: "CYP2D6".to_string(),
                phenotype_rules: codeine,
            },
        ),
        (
            "TRAMADOL".to_string(),
            DrugRule {
                primary_gene: "CYP2D6".to_string(),
                phenotype_rules: tramadol,
            },
        ),
        (
            "CLOPIDOGREL".to_string(),
            DrugRule {
                primary_gene: "CYP2C19".to_string(),
                phenotype_rules: clopidogrel,
            },
        ),
    ])
}

fn engine() -> PgxEngine {
    PgxEngine::new(Arc::new(RuleStore::with_table(demo_table())))
}

fn variant(rsid: &str, impact: &str) -> Variant {
    Variant {
        rsid: Some(rsid.to_string()),
        impact: impact.to_string(),
        genotype_alleles: Some(("A".to_string(), "G".to_string())),
        star_allele_1: Some("*4".to_string()),
        star_allele_2: Some("*1".to_string()),
    }
}

/// CYP2D6 PM with two detected variants, clean quality.
fn pm_profile() -> GenomicProfile {
    let mut profile = GenomicProfile::new();
    profile.insert(
        "CYP2D6",
        GeneCall {
            diplotype: "*4/*4".to_string(),
            phenotype: Phenotype::Pm,
            activity_score: 0.0,
            detected_variants: vec![
                variant("rs3892097", "missense"),
                variant("rs1065852", "missense"),
            ],
            quality_flags: Vec::new(),
            has_unphased_het: false,
            min_gq: None,
            min_dp: None,
        },
    );
    profile
}

#[test]
fn codeine_pm_scenario_confidence_is_082() {
    let outcome = engine().assess("CODEINE", &pm_profile()).unwrap();
    let a = outcome.assessment().expect("codeine has rules");
    // 2 variants (0.76 base) + unambiguous complete loss (+0.06) = 0.82
    assert_eq!(a.confidence, 0.82);
    assert_eq!(a.risk_label, "Therapeutic failure");
    assert_eq!(a.severity, Severity::High);
    assert!(a.recommendation.contains("Avoid codeine"));
}

#[test]
fn empty_profile_whole_store_burden_is_minimal() {
    let report = engine()
        .aggregate_burden(&GenomicProfile::new(), None)
        .unwrap();
    assert_eq!(report.total_score, 0.0);
    assert_eq!(report.risk_tier, RiskTier::Minimal);
    assert!(report.gene_burdens.is_empty());
    assert_eq!(report.genes_affected_count, 0);
    assert_eq!(report.drugs_analyzed_count, 3);
}

#[test]
fn shared_gene_burden_uses_worst_interaction_once() {
    // CYP2D6 PM hits codeine (high, 3) and tramadol (moderate, 2): gene burden 3.
    let report = engine().aggregate_burden(&pm_profile(), None).unwrap();
    let cyp2d6 = &report.gene_burdens["CYP2D6"];
    assert_eq!(cyp2d6.max_severity_weight, 3.0);
    assert_eq!(cyp2d6.affected_drugs.len(), 2);
    assert_eq!(report.total_score, 3.0);
    assert_eq!(report.risk_tier, RiskTier::Low);
    // Only codeine is high severity for this phenotype.
    assert_eq!(report.high_risk_pairs.len(), 1);
    assert_eq!(report.high_risk_pairs[0].drug, "CODEINE");
}

#[test]
fn two_gene_pm_profile_accumulates_across_genes() {
    let mut profile = pm_profile();
    profile.insert(
        "CYP2C19",
        GeneCall {
            diplotype: "*2/*2".to_string(),
            phenotype: Phenotype::Pm,
            activity_score: 0.0,
            ..GeneCall::assumed_normal()
        },
    );
    // CYP2D6 max 3 + CYP2C19 max 4 = 7 → MODERATE; normalized 7 / (2×4) = 0.875
    let report = engine().aggregate_burden(&profile, None).unwrap();
    assert_eq!(report.total_score, 7.0);
    assert_eq!(report.risk_tier, RiskTier::Moderate);
    assert_eq!(report.normalized_score, 0.875);
    assert_eq!(report.genes_affected_count, 2);
}

#[test]
fn counterfactual_same_phenotype_never_changes_risk() {
    let outcome = engine()
        .simulate("CODEINE", &pm_profile(), Phenotype::Pm)
        .unwrap();
    assert!(!outcome.report().unwrap().risk_changed);
}

#[test]
fn counterfactual_nm_restores_normal_response() {
    let outcome = engine()
        .simulate("CODEINE", &pm_profile(), Phenotype::Nm)
        .unwrap();
    let report = outcome.report().unwrap();
    assert!(report.risk_changed);
    assert_eq!(report.counterfactual.risk_assessment.risk_label, "Normal response");
    assert_eq!(report.counterfactual.risk_assessment.diplotype, "*1/*1");
    // The actual arm is untouched by the simulation.
    assert_eq!(report.actual.phenotype, Phenotype::Pm);
    assert_eq!(report.actual.risk_assessment.diplotype, "*4/*4");
}

#[tokio::test]
async fn batch_partitions_known_and_unknown_drugs() {
    let drugs = vec![
        "codeine".to_string(),
        "ibuprofen".to_string(),
        "clopidogrel".to_string(),
    ];
    let report = engine().run_batch(&pm_profile(), &drugs).await.unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].drug, "IBUPROFEN");

    let mut all: Vec<String> = report.results.iter().map(|r| r.drug.clone()).collect();
    all.extend(report.errors.iter().map(|e| e.drug.clone()));
    all.sort();
    assert_eq!(all, vec!["CLOPIDOGREL", "CODEINE", "IBUPROFEN"]);
}

#[test]
fn assessment_serializes_for_transport_layer() {
    let outcome = engine().assess("CODEINE", &pm_profile()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "assessed");
    assert_eq!(json["drug"], "CODEINE");
    assert_eq!(json["severity"], "high");
    assert_eq!(json["phenotype"], "PM");
    assert_eq!(json["guideline_source"], "CPIC");
    assert_eq!(json["detected_variants"][0]["genotype"], "A/G");
}

#[test]
fn not_found_outcome_serializes_available_drugs() {
    let outcome = engine().assess("aspirin", &pm_profile()).unwrap();
    assert!(outcome.is_not_found());
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "drug_not_found");
    assert_eq!(
        json["available_drugs"],
        serde_json::json!(["CLOPIDOGREL", "CODEINE", "TRAMADOL"])
    );
}

#[test]
fn pathway_narration_reflects_assessment_facts() {
    let outcome = engine().assess("CODEINE", &pm_profile()).unwrap();
    let steps = narrate(outcome.assessment().unwrap());
    assert_eq!(steps.len(), 5);
    assert!(steps[1].detail.contains("*4/*4"));
    assert_eq!(steps[3].emphasis, Severity::High);
}
