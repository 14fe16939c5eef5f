//! Visualization-ready pathway narration.
//!
//! Derives an ordered step sequence from a completed assessment for the presentation
//! layer. Copies facts only; no decision logic.

use crate::assess::RiskAssessment;
use pgxguard_common::profile::Severity;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PathwayStep {
    pub step: usize,
    pub title: String,
    pub detail: String,
    /// Visual emphasis; mirrors the assessment severity on the risk-bearing steps.
    pub emphasis: Severity,
}

/// Build the drug → gene → metabolism → risk → recommendation step sequence.
pub fn narrate(assessment: &RiskAssessment) -> Vec<PathwayStep> {
    vec![
        PathwayStep {
            step: 1,
            title: "Drug intake".to_string(),
            detail: format!("{} enters systemic circulation", assessment.drug),
            emphasis: Severity::None,
        },
        PathwayStep {
            step: 2,
            title: "Gene".to_string(),
            detail: format!(
                "{} diplotype {}",
                assessment.primary_gene, assessment.diplotype
            ),
            emphasis: Severity::None,
        },
        PathwayStep {
            step: 3,
            title: "Metabolism".to_string(),
            detail: format!(
                "{} metabolizer, activity score {}",
                assessment.phenotype, assessment.activity_score
            ),
            emphasis: Severity::None,
        },
        PathwayStep {
            step: 4,
            title: "Risk".to_string(),
            detail: assessment.risk_label.clone(),
            emphasis: assessment.severity,
        },
        PathwayStep {
            step: 5,
            title: "Recommendation".to_string(),
            detail: assessment.recommendation.clone(),
            emphasis: assessment.severity,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgxguard_common::profile::Phenotype;

    fn assessment() -> RiskAssessment {
        RiskAssessment {
            drug: "CODEINE".to_string(),
            primary_gene: "CYP2D6".to_string(),
            diplotype: "*4/*4".to_string(),
            phenotype: Phenotype::Pm,
            activity_score: 0.0,
            detected_variants: Vec::new(),
            risk_label: "Ineffective".to_string(),
            severity: Severity::High,
            confidence: 0.82,
            recommendation: "Avoid codeine.".to_string(),
            guideline_source: "CPIC".to_string(),
        }
    }

    #[test]
    fn test_steps_ordered_and_fact_preserving() {
        let steps = narrate(&assessment());
        assert_eq!(steps.len(), 5);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.step, i + 1);
        }
        assert!(steps[1].detail.contains("CYP2D6"));
        assert!(steps[2].detail.contains("PM"));
        assert_eq!(steps[3].detail, "Ineffective");
        assert_eq!(steps[4].detail, "Avoid codeine.");
        assert_eq!(steps[3].emphasis, Severity::High);
        assert_eq!(steps[0].emphasis, Severity::None);
    }
}
